//! Tests for single-path upload and download.

#![allow(clippy::expect_used)]

use scw_gpu::application::services::workspace_sync::{WorkspaceDirs, download_path, upload_path};
use scw_gpu::application::store::LifecycleStore;
use scw_gpu::domain::{LifecycleError, LifecycleRecord};

use crate::mocks::{MemoryBackend, RecordingRemote, RecordingReporter, count, new_log};

fn running() -> LifecycleStore<MemoryBackend> {
    LifecycleStore::new(MemoryBackend::holding(
        &LifecycleRecord::created("i-1").with_address("10.0.0.5"),
    ))
}

fn lifecycle_error(err: &anyhow::Error) -> &LifecycleError {
    err.downcast_ref::<LifecycleError>().expect("lifecycle error")
}

#[tokio::test]
async fn upload_file_is_not_recursive() {
    let log = new_log();
    let remote = RecordingRemote::new(&log);
    let reporter = RecordingReporter::default();
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("data")).expect("mkdir");
    std::fs::write(dir.path().join("data/train.csv"), "a,b").expect("write");
    let dirs = WorkspaceDirs { local: dir.path(), remote: "/scratch/work" };

    let report = upload_path(&running(), &remote, &reporter, dirs, "data/train.csv")
        .await
        .expect("upload");

    assert!(!report.recursive);
    assert_eq!(report.remote, "/scratch/work/data/train.csv");
    assert_eq!(count(&log, "mkdir -p '/scratch/work/data'"), 1);
    let copies = remote.copies();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].local, dir.path().join("data").join("train.csv"));
    assert!(!copies[0].recursive);
}

#[tokio::test]
async fn upload_directory_is_recursive() {
    let log = new_log();
    let remote = RecordingRemote::new(&log);
    let reporter = RecordingReporter::default();
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("checkpoints")).expect("mkdir");
    let dirs = WorkspaceDirs { local: dir.path(), remote: "/scratch/work" };

    let report = upload_path(&running(), &remote, &reporter, dirs, "checkpoints")
        .await
        .expect("upload");

    assert!(report.recursive);
    assert_eq!(count(&log, "mkdir -p '/scratch/work'"), 1);
    assert!(remote.copies()[0].recursive);
}

#[tokio::test]
async fn upload_missing_local_path_fails_before_copy() {
    let log = new_log();
    let remote = RecordingRemote::new(&log);
    let reporter = RecordingReporter::default();
    let dir = tempfile::tempdir().expect("tempdir");
    let dirs = WorkspaceDirs { local: dir.path(), remote: "/scratch/work" };

    let err = upload_path(&running(), &remote, &reporter, dirs, "nope.txt")
        .await
        .expect_err("missing");

    assert!(matches!(lifecycle_error(&err), LifecycleError::LocalPathMissing(_)));
    assert!(remote.copies().is_empty());
}

#[tokio::test]
async fn upload_without_record_fails() {
    let log = new_log();
    let remote = RecordingRemote::new(&log);
    let reporter = RecordingReporter::default();
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LifecycleStore::new(MemoryBackend::default());
    let dirs = WorkspaceDirs { local: dir.path(), remote: "/scratch/work" };

    let err = upload_path(&store, &remote, &reporter, dirs, "x")
        .await
        .expect_err("no instance");

    assert!(matches!(lifecycle_error(&err), LifecycleError::NoInstance));
    assert!(remote.copies().is_empty());
}

#[tokio::test]
async fn upload_rejects_escaping_path() {
    let log = new_log();
    let remote = RecordingRemote::new(&log);
    let reporter = RecordingReporter::default();
    let dir = tempfile::tempdir().expect("tempdir");
    let dirs = WorkspaceDirs { local: dir.path(), remote: "/scratch/work" };

    let err = upload_path(&running(), &remote, &reporter, dirs, "../secrets")
        .await
        .expect_err("escaping path");

    assert!(matches!(lifecycle_error(&err), LifecycleError::InvalidPath(_)));
}

#[tokio::test]
async fn failed_copy_reports_stderr() {
    let log = new_log();
    let remote = RecordingRemote::new(&log).failing_copies();
    let reporter = RecordingReporter::default();
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("a.txt"), "x").expect("write");
    let dirs = WorkspaceDirs { local: dir.path(), remote: "/scratch/work" };

    let err = upload_path(&running(), &remote, &reporter, dirs, "a.txt")
        .await
        .expect_err("copy fails");

    assert!(matches!(
        lifecycle_error(&err),
        LifecycleError::TransferFailed { direction: "upload", stderr, .. } if stderr.contains("connection lost")
    ));
}

#[tokio::test]
async fn download_directory_is_recursive() {
    let log = new_log();
    let remote = RecordingRemote::new(&log).with_remote_dir("/scratch/work/outputs");
    let reporter = RecordingReporter::default();
    let dir = tempfile::tempdir().expect("tempdir");
    let dirs = WorkspaceDirs { local: dir.path(), remote: "/scratch/work" };

    let report = download_path(&running(), &remote, &reporter, dirs, "outputs")
        .await
        .expect("download");

    assert!(report.recursive);
    assert_eq!(report.local, dir.path().join("outputs"));
    assert_eq!(remote.copies()[0].remote, "/scratch/work/outputs");
}

#[tokio::test]
async fn download_file_creates_local_parent() {
    let log = new_log();
    let remote = RecordingRemote::new(&log);
    let reporter = RecordingReporter::default();
    let dir = tempfile::tempdir().expect("tempdir");
    let dirs = WorkspaceDirs { local: dir.path(), remote: "/scratch/work" };

    let report = download_path(&running(), &remote, &reporter, dirs, "results/model.pt")
        .await
        .expect("download");

    assert!(!report.recursive);
    assert!(dir.path().join("results").is_dir());
    assert_eq!(remote.copies()[0].local, dir.path().join("results").join("model.pt"));
}

#[tokio::test]
async fn download_requires_address() {
    let log = new_log();
    let remote = RecordingRemote::new(&log);
    let reporter = RecordingReporter::default();
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LifecycleStore::new(MemoryBackend::holding(&LifecycleRecord::created("i-1")));
    let dirs = WorkspaceDirs { local: dir.path(), remote: "/scratch/work" };

    let err = download_path(&store, &remote, &reporter, dirs, "a.txt")
        .await
        .expect_err("no address");

    assert!(matches!(lifecycle_error(&err), LifecycleError::NoAddress(id) if id == "i-1"));
}

#[tokio::test]
async fn download_fails_when_instance_is_unreachable() {
    let log = new_log();
    let remote = RecordingRemote::new(&log).unreachable();
    let reporter = RecordingReporter::default();
    let dir = tempfile::tempdir().expect("tempdir");
    let dirs = WorkspaceDirs { local: dir.path(), remote: "/scratch/work" };

    let err = download_path(&running(), &remote, &reporter, dirs, "outputs")
        .await
        .expect_err("unreachable");

    assert!(format!("{err:#}").contains("Connection timed out"), "{err:#}");
    assert!(remote.copies().is_empty());
}
