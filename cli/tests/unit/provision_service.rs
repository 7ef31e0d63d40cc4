//! Tests for the provisioning flow.

#![allow(clippy::expect_used)]

use std::path::Path;

use scw_gpu::application::services::Lifecycle;
use scw_gpu::application::services::provision::{ProvisionSettings, provision};
use scw_gpu::application::services::workspace_sync::WorkspaceDirs;
use scw_gpu::application::store::LifecycleStore;
use scw_gpu::domain::{
    CancelFlag, InstanceSpec, LifecycleError, LifecycleRecord, PowerState, RetryPolicy,
};

use crate::mocks::{
    MemoryBackend, RecordingProvider, RecordingRemote, RecordingReporter, bound, count, err_output,
    events, fast_policy, new_log, ok_output,
};

const SPEC: InstanceSpec<'static> = InstanceSpec {
    instance_type: "H100-1-80G",
    image: "ubuntu_noble_gpu_os_12",
};

fn settings<'a>(local: &'a Path, policy: RetryPolicy) -> ProvisionSettings<'a> {
    ProvisionSettings {
        spec: SPEC,
        policy,
        bootstrap_script: "bootstrap",
        notebook_port: 8888,
        dirs: WorkspaceDirs {
            local,
            remote: "/scratch/work",
        },
    }
}

fn no_workspace() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}

#[tokio::test]
async fn existing_record_blocks_provisioning() {
    let log = new_log();
    let provider = RecordingProvider::new(&log);
    let remote = RecordingRemote::new(&log);
    let existing = LifecycleRecord::created("i-0").with_address("1.2.3.4");
    let store = LifecycleStore::new(MemoryBackend::holding(&existing));
    let reporter = RecordingReporter::default();
    let dir = no_workspace();
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    let err = provision(&ctx, &settings(&dir.path().join("work"), fast_policy()))
        .await
        .expect_err("must refuse");

    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::AlreadyProvisioned { id, address }) if id == "i-0" && address == "1.2.3.4"
    ));
    assert!(events(&log).is_empty(), "no provider or remote calls expected");
    assert_eq!(store.load().expect("load"), Some(existing));
}

#[tokio::test]
async fn waits_through_pending_power_states() {
    const PENDING: usize = 50;
    let log = new_log();
    let mut states = vec![Ok(PowerState::Starting); PENDING];
    states.push(Ok(PowerState::Running));
    let provider = RecordingProvider::new(&log).with_power(states);
    let remote = RecordingRemote::new(&log);
    let store = LifecycleStore::new(MemoryBackend::default());
    let reporter = RecordingReporter::default();
    let dir = no_workspace();
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    provision(&ctx, &settings(&dir.path().join("work"), fast_policy()))
        .await
        .expect("provision");

    assert_eq!(count(&log, "power_state i-1"), PENDING + 1);
}

#[tokio::test]
async fn transport_errors_while_polling_extend_the_wait() {
    let log = new_log();
    let provider = RecordingProvider::new(&log).with_power(vec![
        Err("scw: connection reset".to_string()),
        Ok(PowerState::Running),
    ]);
    let remote = RecordingRemote::new(&log);
    let store = LifecycleStore::new(MemoryBackend::default());
    let reporter = RecordingReporter::default();
    let dir = no_workspace();
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    provision(&ctx, &settings(&dir.path().join("work"), fast_policy()))
        .await
        .expect("provision");

    assert_eq!(count(&log, "power_state"), 2);
}

#[tokio::test]
async fn full_run_records_instance_and_bootstraps_once() {
    let log = new_log();
    let provider = RecordingProvider::new(&log)
        .with_power(vec![
            Ok(PowerState::Starting),
            Ok(PowerState::Starting),
            Ok(PowerState::Running),
        ])
        .with_addresses(vec![
            vec![],
            vec![bound("10.9.9.9", "i-other")],
            vec![bound("10.9.9.9", "i-other"), bound("10.0.0.5", "i-1")],
        ]);
    let remote = RecordingRemote::new(&log).with_shell(vec![false, false, true]);
    let store = LifecycleStore::new(MemoryBackend::default());
    let reporter = RecordingReporter::default();
    let dir = no_workspace();
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    let report = provision(&ctx, &settings(&dir.path().join("work"), fast_policy()))
        .await
        .expect("provision");

    assert_eq!(report.id, "i-1");
    assert_eq!(report.address, "10.0.0.5");
    assert_eq!(report.token, "abc123");
    assert_eq!(report.endpoint, "http://localhost:8888/?token=abc123");
    assert_eq!(
        store.load().expect("load"),
        Some(LifecycleRecord::created("i-1").with_address("10.0.0.5"))
    );
    assert_eq!(count(&log, "create"), 1);
    assert_eq!(count(&log, "power_state"), 3);
    assert_eq!(count(&log, "list_addresses"), 3);
    assert_eq!(count(&log, "probe 10.0.0.5"), 3);
    assert_eq!(count(&log, "forget_host 10.0.0.5"), 1);
    assert_eq!(count(&log, "bootstrap"), 1);
    assert!(reporter.warnings().is_empty(), "{:?}", reporter.warnings());
}

#[tokio::test]
async fn host_key_is_forgotten_before_first_shell_probe() {
    let log = new_log();
    let provider = RecordingProvider::new(&log);
    let remote = RecordingRemote::new(&log);
    let store = LifecycleStore::new(MemoryBackend::default());
    let reporter = RecordingReporter::default();
    let dir = no_workspace();
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    provision(&ctx, &settings(&dir.path().join("work"), fast_policy()))
        .await
        .expect("provision");

    let log = events(&log);
    let forget = log.iter().position(|e| e.starts_with("forget_host"));
    let probe = log.iter().position(|e| e.starts_with("probe"));
    assert!(forget.expect("forget_host") < probe.expect("probe"));
}

#[tokio::test]
async fn workspace_is_uploaded_before_bootstrap() {
    let log = new_log();
    let provider = RecordingProvider::new(&log);
    let remote = RecordingRemote::new(&log);
    let store = LifecycleStore::new(MemoryBackend::default());
    let reporter = RecordingReporter::default();
    let dir = tempfile::tempdir().expect("tempdir");
    let local = dir.path().join("work");
    std::fs::create_dir_all(&local).expect("mkdir");
    std::fs::write(local.join("train.py"), "print(1)").expect("write");
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    provision(&ctx, &settings(&local, fast_policy()))
        .await
        .expect("provision");

    let copies = remote.copies();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].local, local.join("."));
    assert_eq!(copies[0].remote, "/scratch/work");
    assert!(copies[0].recursive);

    let log = events(&log);
    let upload = log.iter().position(|e| e.starts_with("copy_to"));
    let bootstrap = log.iter().position(|e| e.starts_with("bootstrap"));
    assert!(upload.expect("upload") < bootstrap.expect("bootstrap"));
}

#[tokio::test]
async fn failed_upload_is_a_warning() {
    let log = new_log();
    let provider = RecordingProvider::new(&log);
    let remote = RecordingRemote::new(&log).failing_copies();
    let store = LifecycleStore::new(MemoryBackend::default());
    let reporter = RecordingReporter::default();
    let dir = tempfile::tempdir().expect("tempdir");
    let local = dir.path().join("work");
    std::fs::create_dir_all(&local).expect("mkdir");
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    let report = provision(&ctx, &settings(&local, fast_policy()))
        .await
        .expect("upload failure must not abort provisioning");

    assert_eq!(report.id, "i-1");
    let warnings = reporter.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("connection lost"), "{warnings:?}");
    assert_eq!(count(&log, "bootstrap"), 1);
}

#[tokio::test]
async fn bootstrap_failure_keeps_record() {
    let log = new_log();
    let provider = RecordingProvider::new(&log);
    let remote = RecordingRemote::new(&log).with_bootstrap(err_output(b"E: Unable to locate package"));
    let store = LifecycleStore::new(MemoryBackend::default());
    let reporter = RecordingReporter::default();
    let dir = no_workspace();
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    let err = provision(&ctx, &settings(&dir.path().join("work"), fast_policy()))
        .await
        .expect_err("bootstrap must fail");

    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::BootstrapFailed(stderr)) if stderr.contains("Unable to locate")
    ));
    assert_eq!(
        store.load().expect("load"),
        Some(LifecycleRecord::created("i-1").with_address("10.0.0.5"))
    );
}

#[tokio::test]
async fn missing_token_yields_bare_endpoint() {
    let log = new_log();
    let provider = RecordingProvider::new(&log);
    let remote = RecordingRemote::new(&log).with_bootstrap(ok_output(b"server started\n"));
    let store = LifecycleStore::new(MemoryBackend::default());
    let reporter = RecordingReporter::default();
    let dir = no_workspace();
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    let report = provision(&ctx, &settings(&dir.path().join("work"), fast_policy()))
        .await
        .expect("provision");

    assert_eq!(report.token, "");
    assert_eq!(report.endpoint, "http://localhost:8888");
}

#[tokio::test]
async fn create_failure_leaves_no_record() {
    let log = new_log();
    let provider = RecordingProvider::new(&log).failing_create("quota exceeded");
    let remote = RecordingRemote::new(&log);
    let store = LifecycleStore::new(MemoryBackend::default());
    let reporter = RecordingReporter::default();
    let dir = no_workspace();
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    let err = provision(&ctx, &settings(&dir.path().join("work"), fast_policy()))
        .await
        .expect_err("create must fail");

    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::CreateFailed(msg)) if msg.contains("quota exceeded")
    ));
    assert_eq!(store.load().expect("load"), None);
    assert_eq!(count(&log, "power_state"), 0);
}

#[tokio::test]
async fn locked_instance_stops_the_wait() {
    let log = new_log();
    let provider = RecordingProvider::new(&log).with_power(vec![
        Ok(PowerState::Starting),
        Ok(PowerState::Locked),
    ]);
    let remote = RecordingRemote::new(&log);
    let store = LifecycleStore::new(MemoryBackend::default());
    let reporter = RecordingReporter::default();
    let dir = no_workspace();
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    let err = provision(&ctx, &settings(&dir.path().join("work"), fast_policy()))
        .await
        .expect_err("locked is terminal");

    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::TerminalState { state, .. }) if state == "locked"
    ));
    assert_eq!(count(&log, "power_state"), 2);
    assert_eq!(store.load().expect("load"), Some(LifecycleRecord::created("i-1")));
}

#[tokio::test]
async fn cancelled_wait_keeps_created_record() {
    let log = new_log();
    let provider = RecordingProvider::new(&log).with_power(vec![Ok(PowerState::Starting)]);
    let remote = RecordingRemote::new(&log);
    let store = LifecycleStore::new(MemoryBackend::default());
    let reporter = RecordingReporter::default();
    let dir = no_workspace();
    let cancel = CancelFlag::new();
    cancel.cancel();
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    let err = provision(
        &ctx,
        &settings(&dir.path().join("work"), fast_policy().with_cancel(cancel)),
    )
    .await
    .expect_err("cancelled");

    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::Cancelled(_))
    ));
    assert_eq!(store.load().expect("load"), Some(LifecycleRecord::created("i-1")));
}

#[tokio::test]
async fn bounded_policy_gives_up_on_address() {
    let log = new_log();
    let provider = RecordingProvider::new(&log).with_addresses(vec![vec![]]);
    let remote = RecordingRemote::new(&log);
    let store = LifecycleStore::new(MemoryBackend::default());
    let reporter = RecordingReporter::default();
    let dir = no_workspace();
    let ctx = Lifecycle { provider: &provider, remote: &remote, store: &store, reporter: &reporter };

    let err = provision(
        &ctx,
        &settings(&dir.path().join("work"), fast_policy().with_max_attempts(4)),
    )
    .await
    .expect_err("exhausted");

    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::PollExhausted { attempts: 4, .. })
    ));
    assert_eq!(count(&log, "list_addresses"), 4);
}
