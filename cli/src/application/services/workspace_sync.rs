//! Workspace sync: bulk and single-path transfers between the local
//! workspace directory and its remote mirror.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::{Context, Result};

use crate::application::ports::{ProgressReporter, RemoteExecutor, StateBackend};
use crate::application::store::LifecycleStore;
use crate::domain::LifecycleError;
use crate::domain::workspace::{
    contents_of, local_join, remote_join, shell_quote, validate_relative_path,
};

/// Local workspace directory and its remote counterpart.
#[derive(Debug, Clone, Copy)]
pub struct WorkspaceDirs<'a> {
    pub local: &'a Path,
    pub remote: &'a str,
}

/// What a single-path transfer moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub local: PathBuf,
    pub remote: String,
    pub recursive: bool,
}

// ── Bulk transfers ───────────────────────────────────────────────────────────

/// Upload the contents of the local workspace into the remote workspace.
///
/// A missing local workspace is a no-op.
///
/// # Errors
///
/// Returns an error if the remote directory cannot be created or the copy
/// fails.
pub async fn upload_all(
    remote: &impl RemoteExecutor,
    reporter: &impl ProgressReporter,
    address: &str,
    dirs: WorkspaceDirs<'_>,
) -> Result<()> {
    if !dirs.local.is_dir() {
        reporter.step(&format!(
            "Local work directory {} does not exist, skipping upload.",
            dirs.local.display()
        ));
        return Ok(());
    }

    reporter.step(&format!(
        "Uploading {} to {}...",
        dirs.local.display(),
        dirs.remote
    ));
    ensure_remote_dir(remote, address, dirs.remote).await?;

    let output = remote
        .copy_to(&dirs.local.join("."), dirs.remote, address, true)
        .await
        .context("uploading work directory")?;
    check_transfer("upload", &dirs.local.display().to_string(), &output)?;
    reporter.success("Work directory uploaded.");
    Ok(())
}

/// Download the contents of the remote workspace into the local workspace.
///
/// A missing remote workspace is a no-op.
///
/// # Errors
///
/// Returns an error if the local directory cannot be created, the instance
/// cannot be reached to check the remote workspace, or the copy fails.
pub async fn download_all(
    remote: &impl RemoteExecutor,
    reporter: &impl ProgressReporter,
    address: &str,
    dirs: WorkspaceDirs<'_>,
) -> Result<()> {
    std::fs::create_dir_all(dirs.local)
        .with_context(|| format!("creating {}", dirs.local.display()))?;

    reporter.step(&format!(
        "Downloading {} to {}...",
        dirs.remote,
        dirs.local.display()
    ));
    if !remote_is_dir(remote, address, dirs.remote)
        .await
        .context("checking remote work directory")?
    {
        reporter.step(&format!(
            "Remote work directory {} does not exist, skipping download.",
            dirs.remote
        ));
        return Ok(());
    }

    let output = remote
        .copy_from(&contents_of(dirs.remote), dirs.local, address, true)
        .await
        .context("downloading work directory")?;
    check_transfer("download", dirs.remote, &output)?;
    reporter.success("Work directory downloaded.");
    Ok(())
}

// ── Single-path transfers ────────────────────────────────────────────────────

/// Upload one file or directory from the local workspace.
///
/// # Errors
///
/// Returns an error if no instance is recorded, the path is invalid or
/// missing, or the copy exits non-zero.
pub async fn upload_path(
    store: &LifecycleStore<impl StateBackend>,
    remote: &impl RemoteExecutor,
    reporter: &impl ProgressReporter,
    dirs: WorkspaceDirs<'_>,
    path: &str,
) -> Result<TransferReport> {
    let address = reachable_address(store)?;
    let relative = validate_relative_path(path)?;
    let local = local_join(dirs.local, &relative);
    let remote_path = remote_join(dirs.remote, &relative);

    let meta = std::fs::metadata(&local)
        .map_err(|_| LifecycleError::LocalPathMissing(local.display().to_string()))?;
    let recursive = meta.is_dir();

    ensure_remote_dir(remote, &address, parent_of(&remote_path, dirs.remote)).await?;

    reporter.step(&format!(
        "Uploading {} to {remote_path}...",
        local.display()
    ));
    let output = remote
        .copy_to(&local, &remote_path, &address, recursive)
        .await
        .context("uploading")?;
    check_transfer("upload", &local.display().to_string(), &output)?;
    reporter.success("Upload complete.");

    Ok(TransferReport {
        local,
        remote: remote_path,
        recursive,
    })
}

/// Download one file or directory into the local workspace.
///
/// # Errors
///
/// Returns an error if no instance is recorded, the path is invalid, or the
/// copy exits non-zero.
pub async fn download_path(
    store: &LifecycleStore<impl StateBackend>,
    remote: &impl RemoteExecutor,
    reporter: &impl ProgressReporter,
    dirs: WorkspaceDirs<'_>,
    path: &str,
) -> Result<TransferReport> {
    let address = reachable_address(store)?;
    let relative = validate_relative_path(path)?;
    let local = local_join(dirs.local, &relative);
    let remote_path = remote_join(dirs.remote, &relative);

    if let Some(parent) = local.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let recursive = remote_is_dir(remote, &address, &remote_path)
        .await
        .context("inspecting remote path")?;

    reporter.step(&format!(
        "Downloading {remote_path} to {}...",
        local.display()
    ));
    let output = remote
        .copy_from(&remote_path, &local, &address, recursive)
        .await
        .context("downloading")?;
    check_transfer("download", &remote_path, &output)?;
    reporter.success("Download complete.");

    Ok(TransferReport {
        local,
        remote: remote_path,
        recursive,
    })
}

// ── Private helpers ──────────────────────────────────────────────────────────

fn reachable_address(store: &LifecycleStore<impl StateBackend>) -> Result<String> {
    let record = store.load()?.ok_or(LifecycleError::NoInstance)?;
    record
        .ip
        .ok_or_else(|| LifecycleError::NoAddress(record.id).into())
}

async fn ensure_remote_dir(remote: &impl RemoteExecutor, address: &str, dir: &str) -> Result<()> {
    let output = remote
        .execute(address, &format!("mkdir -p {}", shell_quote(dir)))
        .await
        .context("creating remote directory")?;
    anyhow::ensure!(
        output.status.success(),
        "failed to create remote directory {dir}: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );
    Ok(())
}

/// Whether `path` is a directory on the instance.
///
/// The remote shell answers with one of two words, so a failed SSH session
/// is an error rather than "not a directory".
async fn remote_is_dir(remote: &impl RemoteExecutor, address: &str, path: &str) -> Result<bool> {
    let output = remote
        .execute(
            address,
            &format!("test -d {} && echo dir || echo other", shell_quote(path)),
        )
        .await?;
    match String::from_utf8_lossy(&output.stdout).trim() {
        "dir" => Ok(true),
        "other" => Ok(false),
        _ => anyhow::bail!(
            "could not inspect {path} on {address}: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ),
    }
}

fn check_transfer(direction: &'static str, path: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(LifecycleError::TransferFailed {
        direction,
        path: path.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
    .into())
}

/// Directory that must exist before `target` can be written.
fn parent_of<'a>(target: &'a str, workspace: &'a str) -> &'a str {
    match target.rsplit_once('/') {
        Some((parent, _)) if parent.len() > workspace.trim_end_matches('/').len() => parent,
        _ => workspace,
    }
}
