//! `scw-gpu upload` / `scw-gpu download`: single-path transfers.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::workspace_sync;
use crate::commands::TransferArgs;

/// Run `scw-gpu upload <path>`.
///
/// # Errors
///
/// Returns an error if no instance is recorded, the path is invalid or
/// missing locally, or the copy fails.
pub async fn upload(app: &AppContext, args: &TransferArgs) -> Result<()> {
    let reporter = app.reporter();
    let report = workspace_sync::upload_path(
        &app.store,
        &app.remote,
        &reporter,
        app.workspace_dirs(),
        &args.path,
    )
    .await?;
    tracing::debug!(?report, "upload finished");
    Ok(())
}

/// Run `scw-gpu download <path>`.
///
/// # Errors
///
/// Returns an error if no instance is recorded, the path is invalid, or the
/// copy fails.
pub async fn download(app: &AppContext, args: &TransferArgs) -> Result<()> {
    let reporter = app.reporter();
    let report = workspace_sync::download_path(
        &app.store,
        &app.remote,
        &reporter,
        app.workspace_dirs(),
        &args.path,
    )
    .await?;
    tracing::debug!(?report, "download finished");
    Ok(())
}
