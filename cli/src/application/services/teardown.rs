//! Teardown flow: retrieve artifacts, destroy the instance, forget it.
//!
//! Every sub-step is best-effort. The lifecycle record is cleared after all
//! of them have been attempted, whatever their outcome, so the next `start`
//! is never blocked by a stale record.

use anyhow::Result;

use super::Lifecycle;
use super::steps::{Severity, StepOutcome};
use super::workspace_sync::{self, WorkspaceDirs};
use crate::application::ports::{InstanceProvider, ProgressReporter, RemoteExecutor, StateBackend};
use crate::domain::LifecycleRecord;

/// Teardown steps in execution order. The download must precede every
/// destructive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    DownloadWorkspace,
    ForgetHost,
    Stop,
    Delete,
}

impl TeardownStep {
    pub const SEQUENCE: [Self; 4] = [
        Self::DownloadWorkspace,
        Self::ForgetHost,
        Self::Stop,
        Self::Delete,
    ];

    #[must_use]
    pub fn severity(self) -> Severity {
        Severity::BestEffort
    }

    /// Steps that talk to the instance directly and need its address.
    #[must_use]
    pub fn needs_address(self) -> bool {
        matches!(self, Self::DownloadWorkspace | Self::ForgetHost)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::DownloadWorkspace => "Work directory download",
            Self::ForgetHost => "Host key cleanup",
            Self::Stop => "Stop",
            Self::Delete => "Delete",
        }
    }
}

/// Result of a teardown run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// No instance was recorded; nothing was touched.
    NothingToDo,
    /// The instance was torn down and the record cleared.
    Removed {
        record: LifecycleRecord,
        /// Number of sub-steps that failed and were reported as warnings.
        warnings: usize,
    },
}

/// Tear down the recorded instance.
///
/// # Errors
///
/// Returns an error only if the record cannot be read or cleared; sub-step
/// failures are reported as warnings.
pub async fn teardown<P, X, B, R>(
    ctx: &Lifecycle<'_, P, X, B, R>,
    dirs: WorkspaceDirs<'_>,
) -> Result<TeardownOutcome>
where
    P: InstanceProvider,
    X: RemoteExecutor,
    B: StateBackend,
    R: ProgressReporter,
{
    let Some(record) = ctx.store.load()? else {
        return Ok(TeardownOutcome::NothingToDo);
    };

    ctx.reporter.step(&format!(
        "Stopping and deleting instance {}...",
        record.id
    ));

    let mut warnings = 0;
    for step in TeardownStep::SEQUENCE {
        let address = record.ip.as_deref();
        if step.needs_address() && address.is_none() {
            tracing::debug!(?step, "skipped: no address recorded");
            continue;
        }
        tracing::debug!(?step, "teardown step");
        let result = run_step(ctx, step, &record.id, address, dirs).await;
        let outcome = StepOutcome::classify(step.severity(), step.label(), result);
        if outcome.is_warning() {
            warnings += 1;
        }
        outcome.settle(ctx.reporter)?;
    }

    ctx.store.clear()?;
    Ok(TeardownOutcome::Removed { record, warnings })
}

async fn run_step<P, X, B, R>(
    ctx: &Lifecycle<'_, P, X, B, R>,
    step: TeardownStep,
    id: &str,
    address: Option<&str>,
    dirs: WorkspaceDirs<'_>,
) -> Result<()>
where
    P: InstanceProvider,
    X: RemoteExecutor,
    B: StateBackend,
    R: ProgressReporter,
{
    let address = || {
        address.ok_or_else(|| anyhow::anyhow!("no address recorded for instance {id}"))
    };
    match step {
        TeardownStep::DownloadWorkspace => {
            workspace_sync::download_all(ctx.remote, ctx.reporter, address()?, dirs).await
        }
        TeardownStep::ForgetHost => ctx.remote.forget_host(address()?).await,
        TeardownStep::Stop => {
            ctx.reporter.step("Stopping instance...");
            ctx.provider.stop(id).await
        }
        TeardownStep::Delete => {
            ctx.reporter.step("Deleting instance...");
            ctx.provider.delete(id).await
        }
    }
}
