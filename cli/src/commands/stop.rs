//! `scw-gpu stop`: retrieve the work directory and delete the instance.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::teardown::{self, TeardownOutcome};

/// Run `scw-gpu stop`.
///
/// # Errors
///
/// Returns an error only if the lifecycle record cannot be read or cleared.
pub async fn run(app: &AppContext) -> Result<()> {
    let ctx = &app.output;
    let reporter = app.reporter();

    let outcome = teardown::teardown(&app.lifecycle(&reporter), app.workspace_dirs()).await?;
    drop(reporter);

    match outcome {
        TeardownOutcome::NothingToDo => {
            ctx.info("No instance found. Nothing to stop.");
        }
        TeardownOutcome::Removed { record, warnings } => {
            ctx.success("Instance deleted. State cleared.");
            if warnings > 0 {
                ctx.warn(&format!(
                    "{warnings} cleanup step(s) failed; check the Scaleway console for leftovers of {}.",
                    record.id
                ));
            }
        }
    }
    Ok(())
}
