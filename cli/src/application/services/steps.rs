//! Step outcomes: the one place that decides whether a lifecycle flow
//! continues after a step.

use anyhow::Result;

use crate::application::ports::ProgressReporter;

/// How a step's failure affects the surrounding flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Failure aborts the flow.
    Fatal,
    /// Failure is reported as a warning and the flow continues.
    BestEffort,
}

/// Result of running one lifecycle step.
#[derive(Debug)]
pub enum StepOutcome {
    Done,
    Warning(String),
    Fatal(anyhow::Error),
}

impl StepOutcome {
    /// Classify a step result according to its severity.
    #[must_use]
    pub fn classify(severity: Severity, label: &str, result: Result<()>) -> Self {
        match (result, severity) {
            (Ok(()), _) => Self::Done,
            (Err(err), Severity::Fatal) => Self::Fatal(err),
            (Err(err), Severity::BestEffort) => Self::Warning(format!("{label} failed: {err:#}")),
        }
    }

    /// Report warnings and turn fatal outcomes into errors.
    ///
    /// # Errors
    ///
    /// Returns the step's error when the outcome is `Fatal`.
    pub fn settle(self, reporter: &impl ProgressReporter) -> Result<()> {
        match self {
            Self::Done => Ok(()),
            Self::Warning(message) => {
                tracing::debug!(%message, "step degraded to warning");
                reporter.warn(&message);
                Ok(())
            }
            Self::Fatal(err) => Err(err),
        }
    }

    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }
}
