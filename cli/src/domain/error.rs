//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Lifecycle errors ──────────────────────────────────────────────────────────

/// Errors raised by the instance lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Instance already exists: {id} ({address}). Run 'scw-gpu stop' first to terminate it.")]
    AlreadyProvisioned { id: String, address: String },

    #[error("No running instance found. Run 'scw-gpu start' first.")]
    NoInstance,

    #[error("Instance {0} has no known address yet. Wait for 'scw-gpu start' to finish.")]
    NoAddress(String),

    #[error("Failed to create instance: {0}")]
    CreateFailed(String),

    #[error("Setup failed: {0}\nThe instance is still running. Run 'scw-gpu stop' to terminate it.")]
    BootstrapFailed(String),

    #[error("{direction} failed for {path}: {stderr}")]
    TransferFailed {
        direction: &'static str,
        path: String,
        stderr: String,
    },

    #[error("{0} does not exist.")]
    LocalPathMissing(String),

    #[error("Invalid workspace path '{0}': must be relative and stay inside the workspace")]
    InvalidPath(String),

    #[error("Invalid state record: {0}")]
    InvalidRecord(String),

    #[error("Instance {id} entered state '{state}' and will not become ready.")]
    TerminalState { id: String, state: String },

    #[error("Gave up waiting for {what} after {attempts} attempts.")]
    PollExhausted { what: String, attempts: u32 },

    #[error("Cancelled while waiting for {0}.")]
    Cancelled(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
