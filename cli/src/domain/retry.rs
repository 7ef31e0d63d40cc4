//! Retry policy for the provisioning polling loops.
//!
//! The loop itself lives in `application::services::polling`; this module
//! only holds the policy value and the probe result type.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Default pause between polling attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Shared flag that stops a polling loop between attempts once raised.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a polling loop waits: fixed interval, optional attempt cap, optional
/// cancellation. The default waits forever at five-second intervals.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub cancel: Option<CancelFlag>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(DEFAULT_POLL_INTERVAL)
    }
}

impl RetryPolicy {
    /// Fixed interval, no attempt cap, no cancellation.
    #[must_use]
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Whether another attempt may start after `attempts` have been made.
    #[must_use]
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

/// Result of a single readiness probe.
#[derive(Debug)]
pub enum Probe<T> {
    Ready(T),
    /// Not ready yet. Transport errors land here too; the string says why.
    NotReady(String),
    /// Waiting longer cannot succeed.
    Terminal(anyhow::Error),
}
