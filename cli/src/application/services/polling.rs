//! Fixed-interval polling driven by a `RetryPolicy`.

use std::future::Future;

use anyhow::Result;

use crate::domain::{LifecycleError, Probe, RetryPolicy};

/// Call `probe` until it reports `Ready`, sleeping `policy.interval` between
/// attempts.
///
/// `NotReady` (including transport failures the probe folded into it) only
/// extends the wait. The loop ends early on `Terminal`, on cancellation, or
/// when `policy.max_attempts` is reached.
///
/// # Errors
///
/// Returns the probe's terminal error, `LifecycleError::Cancelled`, or
/// `LifecycleError::PollExhausted`.
pub async fn poll_until<T, F, Fut>(policy: &RetryPolicy, what: &str, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Probe<T>>,
{
    let mut attempts: u32 = 0;
    loop {
        if policy.is_cancelled() {
            return Err(LifecycleError::Cancelled(what.to_string()).into());
        }
        attempts = attempts.saturating_add(1);
        match probe().await {
            Probe::Ready(value) => {
                tracing::debug!(what, attempts, "ready");
                return Ok(value);
            }
            Probe::Terminal(err) => return Err(err),
            Probe::NotReady(reason) => {
                tracing::debug!(what, attempts, %reason, "not ready");
            }
        }
        if !policy.allows(attempts) {
            return Err(LifecycleError::PollExhausted {
                what: what.to_string(),
                attempts,
            }
            .into());
        }
        tokio::time::sleep(policy.interval).await;
    }
}
