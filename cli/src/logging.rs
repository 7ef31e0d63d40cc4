//! Diagnostic logging via `tracing`.
//!
//! Operator-facing progress goes through `output`; this is for debugging
//! the provider and SSH calls. Logs go to stderr so they never mix with the
//! endpoint banner on stdout.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init(verbose: bool) {
    let fallback = if verbose { "scw_gpu=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
