//! Foreground tunnel to the notebook endpoint.

use anyhow::{Context, Result};

use crate::application::ports::{PortForwarder, ProgressReporter};

/// Forward the notebook port and block until the operator interrupts.
///
/// Nothing is reported while the channel is open, so no spinner redraws
/// over the ssh session. The caller prints the connection instructions.
/// The instance keeps running afterwards; tearing it down is a separate
/// command.
///
/// # Errors
///
/// Returns an error if the forwarding channel cannot be opened.
pub async fn hold_tunnel(
    forwarder: &impl PortForwarder,
    reporter: &impl ProgressReporter,
    address: &str,
    port: u16,
) -> Result<()> {
    forwarder
        .forward(address, port, port)
        .await
        .context("running SSH tunnel")?;
    reporter.success("Tunnel closed.");
    Ok(())
}
