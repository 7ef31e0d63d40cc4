//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`; never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;

use crate::domain::{AddressBinding, InstanceSpec, PowerState};

// ── Provider Port ─────────────────────────────────────────────────────────────

/// Cloud control-plane operations for a single instance.
///
/// Placement (zone) is bound when the adapter is constructed, so every call
/// is scoped to the same zone. Non-success results are returned as errors
/// carrying the provider's captured error text.
#[allow(async_fn_in_trait)]
pub trait InstanceProvider {
    /// Create an instance and return its identifier.
    async fn create(&self, spec: &InstanceSpec<'_>) -> Result<String>;
    /// Current power state of the instance.
    async fn power_state(&self, id: &str) -> Result<PowerState>;
    /// All reserved addresses in the zone with their attached instance.
    async fn list_addresses(&self) -> Result<Vec<AddressBinding>>;
    /// Stop the instance and wait for the stop to complete.
    async fn stop(&self, id: &str) -> Result<()>;
    /// Delete the instance together with its local volumes and address.
    async fn delete(&self, id: &str) -> Result<()>;
}

// ── Remote Execution Port ─────────────────────────────────────────────────────

/// Command execution and file copy against the provisioned host.
///
/// `Err` means the transport could not be started at all; a remote failure
/// is an `Ok(Output)` with a non-zero status.
#[allow(async_fn_in_trait)]
pub trait RemoteExecutor {
    /// Run `command` through the remote shell and capture its output.
    async fn execute(&self, address: &str, command: &str) -> Result<Output>;
    /// Copy a local path to the remote host.
    async fn copy_to(
        &self,
        local: &Path,
        remote: &str,
        address: &str,
        recursive: bool,
    ) -> Result<Output>;
    /// Copy a remote path to the local host.
    async fn copy_from(
        &self,
        remote: &str,
        local: &Path,
        address: &str,
        recursive: bool,
    ) -> Result<Output>;
    /// Drop cached host-identity material for `address`.
    async fn forget_host(&self, address: &str) -> Result<()>;
}

/// Local-to-remote port forwarding.
#[allow(async_fn_in_trait)]
pub trait PortForwarder {
    /// Forward `local_port` to `remote_port` on `address` and block until the
    /// operator interrupts. The forwarding channel is closed before returning.
    async fn forward(&self, address: &str, local_port: u16, remote_port: u16) -> Result<()>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output, using the default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with inherited stdio until it exits or Ctrl-C arrives.
    ///
    /// Returns `None` when interrupted; the child is killed in that case.
    async fn run_until_interrupted(
        &self,
        program: &str,
        args: &[&str],
    ) -> Result<Option<ExitStatus>>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait; no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── State Port ────────────────────────────────────────────────────────────────

/// Raw storage slot behind `LifecycleStore`.
#[cfg_attr(test, mockall::automock)]
pub trait StateBackend {
    /// Stored text, or `None` when the slot is empty.
    fn read(&self) -> Result<Option<String>>;
    /// Replace the stored text.
    fn write(&self, contents: &str) -> Result<()>;
    /// Empty the slot. Removing an empty slot is not an error.
    fn remove(&self) -> Result<()>;
}
