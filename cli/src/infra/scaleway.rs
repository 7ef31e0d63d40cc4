//! Scaleway implementation of the `InstanceProvider` port.
//!
//! `ScalewayProvider<R>` routes all `scw` CLI calls through a `CommandRunner`
//! and parses their JSON output with the pure parsers in `crate::domain`.

use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, InstanceProvider};
use crate::domain::instance::{parse_address_list, parse_created_id, parse_power_state};
use crate::domain::{AddressBinding, InstanceSpec, PowerState};
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner};

/// `server stop --wait` blocks until the instance is fully stopped.
const STOP_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Infrastructure adapter for the `scw` CLI, scoped to one zone.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct ScalewayProvider<R: CommandRunner> {
    runner: R,
    zone_arg: String,
}

impl<R: CommandRunner> ScalewayProvider<R> {
    pub fn new(runner: R, zone: &str) -> Self {
        Self {
            runner,
            zone_arg: format!("zone={zone}"),
        }
    }

    async fn scw(&self, what: &str, args: &[&str]) -> Result<Output> {
        let output = self
            .runner
            .run("scw", args)
            .await
            .with_context(|| format!("scw {what}"))?;
        ensure_success(what, &output)?;
        Ok(output)
    }
}

impl ScalewayProvider<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn default_runner(zone: &str) -> Self {
        Self::new(TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT), zone)
    }
}

impl<R: CommandRunner> InstanceProvider for ScalewayProvider<R> {
    async fn create(&self, spec: &InstanceSpec<'_>) -> Result<String> {
        let type_arg = format!("type={}", spec.instance_type);
        let image_arg = format!("image={}", spec.image);
        let output = self
            .scw(
                "instance server create",
                &[
                    "instance",
                    "server",
                    "create",
                    &type_arg,
                    &self.zone_arg,
                    &image_arg,
                    "-o",
                    "json",
                ],
            )
            .await?;
        parse_created_id(&output.stdout)
    }

    async fn power_state(&self, id: &str) -> Result<PowerState> {
        let output = self
            .scw(
                "instance server get",
                &["instance", "server", "get", id, &self.zone_arg, "-o", "json"],
            )
            .await?;
        parse_power_state(&output.stdout)
    }

    async fn list_addresses(&self) -> Result<Vec<AddressBinding>> {
        let output = self
            .scw(
                "instance ip list",
                &["instance", "ip", "list", &self.zone_arg, "-o", "json"],
            )
            .await?;
        parse_address_list(&output.stdout)
    }

    async fn stop(&self, id: &str) -> Result<()> {
        let output = self
            .runner
            .run_with_timeout(
                "scw",
                &["instance", "server", "stop", id, &self.zone_arg, "--wait"],
                STOP_TIMEOUT,
            )
            .await
            .context("scw instance server stop")?;
        ensure_success("instance server stop", &output)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.scw(
            "instance server delete",
            &[
                "instance",
                "server",
                "delete",
                id,
                &self.zone_arg,
                "with-ip=true",
                "with-volumes=local",
            ],
        )
        .await
        .map(drop)
    }
}

fn ensure_success(what: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("scw {what} failed: {}", stderr.trim())
}
