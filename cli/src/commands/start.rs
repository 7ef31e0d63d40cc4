//! `scw-gpu start`: provision an instance and tunnel to its notebook.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::provision::{self, ProvisionReport, ProvisionSettings};
use crate::application::services::tunnel;
use crate::infra::config::ConfigFile;
use crate::output::OutputContext;

/// Run `scw-gpu start`.
///
/// # Errors
///
/// Returns an error if an instance is already recorded, provisioning fails,
/// or the tunnel cannot be opened.
pub async fn run(app: &AppContext) -> Result<()> {
    let config = &app.config;
    let script = ConfigFile::bootstrap_script(config)?;
    let reporter = app.reporter();

    let settings = ProvisionSettings {
        spec: config.instance_spec(),
        policy: config.retry_policy(),
        bootstrap_script: &script,
        notebook_port: config.notebook_port,
        dirs: app.workspace_dirs(),
    };
    let report = provision::provision(&app.lifecycle(&reporter), &settings).await?;

    print_summary(&app.output, &report);

    app.output
        .info(&format!("Starting SSH tunnel to {}...", report.address));
    app.output
        .info("Press Ctrl+C to disconnect, then run 'scw-gpu stop' to terminate the instance.");
    tunnel::hold_tunnel(&app.remote, &reporter, &report.address, config.notebook_port).await?;
    app.output
        .info("The instance is still running. Run 'scw-gpu stop' to delete it.");
    Ok(())
}

fn print_summary(ctx: &OutputContext, report: &ProvisionReport) {
    ctx.header("SETUP COMPLETE");
    ctx.kv("Instance ID:", &report.id);
    ctx.kv("Instance IP:", &report.address);
    ctx.link("Open in browser:", &report.endpoint);
    if report.token.is_empty() {
        ctx.warn("No access token found in the setup output.");
    }
    if !ctx.quiet {
        println!();
    }
}
