//! Provisioning flow: create one instance and bring it to the point where
//! the notebook endpoint is reachable.
//!
//! The flow is a fixed list of `ProvisionStep`s. Each step's failure policy
//! lives in `ProvisionStep::severity`; the loop in `provision` is the only
//! place that acts on it.

use anyhow::{Context, Result};

use super::Lifecycle;
use super::polling::poll_until;
use super::steps::{Severity, StepOutcome};
use super::workspace_sync::{self, WorkspaceDirs};
use crate::application::ports::{InstanceProvider, ProgressReporter, RemoteExecutor, StateBackend};
use crate::domain::instance::address_for;
use crate::domain::{
    InstanceSpec, LifecycleError, LifecycleRecord, PowerState, Probe, RetryPolicy, endpoint_url,
    extract_access_token,
};

/// Fixed inputs of a provisioning run.
pub struct ProvisionSettings<'a> {
    pub spec: InstanceSpec<'a>,
    pub policy: RetryPolicy,
    pub bootstrap_script: &'a str,
    pub notebook_port: u16,
    pub dirs: WorkspaceDirs<'a>,
}

/// Provisioning steps in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    CheckIdle,
    Create,
    WaitRunning,
    WaitAddress,
    ForgetHost,
    WaitShell,
    UploadWorkspace,
    Bootstrap,
}

impl ProvisionStep {
    pub const SEQUENCE: [Self; 8] = [
        Self::CheckIdle,
        Self::Create,
        Self::WaitRunning,
        Self::WaitAddress,
        Self::ForgetHost,
        Self::WaitShell,
        Self::UploadWorkspace,
        Self::Bootstrap,
    ];

    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::ForgetHost | Self::UploadWorkspace => Severity::BestEffort,
            _ => Severity::Fatal,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::CheckIdle => "state check",
            Self::Create => "instance creation",
            Self::WaitRunning => "power-on wait",
            Self::WaitAddress => "address wait",
            Self::ForgetHost => "host key cleanup",
            Self::WaitShell => "SSH wait",
            Self::UploadWorkspace => "work directory upload",
            Self::Bootstrap => "instance setup",
        }
    }
}

/// A fully provisioned instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub id: String,
    pub address: String,
    /// Notebook access token; empty when none was found in the setup output.
    pub token: String,
    pub endpoint: String,
}

/// Create and bootstrap an instance.
///
/// Refuses to run while a lifecycle record exists. The record is written
/// right after creation and updated once the address is known, so a failed
/// run always leaves the identifier behind for cleanup.
///
/// # Errors
///
/// Returns `LifecycleError::AlreadyProvisioned` when an instance is already
/// recorded, or the error of the first fatal step.
pub async fn provision<P, X, B, R>(
    ctx: &Lifecycle<'_, P, X, B, R>,
    settings: &ProvisionSettings<'_>,
) -> Result<ProvisionReport>
where
    P: InstanceProvider,
    X: RemoteExecutor,
    B: StateBackend,
    R: ProgressReporter,
{
    let mut run = Provisioning {
        ctx,
        settings,
        id: None,
        address: None,
        setup_output: String::new(),
    };
    for step in ProvisionStep::SEQUENCE {
        tracing::debug!(?step, "provision step");
        let result = run.execute(step).await;
        StepOutcome::classify(step.severity(), step.label(), result).settle(ctx.reporter)?;
    }
    run.finish()
}

struct Provisioning<'c, 'a, P, X, B, R>
where
    P: InstanceProvider,
    X: RemoteExecutor,
    B: StateBackend,
    R: ProgressReporter,
{
    ctx: &'c Lifecycle<'a, P, X, B, R>,
    settings: &'c ProvisionSettings<'a>,
    id: Option<String>,
    address: Option<String>,
    setup_output: String,
}

impl<P, X, B, R> Provisioning<'_, '_, P, X, B, R>
where
    P: InstanceProvider,
    X: RemoteExecutor,
    B: StateBackend,
    R: ProgressReporter,
{
    async fn execute(&mut self, step: ProvisionStep) -> Result<()> {
        match step {
            ProvisionStep::CheckIdle => self.check_idle(),
            ProvisionStep::Create => self.create().await,
            ProvisionStep::WaitRunning => self.wait_running().await,
            ProvisionStep::WaitAddress => self.wait_address().await,
            ProvisionStep::ForgetHost => self.forget_host().await,
            ProvisionStep::WaitShell => self.wait_shell().await,
            ProvisionStep::UploadWorkspace => self.upload_workspace().await,
            ProvisionStep::Bootstrap => self.bootstrap().await,
        }
    }

    fn check_idle(&self) -> Result<()> {
        if let Some(existing) = self.ctx.store.load()? {
            return Err(LifecycleError::AlreadyProvisioned {
                address: existing.address_display().to_string(),
                id: existing.id,
            }
            .into());
        }
        Ok(())
    }

    async fn create(&mut self) -> Result<()> {
        let spec = &self.settings.spec;
        self.ctx
            .reporter
            .step(&format!("Creating {} instance...", spec.instance_type));
        let id = self
            .ctx
            .provider
            .create(spec)
            .await
            .map_err(|e| LifecycleError::CreateFailed(format!("{e:#}")))?;
        self.ctx
            .store
            .save(&LifecycleRecord::created(&id))
            .with_context(|| format!("instance {id} was created but could not be recorded"))?;
        self.ctx.reporter.success(&format!("Instance ID: {id}"));
        self.id = Some(id);
        Ok(())
    }

    async fn wait_running(&self) -> Result<()> {
        let id = self.id()?;
        let provider = self.ctx.provider;
        self.ctx.reporter.step("Waiting for instance to start...");
        poll_until(&self.settings.policy, "instance to start", move || async move {
            match provider.power_state(id).await {
                Ok(PowerState::Running) => Probe::Ready(()),
                Ok(state) if state.is_terminal() => Probe::Terminal(
                    LifecycleError::TerminalState {
                        id: id.to_string(),
                        state: state.label().to_string(),
                    }
                    .into(),
                ),
                Ok(state) => Probe::NotReady(state.label().to_string()),
                Err(e) => Probe::NotReady(format!("{e:#}")),
            }
        })
        .await?;
        self.ctx.reporter.success("Instance running.");
        Ok(())
    }

    async fn wait_address(&mut self) -> Result<()> {
        let id = self.id()?.to_string();
        let provider = self.ctx.provider;
        self.ctx.reporter.step("Waiting for IP assignment...");
        let address = poll_until(&self.settings.policy, "IP assignment", {
            let id = id.as_str();
            move || async move {
                match provider.list_addresses().await {
                    Ok(bindings) => address_for(&bindings, id).map_or_else(
                        || Probe::NotReady("no address bound".to_string()),
                        |a| Probe::Ready(a.to_string()),
                    ),
                    Err(e) => Probe::NotReady(format!("{e:#}")),
                }
            }
        })
        .await?;
        self.ctx
            .store
            .save(&LifecycleRecord::created(&id).with_address(&address))?;
        self.ctx.reporter.success(&format!("Instance IP: {address}"));
        self.address = Some(address);
        Ok(())
    }

    async fn forget_host(&self) -> Result<()> {
        self.ctx.remote.forget_host(self.address()?).await
    }

    async fn wait_shell(&self) -> Result<()> {
        let address = self.address()?;
        let remote = self.ctx.remote;
        self.ctx.reporter.step("Waiting for SSH...");
        poll_until(&self.settings.policy, "SSH", move || async move {
            match remote.execute(address, "echo ok").await {
                Ok(out) if out.status.success() => Probe::Ready(()),
                Ok(out) => Probe::NotReady(String::from_utf8_lossy(&out.stderr).trim().to_string()),
                Err(e) => Probe::NotReady(format!("{e:#}")),
            }
        })
        .await?;
        self.ctx.reporter.success("SSH ready.");
        Ok(())
    }

    async fn upload_workspace(&self) -> Result<()> {
        workspace_sync::upload_all(
            self.ctx.remote,
            self.ctx.reporter,
            self.address()?,
            self.settings.dirs,
        )
        .await
    }

    async fn bootstrap(&mut self) -> Result<()> {
        let address = self.address()?.to_string();
        self.ctx
            .reporter
            .step("Setting up instance (apt upgrade, venv, jupyter)...");
        let output = self
            .ctx
            .remote
            .execute(&address, self.settings.bootstrap_script)
            .await
            .context("running setup script")?;
        if !output.status.success() {
            return Err(LifecycleError::BootstrapFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )
            .into());
        }
        self.setup_output = String::from_utf8_lossy(&output.stdout).into_owned();
        self.ctx.reporter.success("Instance setup complete.");
        Ok(())
    }

    fn finish(self) -> Result<ProvisionReport> {
        let token = extract_access_token(&self.setup_output);
        let id = self.id()?.to_string();
        let address = self.address()?.to_string();
        Ok(ProvisionReport {
            endpoint: endpoint_url(self.settings.notebook_port, &token),
            id,
            address,
            token,
        })
    }

    fn id(&self) -> Result<&str> {
        self.id
            .as_deref()
            .context("no instance id; creation step did not run")
    }

    fn address(&self) -> Result<&str> {
        self.address
            .as_deref()
            .context("no instance address; address step did not run")
    }
}
