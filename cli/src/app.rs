//! Application context: unified state passed to every command handler.
//!
//! Built once in `Cli::run()` from the loaded config and the global flags.

use std::path::Path;

use anyhow::Result;

use crate::application::services::Lifecycle;
use crate::application::services::workspace_sync::WorkspaceDirs;
use crate::application::store::LifecycleStore;
use crate::domain::GpuConfig;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::ConfigFile;
use crate::infra::scaleway::ScalewayProvider;
use crate::infra::ssh::SshRemote;
use crate::infra::state::FileStateBackend;
use crate::output::{OutputContext, TerminalReporter};

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags<'a> {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Explicit config file path.
    pub config: Option<&'a Path>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Effective configuration.
    pub config: GpuConfig,
    /// Scaleway control plane, scoped to the configured zone.
    pub provider: ScalewayProvider<TokioCommandRunner>,
    /// SSH transport to the instance.
    pub remote: SshRemote<TokioCommandRunner>,
    /// Lifecycle record storage.
    pub store: LifecycleStore<FileStateBackend>,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is invalid or the home directory
    /// cannot be determined.
    pub fn new(flags: &AppFlags<'_>) -> Result<Self> {
        let config = ConfigFile::resolve(flags.config)?.load()?;
        let backend = FileStateBackend::resolve(config.state_file.as_deref())?;
        tracing::debug!(state = %backend.path().display(), zone = %config.zone, "context ready");

        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            provider: ScalewayProvider::default_runner(&config.zone),
            remote: SshRemote::default_runner(&config.remote_user)?,
            store: LifecycleStore::new(backend),
            config,
        })
    }

    /// Progress reporter bound to this context's output.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Local and remote workspace directories.
    #[must_use]
    pub fn workspace_dirs(&self) -> WorkspaceDirs<'_> {
        WorkspaceDirs {
            local: &self.config.local_work_dir,
            remote: &self.config.remote_work_dir,
        }
    }

    /// The ports a lifecycle use-case needs, bundled with `reporter`.
    #[must_use]
    pub fn lifecycle<'a, R>(
        &'a self,
        reporter: &'a R,
    ) -> Lifecycle<'a, ScalewayProvider<TokioCommandRunner>, SshRemote<TokioCommandRunner>, FileStateBackend, R>
    where
        R: crate::application::ports::ProgressReporter,
    {
        Lifecycle {
            provider: &self.provider,
            remote: &self.remote,
            store: &self.store,
            reporter,
        }
    }
}
