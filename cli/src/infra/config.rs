//! Configuration file loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::GpuConfig;

/// YAML config file at `~/.scw-gpu/config.yaml` or an explicit path.
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Use `explicit` when given, else the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is given and the home directory cannot be
    /// determined.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::with_path(path.to_path_buf()));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_path(home.join(".scw-gpu").join("config.yaml")))
    }

    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the config. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// validated.
    pub fn load(&self) -> Result<GpuConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(GpuConfig::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading config file {}", self.path.display()))?;
        let config: GpuConfig = if content.trim().is_empty() {
            GpuConfig::default()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("parsing config file {}", self.path.display()))?
        };
        config
            .validate()
            .with_context(|| format!("invalid config file {}", self.path.display()))?;
        Ok(config)
    }

    /// Bootstrap script text: the configured file, or the embedded default.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured script cannot be read.
    pub fn bootstrap_script(config: &GpuConfig) -> Result<String> {
        match &config.bootstrap_script {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("reading bootstrap script {}", path.display())),
            None => Ok(crate::domain::workspace::bootstrap_script(
                &config.venv_name,
                config.notebook_port,
            )),
        }
    }
}
