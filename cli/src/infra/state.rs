//! Infrastructure implementation of the `StateBackend` port.
//!
//! `FileStateBackend` keeps the lifecycle record in a single JSON file and
//! writes it atomically (temp file + rename) to prevent state corruption.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::StateBackend;

/// Env var that points the state file somewhere else.
pub const STATE_ENV: &str = "SCW_GPU_STATE";

/// State file backend.
pub struct FileStateBackend {
    path: PathBuf,
}

impl FileStateBackend {
    /// Resolve the state file location: `SCW_GPU_STATE`, then the configured
    /// override, then `~/.scw_gpu_instance.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn resolve(configured: Option<&Path>) -> Result<Self> {
        if let Some(path) = std::env::var_os(STATE_ENV) {
            return Ok(Self::with_path(PathBuf::from(path)));
        }
        if let Some(path) = configured {
            return Ok(Self::with_path(path.to_path_buf()));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_path(home.join(".scw_gpu_instance.json")))
    }

    /// Create a backend with an explicit path (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateBackend for FileStateBackend {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&self.path)
            .map(Some)
            .with_context(|| format!("reading state file {}", self.path.display()))
    }

    fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, contents)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing state file {}", self.path.display()))
    }

    fn remove(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("removing state file {}", self.path.display()))?;
        }
        Ok(())
    }
}
