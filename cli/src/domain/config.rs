//! Configuration schema and validators.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::instance::InstanceSpec;
use crate::domain::retry::RetryPolicy;

/// Settings stored in `~/.scw-gpu/config.yaml`. Every field is optional in
/// the file and falls back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GpuConfig {
    /// Availability zone all provider calls are scoped to.
    pub zone: String,
    /// Commercial instance type.
    pub instance_type: String,
    /// Image label.
    pub image: String,
    /// Notebook port, used on both ends of the tunnel.
    pub notebook_port: u16,
    /// Python virtualenv created by the bootstrap script.
    pub venv_name: String,
    /// Local workspace directory mirrored to the instance.
    pub local_work_dir: PathBuf,
    /// Remote workspace directory.
    pub remote_work_dir: String,
    /// Login user on the instance.
    pub remote_user: String,
    /// Override for the lifecycle record location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
    /// Seconds between polling attempts.
    pub poll_interval_secs: u64,
    /// Replacement bootstrap script; the embedded one is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_script: Option<PathBuf>,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            zone: "fr-par-2".to_string(),
            instance_type: "H100-1-80G".to_string(),
            image: "ubuntu_noble_gpu_os_12".to_string(),
            notebook_port: 8888,
            venv_name: "gpu_venv".to_string(),
            local_work_dir: PathBuf::from("./work"),
            remote_work_dir: "/scratch/work".to_string(),
            remote_user: "root".to_string(),
            state_file: None,
            poll_interval_secs: 5,
            bootstrap_script: None,
        }
    }
}

impl GpuConfig {
    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for the first invalid field.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("zone", &self.zone),
            ("instance_type", &self.instance_type),
            ("image", &self.image),
            ("venv_name", &self.venv_name),
            ("remote_user", &self.remote_user),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(key, "must not be empty"));
            }
        }
        if self.notebook_port == 0 {
            return Err(invalid("notebook_port", "must be between 1 and 65535"));
        }
        if !self.remote_work_dir.starts_with('/') {
            return Err(invalid("remote_work_dir", "must be an absolute path"));
        }
        if self.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs", "must be at least 1"));
        }
        Ok(())
    }

    #[must_use]
    pub fn instance_spec(&self) -> InstanceSpec<'_> {
        InstanceSpec {
            instance_type: &self.instance_type,
            image: &self.image,
        }
    }

    /// Unbounded polling at the configured interval.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::unbounded(Duration::from_secs(self.poll_interval_secs))
    }
}

fn invalid(key: &'static str, reason: &str) -> anyhow::Error {
    ConfigError::InvalidValue {
        key,
        reason: reason.to_string(),
    }
    .into()
}
