//! Instance model and parsers for provider JSON output.
//!
//! The provider adapter hands raw `-o json` output to these functions; nothing
//! here performs I/O.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Launch parameters for creating a new instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceSpec<'a> {
    /// Commercial instance type, e.g. `"H100-1-80G"`.
    pub instance_type: &'a str,
    /// Image label, e.g. `"ubuntu_noble_gpu_os_12"`.
    pub image: &'a str,
}

/// Power state as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerState {
    Starting,
    Running,
    Stopping,
    Stopped,
    /// Held by the provider; will not become running without intervention.
    Locked,
    Unknown(String),
}

impl PowerState {
    /// Map a provider state label onto a `PowerState`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "running" => Self::Running,
            "starting" => Self::Starting,
            "stopping" => Self::Stopping,
            "stopped" | "stopped in place" => Self::Stopped,
            "locked" => Self::Locked,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether waiting longer can never produce `Running`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Locked)
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Locked => "locked",
            Self::Unknown(s) => s,
        }
    }
}

/// A reserved public address and the instance it is attached to, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBinding {
    pub address: String,
    pub server_id: Option<String>,
}

#[derive(Deserialize)]
struct ServerJson {
    #[serde(default)]
    id: String,
    #[serde(default)]
    state: String,
}

#[derive(Deserialize)]
struct IpJson {
    #[serde(default)]
    address: String,
    #[serde(default)]
    server: Option<ServerRefJson>,
}

#[derive(Deserialize)]
struct ServerRefJson {
    #[serde(default)]
    id: String,
}

/// Extract the new instance id from `server create -o json` output.
///
/// # Errors
///
/// Returns an error if the output is not JSON or carries no id.
pub fn parse_created_id(stdout: &[u8]) -> Result<String> {
    let server: ServerJson =
        serde_json::from_slice(stdout).context("parsing server create output")?;
    anyhow::ensure!(!server.id.is_empty(), "server create output has no id");
    Ok(server.id)
}

/// Extract the power state from `server get -o json` output.
///
/// # Errors
///
/// Returns an error if the output is not JSON.
pub fn parse_power_state(stdout: &[u8]) -> Result<PowerState> {
    let server: ServerJson = serde_json::from_slice(stdout).context("parsing server get output")?;
    Ok(PowerState::from_label(&server.state))
}

/// Parse `ip list -o json` output into address bindings.
///
/// # Errors
///
/// Returns an error if the output is not a JSON array.
pub fn parse_address_list(stdout: &[u8]) -> Result<Vec<AddressBinding>> {
    let ips: Vec<IpJson> = serde_json::from_slice(stdout).context("parsing ip list output")?;
    Ok(ips
        .into_iter()
        .filter(|ip| !ip.address.is_empty())
        .map(|ip| AddressBinding {
            address: ip.address,
            server_id: ip.server.map(|s| s.id).filter(|id| !id.is_empty()),
        })
        .collect())
}

/// First address bound to `instance_id`.
#[must_use]
pub fn address_for<'a>(bindings: &'a [AddressBinding], instance_id: &str) -> Option<&'a str> {
    bindings
        .iter()
        .find(|b| b.server_id.as_deref() == Some(instance_id))
        .map(|b| b.address.as_str())
}
