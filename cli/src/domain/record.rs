//! The persisted lifecycle record.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::LifecycleError;

/// Proof that the operator owns a live or provisioning instance.
///
/// Serialized as `{"id": "...", "ip": "..."}`. The field names match the state
/// files written by earlier releases so they stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRecord {
    /// Provider-assigned instance identifier.
    pub id: String,
    /// Public address, absent until the provider assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl LifecycleRecord {
    /// Record for a freshly created instance with no address yet.
    #[must_use]
    pub fn created(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ip: None,
        }
    }

    /// Same record with the address filled in.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.ip = Some(address.into());
        self
    }

    /// Address for display, `-` when unknown.
    #[must_use]
    pub fn address_display(&self) -> &str {
        self.ip.as_deref().unwrap_or("-")
    }

    /// Parse and validate a serialized record.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a record or the id is empty.
    pub fn parse(text: &str) -> Result<Self> {
        let record: Self = serde_json::from_str(text)
            .map_err(|e| LifecycleError::InvalidRecord(e.to_string()))?;
        if record.id.trim().is_empty() {
            return Err(LifecycleError::InvalidRecord("empty instance id".to_string()).into());
        }
        Ok(record)
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
