//! Single-slot repository for the lifecycle record.
//!
//! `LifecycleStore` is the only component that reads or writes the record.
//! Storage is delegated to an injected `StateBackend` so tests can use an
//! in-memory slot instead of the real state file.

use anyhow::{Context, Result};

use crate::application::ports::StateBackend;
use crate::domain::LifecycleRecord;

pub struct LifecycleStore<B: StateBackend> {
    backend: B,
}

impl<B: StateBackend> LifecycleStore<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Access the storage backend (used in tests to inspect the slot).
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Load the current record, `None` when no instance is owned.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be read or holds a corrupt record.
    pub fn load(&self) -> Result<Option<LifecycleRecord>> {
        let Some(text) = self.backend.read().context("reading lifecycle state")? else {
            return Ok(None);
        };
        LifecycleRecord::parse(&text).map(Some)
    }

    /// Persist `record`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn save(&self, record: &LifecycleRecord) -> Result<()> {
        tracing::debug!(id = %record.id, ip = ?record.ip, "saving lifecycle record");
        self.backend
            .write(&record.to_json()?)
            .context("writing lifecycle state")
    }

    /// Remove the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        tracing::debug!("clearing lifecycle record");
        self.backend.remove().context("clearing lifecycle state")
    }
}
