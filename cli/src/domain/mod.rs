//! Domain layer: pure types, parsing, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, or `std::process`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod instance;
pub mod record;
pub mod retry;
pub mod token;
pub mod workspace;

pub use config::GpuConfig;
pub use error::{ConfigError, LifecycleError};
pub use instance::{AddressBinding, InstanceSpec, PowerState};
pub use record::LifecycleRecord;
pub use retry::{CancelFlag, Probe, RetryPolicy};
pub use token::{endpoint_url, extract_access_token};
