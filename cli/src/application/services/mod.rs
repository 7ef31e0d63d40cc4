//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application`; never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod polling;
pub mod provision;
pub mod steps;
pub mod teardown;
pub mod tunnel;
pub mod workspace_sync;

use crate::application::ports::{InstanceProvider, ProgressReporter, RemoteExecutor, StateBackend};
use crate::application::store::LifecycleStore;

/// The ports a lifecycle use-case runs against.
pub struct Lifecycle<'a, P, X, B, R>
where
    P: InstanceProvider,
    X: RemoteExecutor,
    B: StateBackend,
    R: ProgressReporter,
{
    pub provider: &'a P,
    pub remote: &'a X,
    pub store: &'a LifecycleStore<B>,
    pub reporter: &'a R,
}
