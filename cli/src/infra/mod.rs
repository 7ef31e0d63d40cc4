//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! provider CLI, the SSH transport, the state file, and the config file.
//!
//! Imports from `crate::domain` and `crate::application` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod scaleway;
pub mod ssh;
pub mod state;
