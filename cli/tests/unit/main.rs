//! Unit tests for the scw-gpu CLI
//!
//! These tests use mocked ports and run fast without external I/O.

mod provision_service;
mod transfer_service;
