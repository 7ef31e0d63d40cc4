//! Command implementations

pub mod start;
pub mod stop;
pub mod transfer;

use clap::Args;

/// Arguments shared by `upload` and `download`.
#[derive(Args)]
pub struct TransferArgs {
    /// Path relative to the work directory (file or directory)
    pub path: String,
}
