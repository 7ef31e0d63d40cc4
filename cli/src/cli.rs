//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Run a Jupyter notebook on a short-lived Scaleway GPU instance
#[derive(Parser)]
#[command(
    name = "scw-gpu",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ~/.scw-gpu/config.yaml)
    #[arg(long, global = true, env = "SCW_GPU_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create instance, upload ./work, install deps, start Jupyter, open tunnel
    Start,

    /// Download the remote work directory, then stop and delete the instance
    Stop,

    /// Upload ./work/<path> to the remote work directory
    Upload(commands::TransferArgs),

    /// Download <path> from the remote work directory into ./work
    Download(commands::TransferArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be built or the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            quiet,
            no_color,
            verbose,
            config,
            command,
        } = self;
        crate::logging::init(verbose);

        let app = AppContext::new(&AppFlags {
            no_color,
            quiet,
            config: config.as_deref(),
        })?;

        match command {
            Command::Start => commands::start::run(&app).await,
            Command::Stop => commands::stop::run(&app).await,
            Command::Upload(args) => commands::transfer::upload(&app, &args).await,
            Command::Download(args) => commands::transfer::download(&app, &args).await,
        }
    }
}
