//! scw-gpu - Jupyter on a disposable Scaleway GPU instance

use clap::Parser;

use scw_gpu::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
