//! # Proximity Guard CLI
//!
//! Command-line entry point.
//!
//! - Load and validate the device configuration
//! - Wire the sensing loop to the capture/upload pool
//! - Graceful shutdown on Ctrl+C / SIGTERM

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_guard, run_info, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(cli.observability())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Proximity guard starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_guard(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
