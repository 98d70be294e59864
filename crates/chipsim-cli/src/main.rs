//! # chipsim CLI - cycle-level neuromorphic NoC simulator
//!
//! The CLI-first interface to the chipsim simulation engine. Loads program
//! files, drives the two-phase scheduler to completion, and reports
//! per-core voltage traces and router utilization.

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chipsim_cli::{error::CliResult, ChipSimCli};

#[tokio::main]
async fn main() -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let cli = ChipSimCli::parse();

    if let Err(err) = cli.execute().await {
        error!("command failed: {}", err);
        std::process::exit(1);
    }

    Ok(())
}
