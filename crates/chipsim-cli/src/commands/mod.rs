//! CLI command implementations for chipsim

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::SimConfig;
use crate::error::CliResult;

pub mod check;
pub mod inspect;
pub mod run;

/// chipsim - cycle-level simulator of a tiled neuromorphic chip
#[derive(Parser, Debug)]
#[command(
    name = "chipsim",
    version,
    about = "Cycle-level simulator of a tiled neuromorphic chip",
    long_about = "chipsim simulates a 2D mesh of LIF-neuron compute cores connected by a \
                  packet-switched network-on-chip, driven by a deterministic two-phase \
                  timestep/op-step scheduler."
)]
pub struct ChipSimCli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Configuration file path (defaults to `<workspace>/chipsim.toml`)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a program file to completion
    Run(run::RunCommand),

    /// Validate a program file without simulating
    Check(check::CheckCommand),

    /// Inspect workspace and configuration
    Inspect(inspect::InspectCommand),
}

impl ChipSimCli {
    /// Execute the selected command, resolving the workspace directory and
    /// configuration precedence (CLI flag > `chipsim.toml` > built-in
    /// defaults, §10d).
    pub async fn execute(self) -> CliResult<()> {
        let workspace = self.workspace.unwrap_or(std::env::current_dir()?);
        let config_path = self.config.unwrap_or_else(|| workspace.join("chipsim.toml"));
        let config = SimConfig::load_from_file(&config_path)?;

        match self.command {
            Commands::Run(cmd) => cmd.execute(workspace, config).await,
            Commands::Check(cmd) => cmd.execute(workspace, config).await,
            Commands::Inspect(cmd) => cmd.execute(workspace, config).await,
        }
    }
}
