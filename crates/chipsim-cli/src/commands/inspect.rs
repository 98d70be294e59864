//! `chipsim inspect` — report workspace/config/program-file presence

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::config::SimConfig;
use crate::error::CliResult;

/// Report on the presence and summary statistics of the workspace's
/// `chipsim.toml` and program files, mirroring the framework CLI's own
/// `inspect` command structure.
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Program file to summarize, in addition to the workspace itself.
    pub program: Option<PathBuf>,
}

impl InspectCommand {
    /// Execute the command against `workspace`.
    pub async fn execute(self, workspace: PathBuf, config: SimConfig) -> CliResult<()> {
        info!(workspace = %workspace.display(), "inspecting workspace");

        let config_path = workspace.join("chipsim.toml");
        if config_path.exists() {
            info!("chipsim.toml found");
        } else {
            info!("no chipsim.toml found; using built-in defaults");
        }
        info!(
            queue_capacity = config.queue_capacity,
            queue_mode = ?config.queue_mode,
            numeric_mode = ?config.numeric_mode,
            "effective configuration"
        );

        if let Some(program) = self.program {
            let text = std::fs::read_to_string(&program)?;
            let neuron_lines = text.lines().filter(|l| l.trim_start().starts_with("neuron")).count();
            let synapse_lines = text.lines().filter(|l| l.trim_start().starts_with("synapse")).count();
            info!(
                program = %program.display(),
                neuron_lines,
                synapse_lines,
                "program file summary"
            );
        }

        Ok(())
    }
}
