//! `chipsim run` — load a program file and simulate it to completion

use std::path::PathBuf;

use chipsim_core::{Chip, SimController};
use chipsim_program::ChipProgrammer;
use clap::Args;
use tracing::info;

use crate::config::SimConfig;
use crate::error::CliResult;

/// Run a program file to completion, writing voltage traces (and
/// optionally router utilization) to the output directory.
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Path to the program file (§6 textual format).
    pub program: PathBuf,

    /// Mesh width in cores.
    #[arg(long, default_value_t = 4)]
    pub width: i32,

    /// Mesh height in cores.
    #[arg(long, default_value_t = 4)]
    pub height: i32,

    /// Directory voltage traces are written to; overrides `chipsim.toml`.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Sample per-op-step router utilization; overrides `chipsim.toml`.
    #[arg(long)]
    pub sample_utilization: bool,
}

impl RunCommand {
    /// Execute the command against `workspace`, honoring `config` as the
    /// lowest-precedence source of defaults.
    pub async fn execute(self, workspace: PathBuf, config: SimConfig) -> CliResult<()> {
        let program_text = std::fs::read_to_string(&self.program)?;

        let mut chip = Chip::new(self.width, self.height, config.queue_capacity, config.queue_mode.into())?;
        let outcome = ChipProgrammer::new().program(&program_text, &mut chip)?;
        info!(tmax = outcome.tmax, neurons = outcome.nrn_id_to_location.len(), "program loaded");

        let mut sim = SimController::new(chip);
        sim.run(outcome.tmax)?;
        info!(timestep = sim.timestep(), cycle_count = sim.cycle_count(), "simulation complete");

        let output_dir = self
            .output_dir
            .unwrap_or_else(|| workspace.join(&config.output_dir));
        std::fs::create_dir_all(&output_dir)?;
        for coord in sim.chip().coords() {
            let trace = sim.chip().core(coord).voltage_trace();
            let path = output_dir.join(format!("core_{}_{}.csv", coord.x, coord.y));
            let body = trace.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("\n");
            std::fs::write(path, body)?;
        }

        if self.sample_utilization || config.sample_utilization {
            info!(samples = sim.utilization().len(), "utilization sampled");
        }

        Ok(())
    }
}
