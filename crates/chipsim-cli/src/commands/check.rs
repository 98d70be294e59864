//! `chipsim check` — validate a program file without simulating

use std::path::PathBuf;

use chipsim_core::Chip;
use chipsim_program::ChipProgrammer;
use clap::Args;
use tracing::info;

use crate::config::SimConfig;
use crate::error::CliResult;

/// Parse and apply a program file against a freshly built mesh, surfacing
/// any §7 programming error without running the simulation.
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Path to the program file.
    pub program: PathBuf,

    /// Mesh width in cores.
    #[arg(long, default_value_t = 4)]
    pub width: i32,

    /// Mesh height in cores.
    #[arg(long, default_value_t = 4)]
    pub height: i32,
}

impl CheckCommand {
    /// Execute the command; returns `Ok(())` iff the program file is
    /// well-formed and resolves onto the given mesh dimensions.
    pub async fn execute(self, _workspace: PathBuf, config: SimConfig) -> CliResult<()> {
        let program_text = std::fs::read_to_string(&self.program)?;
        let mut chip = Chip::new(self.width, self.height, config.queue_capacity, config.queue_mode.into())?;
        let outcome = ChipProgrammer::new().program(&program_text, &mut chip)?;
        info!(
            tmax = outcome.tmax,
            neurons = outcome.nrn_id_to_location.len(),
            "program is well-formed"
        );
        Ok(())
    }
}
