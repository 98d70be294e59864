//! Two-phase timestep/op-step driver: `SimController` (§4.6)

use crate::chip::Chip;
use crate::error::{CoreError, Result};
use crate::ids::CoreId;
use crate::numeric::{FloatBackend, NumericBackend};

/// Default op-step ceiling per timestep before `run` gives up and reports
/// [`CoreError::OpStepCeilingExceeded`] (§7).
pub const DEFAULT_OPSTEP_CEILING: u64 = 10_000;

/// Drives a [`Chip`] through repeated timesteps, each built from a tic_toc
/// loop of op-steps: every router `next_op_step`, then alternating
/// core/router `operate()` calls until every core and router in the mesh
/// reports `ready()`, then a chip-wide `next_timestep`.
#[derive(Debug)]
pub struct SimController<B: NumericBackend = FloatBackend> {
    chip: Chip<B>,
    opstep_ceiling: u64,
    timestep: u64,
    opsteps_last_timestep: u64,
    total_opsteps: u64,
}

impl<B: NumericBackend> SimController<B> {
    /// Wrap `chip`, using the default op-step ceiling.
    pub fn new(chip: Chip<B>) -> Self {
        Self::with_ceiling(chip, DEFAULT_OPSTEP_CEILING)
    }

    /// Wrap `chip` with an explicit op-step ceiling.
    pub fn with_ceiling(chip: Chip<B>, opstep_ceiling: u64) -> Self {
        Self {
            chip,
            opstep_ceiling,
            timestep: 0,
            opsteps_last_timestep: 0,
            total_opsteps: 0,
        }
    }

    /// The wrapped chip.
    pub fn chip(&self) -> &Chip<B> {
        &self.chip
    }

    /// Mutable access to the wrapped chip, for programming before
    /// simulation starts.
    pub fn chip_mut(&mut self) -> &mut Chip<B> {
        &mut self.chip
    }

    /// Global timestep index (starts at 0, increments once per `step`).
    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    /// Number of op-steps the most recently completed timestep took to
    /// reach quiescence.
    pub fn opsteps_last_timestep(&self) -> u64 {
        self.opsteps_last_timestep
    }

    /// Total op-steps summed across every timestep run so far — the cycle
    /// count used in speedup comparisons between queue modes.
    pub fn cycle_count(&self) -> u64 {
        self.total_opsteps
    }

    /// `true` iff every core and every router in the mesh is `ready()`.
    fn mesh_ready(&self) -> bool {
        self.chip.coords().all(|c| self.chip.core(c).ready() && self.chip.router(c).ready())
    }

    /// Run one complete timestep: every op-step, every core runs `operate`;
    /// on alternating op-steps (`tic_toc`), the router fabric additionally
    /// runs `next_op_step` then `operate` — halving the router service rate
    /// relative to the core service rate, matching the reference
    /// implementation's cycle counts. Loops until the whole mesh reports
    /// `ready()`, then advances every core and router's `next_timestep`.
    ///
    /// # Errors
    /// Propagates any [`CoreError`] raised mid-op-step, or
    /// [`CoreError::OpStepCeilingExceeded`] if quiescence is not reached
    /// within the configured ceiling.
    pub fn step(&mut self) -> Result<()> {
        let coords: Vec<CoreId> = self.chip.coords().collect();
        let mut opsteps = 0u64;
        let mut tic_toc = true;

        while !self.mesh_ready() {
            if opsteps >= self.opstep_ceiling {
                return Err(CoreError::OpStepCeilingExceeded {
                    ceiling: self.opstep_ceiling,
                    timestep: self.timestep,
                });
            }
            for core in self.chip.cores_mut() {
                core.operate()?;
            }
            if tic_toc {
                for router in self.chip.routers_mut() {
                    router.next_op_step();
                }
                for router in self.chip.routers_mut() {
                    router.operate()?;
                }
            }
            tic_toc = !tic_toc;
            opsteps += 1;

            #[cfg(feature = "trace-opsteps")]
            log::trace!(
                "timestep {} op-step {} (router service: {})",
                self.timestep,
                opsteps,
                !tic_toc
            );
        }

        for &coord in &coords {
            self.chip.core_mut(coord).next_timestep()?;
            self.chip.router_mut(coord).next_timestep()?;
        }

        self.opsteps_last_timestep = opsteps;
        self.total_opsteps += opsteps;
        self.timestep += 1;
        Ok(())
    }

    /// Run `n` timesteps in sequence, stopping at the first error.
    pub fn run(&mut self, n: u64) -> Result<()> {
        for _ in 0..n {
            self.step()?;
        }
        Ok(())
    }

    /// Per-core utilization snapshot: queue occupancy fraction of every
    /// router's five ports, laid out as in [`crate::router::Router::util`].
    pub fn utilization(&self) -> Vec<(CoreId, [[f32; 3]; 3])> {
        self.chip.coords().map(|c| (c, self.chip.router(c).util())).collect()
    }
}
