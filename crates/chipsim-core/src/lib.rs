//! Cycle-accurate LIF core and NoC router engine.
//!
//! Models a 2D mesh of packet-switched routers, each paired with a bank of
//! leaky-integrate-and-fire neuron compartments, driven by a two-phase
//! timestep/op-step scheduler with dimension-order routing.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod arbiter;
pub mod chip;
pub mod core_bank;
pub mod decoder;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod queue;
pub mod router;
pub mod scheduler;
pub mod spike;

pub use arbiter::{Arbiter, Crossbar};
pub use chip::Chip;
pub use core_bank::{AxonOutTarget, Core, SynapseState};
pub use decoder::Decoder;
pub use error::{CoreError, Result};
pub use ids::{AxonId, CoreId, Direction, NeuronIdx};
pub use numeric::{FixedBackend, FloatBackend, NumericBackend, NumericMode};
pub use queue::{Queue, QueueMode};
pub use router::Router;
pub use scheduler::SimController;
pub use spike::SpikeMessage;

/// Smallest permitted in-flight delay, in timesteps (§3 invariants).
pub const MIN_DELAY: u32 = 1;
/// Largest permitted in-flight delay, and the size of each core's input
/// ring buffer (§3, §4.4).
pub const MAX_DELAY: u32 = 64;
/// Maximum number of neuron compartments a single core may allocate.
pub const COMPARTMENTS_PER_CORE: usize = 1024;
/// Maximum number of distinct incoming axon keys a single core may
/// register synapses against.
pub const MAX_AXON_IN: usize = 4096;
/// Maximum number of distinct outgoing axon keys a single core may target.
pub const MAX_AXON_OUT: usize = 4096;
/// Maximum total synapse fan-in a single core may accumulate across all
/// incoming axons.
pub const MAX_FAN_IN_STATE: usize = 16384;

/// Engine crate version, surfaced by the CLI's `--version` and used by the
/// program loader to flag on-disk format drift.
pub const ENGINE_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueMode;

    #[test]
    fn a_one_by_one_mesh_simulates_without_error() {
        let chip = Chip::new(1, 1, 16, QueueMode::Fifo).unwrap();
        let mut sim = SimController::new(chip);
        sim.chip_mut()
            .core_mut(CoreId::new(0, 0))
            .add_neuron(0.5, 1.0, 100.0, 30.0, 0, 0.0, f32::INFINITY)
            .unwrap();
        sim.chip_mut().core_mut(CoreId::new(0, 0)).prepare_computation();
        sim.run(10).unwrap();
        assert_eq!(sim.timestep(), 10);
    }
}
