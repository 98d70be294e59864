//! Maps parsed program records onto a chip's cores and axons (§4.7)

use std::collections::HashMap;

use chipsim_core::{AxonOutTarget, Chip, CoreId, NumericBackend, SynapseState};

use crate::error::{ProgramError, Result};
use crate::parser::{parse_program, NeuronRecord, Record, SynapseRecord};

/// Where an external `nrn_id` landed once allocated: its host core and
/// in-core compartment index. The axon id used for routing is the external
/// `nrn_id` itself (mirroring the reference's `eff_axon_id = nrn_id`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeuronLocation {
    /// Host core coordinate.
    pub core: CoreId,
    /// In-core compartment index.
    pub compartment: chipsim_core::NeuronIdx,
}

/// Parses a program file and applies it to a chip, producing the external
/// neuron-id-to-location map and the scheduler horizon (`tmax`).
#[derive(Debug, Default)]
pub struct ChipProgrammer {
    nrn_id_to_location: HashMap<i64, NeuronLocation>,
}

/// Outcome of [`ChipProgrammer::program`].
#[derive(Debug)]
pub struct ProgramOutcome {
    /// Scheduler horizon read from the program's `simcontroller` line.
    pub tmax: u64,
    /// Map from external neuron id to where it was allocated.
    pub nrn_id_to_location: HashMap<i64, NeuronLocation>,
}

impl ChipProgrammer {
    /// Construct a fresh programmer with an empty neuron-id map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` and apply every `neuron`/`synapse` record onto `chip`,
    /// then call `prepare_computation()` on every core touched.
    ///
    /// # Errors
    /// Fails fast on the first malformed record, out-of-bounds core
    /// reference, forward-referencing synapse, or rejected engine
    /// operation, naming the offending 1-based line number.
    pub fn program<B: NumericBackend>(&mut self, text: &str, chip: &mut Chip<B>) -> Result<ProgramOutcome> {
        let records = parse_program(text)?;
        let mut tmax = 0u64;
        let mut touched: Vec<CoreId> = Vec::new();

        for (line, record) in records {
            match record {
                Record::SimController(sc) => tmax = sc.tmax,
                Record::Neuron(n) => {
                    let core = self.apply_neuron(chip, line, n)?;
                    if !touched.contains(&core) {
                        touched.push(core);
                    }
                }
                Record::Synapse(s) => self.apply_synapse(chip, line, s)?,
            }
        }

        for core in &touched {
            chip.core_mut(*core).prepare_computation();
        }

        Ok(ProgramOutcome {
            tmax,
            nrn_id_to_location: self.nrn_id_to_location.clone(),
        })
    }

    fn apply_neuron<B: NumericBackend>(&mut self, chip: &mut Chip<B>, line: usize, n: NeuronRecord) -> Result<CoreId> {
        let coord = CoreId::new(n.x, n.y);
        if n.x < 0 || n.x >= chip.width() || n.y < 0 || n.y >= chip.height() {
            return Err(ProgramError::CoreOutOfBounds {
                line,
                x: n.x,
                y: n.y,
                width: chip.width(),
                height: chip.height(),
            });
        }
        let compartment = chip
            .core_mut(coord)
            .add_neuron(n.decay_u, n.decay_v, n.vth, n.bias, n.bias_delay, n.vmin, f32::INFINITY)
            .map_err(|e| ProgramError::engine(line, e))?;
        self.nrn_id_to_location.insert(n.nrn_id, NeuronLocation { core: coord, compartment });
        Ok(coord)
    }

    fn apply_synapse<B: NumericBackend>(&mut self, chip: &mut Chip<B>, line: usize, s: SynapseRecord) -> Result<()> {
        let src = self.location_of(line, s.src_nrn_id)?;
        let dst = self.location_of(line, s.dst_nrn_id)?;

        chip.core_mut(src.core)
            .add_axon_out(
                src.compartment,
                AxonOutTarget {
                    dst_core: dst.core,
                    axon_ids: vec![s.src_nrn_id as u32],
                    delay_pre: s.delay_pre,
                },
            )
            .map_err(|e| ProgramError::engine(line, e))?;

        chip.core_mut(dst.core)
            .add_synapse_in(
                s.src_nrn_id as u32,
                SynapseState::new(dst.compartment, s.weight, s.delay_post),
            )
            .map_err(|e| ProgramError::engine(line, e))?;
        Ok(())
    }

    fn location_of(&self, line: usize, nrn_id: i64) -> Result<NeuronLocation> {
        self.nrn_id_to_location
            .get(&nrn_id)
            .copied()
            .ok_or(ProgramError::UnknownNeuron { line, nrn_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipsim_core::QueueMode;

    #[test]
    fn programs_a_two_neuron_two_core_link() {
        let mut chip = Chip::new(2, 1, 100, QueueMode::Fifo).unwrap();
        let mut programmer = ChipProgrammer::new();
        let text = "simcontroller 50\n\
                     neuron 0 0 0 1.0 1.0 1.0 100.0 0 0.0\n\
                     neuron 1 1 0 1.0 1.0 1.0 0.0 0 0.0\n\
                     synapse 0 1 2.5 1 1\n";
        let outcome = programmer.program(text, &mut chip).unwrap();
        assert_eq!(outcome.tmax, 50);
        assert_eq!(outcome.nrn_id_to_location.len(), 2);
        assert!(chip.core(CoreId::new(0, 0)).is_prepared());
        assert!(chip.core(CoreId::new(1, 0)).is_prepared());
    }

    #[test]
    fn forward_referencing_synapse_fails_fast() {
        let mut chip = Chip::new(1, 1, 100, QueueMode::Fifo).unwrap();
        let mut programmer = ChipProgrammer::new();
        let text = "simcontroller 10\nsynapse 0 1 1.0 1 1\n";
        let err = programmer.program(text, &mut chip).unwrap_err();
        assert!(matches!(err, ProgramError::UnknownNeuron { line: 2, nrn_id: 0 }));
    }

    #[test]
    fn out_of_bounds_core_fails_fast() {
        let mut chip = Chip::new(1, 1, 100, QueueMode::Fifo).unwrap();
        let mut programmer = ChipProgrammer::new();
        let text = "simcontroller 10\nneuron 0 5 5 1.0 1.0 1.0 0.0 0 0.0\n";
        let err = programmer.program(text, &mut chip).unwrap_err();
        assert!(matches!(err, ProgramError::CoreOutOfBounds { line: 2, .. }));
    }

    #[test]
    fn out_of_range_delay_post_fails_fast_at_load() {
        let mut chip = Chip::new(2, 1, 100, QueueMode::Fifo).unwrap();
        let mut programmer = ChipProgrammer::new();
        let text = "simcontroller 50\n\
                     neuron 0 0 0 1.0 1.0 1.0 100.0 0 0.0\n\
                     neuron 1 1 0 1.0 1.0 1.0 0.0 0 0.0\n\
                     synapse 0 1 2.5 1 0\n";
        let err = programmer.program(text, &mut chip).unwrap_err();
        assert!(matches!(
            err,
            ProgramError::Engine {
                line: 4,
                source: chipsim_core::CoreError::InvalidDelay { .. }
            }
        ));
    }
}
