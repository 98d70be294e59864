//! Program-file parser and chip-mapping layer.
//!
//! Parses the whitespace-separated `simcontroller`/`neuron`/`synapse`
//! textual format and applies it to a [`chipsim_core::Chip`], resolving
//! external neuron ids to core/compartment locations.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod parser;
pub mod programmer;

pub use error::{ProgramError, Result};
pub use parser::{NeuronRecord, Record, SimControllerRecord, SynapseRecord};
pub use programmer::{ChipProgrammer, NeuronLocation, ProgramOutcome};
