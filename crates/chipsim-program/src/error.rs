//! Program-file parsing and mapping errors

use thiserror::Error;

/// Result type for program loading.
pub type Result<T> = std::result::Result<T, ProgramError>;

/// Errors raised while parsing or applying a program file (§4.7, §6, §7).
///
/// All are programming errors: fail fast with the offending line number, no
/// partial program may be run.
#[derive(Error, Debug)]
pub enum ProgramError {
    /// The program file was empty, or its first record was not
    /// `simcontroller <tmax>`.
    #[error("line 1: expected `simcontroller <tmax>` as the first record")]
    MissingSimController,

    /// A record had fewer whitespace-separated fields than its tag
    /// requires.
    #[error("line {line}: `{tag}` expects {expected} fields, found {found}")]
    MalformedRecord {
        /// 1-based line number.
        line: usize,
        /// Record tag (`simcontroller`, `neuron`, or `synapse`).
        tag: &'static str,
        /// Expected field count, tag included.
        expected: usize,
        /// Actual field count found.
        found: usize,
    },

    /// A field could not be parsed as the expected integer or float type.
    #[error("line {line}: failed to parse field {field_index} ({field}) as {expected_type}")]
    InvalidField {
        /// 1-based line number.
        line: usize,
        /// 0-based field index within the record.
        field_index: usize,
        /// The raw field text.
        field: String,
        /// The Rust type name that parsing was attempted against.
        expected_type: &'static str,
    },

    /// A `neuron` line referenced a core coordinate outside the chip's
    /// configured dimensions.
    #[error("line {line}: core ({x}, {y}) is outside the chip's {width}x{height} mesh")]
    CoreOutOfBounds {
        /// 1-based line number.
        line: usize,
        /// Requested column.
        x: i32,
        /// Requested row.
        y: i32,
        /// Configured mesh width.
        width: i32,
        /// Configured mesh height.
        height: i32,
    },

    /// A `synapse` line referenced a `nrn_id` no prior `neuron` line
    /// declared (forward reference or typo).
    #[error("line {line}: synapse references undeclared neuron id {nrn_id}")]
    UnknownNeuron {
        /// 1-based line number.
        line: usize,
        /// The undeclared external neuron id.
        nrn_id: i64,
    },

    /// A neuron/axon/synapse operation the engine itself rejected (capacity
    /// exceeded, delay out of range).
    #[error("line {line}: {source}")]
    Engine {
        /// 1-based line number the failing operation came from.
        line: usize,
        /// Underlying engine error.
        source: chipsim_core::CoreError,
    },

    /// I/O error reading the program file.
    #[error("I/O error reading program file: {0}")]
    Io(#[from] std::io::Error),
}

impl ProgramError {
    /// Wrap an engine error with the program-file line it came from.
    pub fn engine(line: usize, source: chipsim_core::CoreError) -> Self {
        Self::Engine { line, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_neuron_reports_line_and_id() {
        let err = ProgramError::UnknownNeuron { line: 7, nrn_id: 42 };
        let msg = format!("{err}");
        assert!(msg.contains("line 7"));
        assert!(msg.contains("42"));
    }
}
