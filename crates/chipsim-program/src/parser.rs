//! Positional whitespace-separated record parsing (§6)

use crate::error::{ProgramError, Result};

/// A `simcontroller` record: the scheduler's timestep horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimControllerRecord {
    /// Number of timesteps the simulation should run.
    pub tmax: u64,
}

/// A `neuron` record, as found verbatim in the program file, before being
/// mapped onto a core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeuronRecord {
    /// External neuron id, referenced by later `synapse` records.
    pub nrn_id: i64,
    /// Host core's column.
    pub x: i32,
    /// Host core's row.
    pub y: i32,
    /// Current decay factor.
    pub decay_u: f32,
    /// Voltage decay factor.
    pub decay_v: f32,
    /// Firing threshold.
    pub vth: f32,
    /// Constant bias current.
    pub bias: f32,
    /// Timestep at which the bias turns on.
    pub bias_delay: u32,
    /// Minimum voltage clamp.
    pub vmin: f32,
}

/// A `synapse` record connecting two previously declared neurons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynapseRecord {
    /// Source external neuron id.
    pub src_nrn_id: i64,
    /// Destination external neuron id.
    pub dst_nrn_id: i64,
    /// Synaptic weight.
    pub weight: f32,
    /// Pre-injection delay in timesteps.
    pub delay_pre: u32,
    /// Post-injection delay in timesteps.
    pub delay_post: u32,
}

/// One parsed, tagged program-file record; untagged/unrecognized lines are
/// dropped during parsing (`Record::Comment` is never constructed, but
/// documents that silence is the parser's blank/comment handling).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Record {
    /// A `simcontroller` line.
    SimController(SimControllerRecord),
    /// A `neuron` line.
    Neuron(NeuronRecord),
    /// A `synapse` line.
    Synapse(SynapseRecord),
}

fn field<'a>(fields: &[&'a str], idx: usize, line: usize, tag: &'static str, expected: usize) -> Result<&'a str> {
    fields.get(idx).copied().ok_or(ProgramError::MalformedRecord {
        line,
        tag,
        expected,
        found: fields.len(),
    })
}

fn parse_field<T: std::str::FromStr>(raw: &str, line: usize, field_index: usize, expected_type: &'static str) -> Result<T> {
    raw.parse().map_err(|_| ProgramError::InvalidField {
        line,
        field_index,
        field: raw.to_string(),
        expected_type,
    })
}

/// Parse the full text of a program file into its records, preserving
/// order and 1-based source line numbers via `(line, Record)` pairs for
/// lines that are not comments/blank.
pub fn parse_program(text: &str) -> Result<Vec<(usize, Record)>> {
    let mut records = Vec::new();
    let mut lines = text.lines().enumerate();

    let Some((_, first)) = lines.next() else {
        return Err(ProgramError::MissingSimController);
    };
    let first_fields: Vec<&str> = first.split_whitespace().collect();
    if first_fields.first().copied() != Some("simcontroller") {
        return Err(ProgramError::MissingSimController);
    }
    records.push((1, Record::SimController(parse_simcontroller(&first_fields, 1)?)));

    for (i, raw_line) in lines {
        let line = i + 1;
        let fields: Vec<&str> = raw_line.split_whitespace().collect();
        match fields.first().copied() {
            Some("neuron") => records.push((line, Record::Neuron(parse_neuron(&fields, line)?))),
            Some("synapse") => records.push((line, Record::Synapse(parse_synapse(&fields, line)?))),
            _ => {} // blank line, comment, or unrecognized tag: ignored per §6
        }
    }
    Ok(records)
}

fn parse_simcontroller(fields: &[&str], line: usize) -> Result<SimControllerRecord> {
    let tmax = parse_field(field(fields, 1, line, "simcontroller", 2)?, line, 1, "u64")?;
    Ok(SimControllerRecord { tmax })
}

fn parse_neuron(fields: &[&str], line: usize) -> Result<NeuronRecord> {
    const N: usize = 10;
    Ok(NeuronRecord {
        nrn_id: parse_field(field(fields, 1, line, "neuron", N)?, line, 1, "i64")?,
        x: parse_field(field(fields, 2, line, "neuron", N)?, line, 2, "i32")?,
        y: parse_field(field(fields, 3, line, "neuron", N)?, line, 3, "i32")?,
        decay_u: parse_field(field(fields, 4, line, "neuron", N)?, line, 4, "f32")?,
        decay_v: parse_field(field(fields, 5, line, "neuron", N)?, line, 5, "f32")?,
        vth: parse_field(field(fields, 6, line, "neuron", N)?, line, 6, "f32")?,
        bias: parse_field(field(fields, 7, line, "neuron", N)?, line, 7, "f32")?,
        bias_delay: parse_field(field(fields, 8, line, "neuron", N)?, line, 8, "u32")?,
        vmin: parse_field(field(fields, 9, line, "neuron", N)?, line, 9, "f32")?,
    })
}

fn parse_synapse(fields: &[&str], line: usize) -> Result<SynapseRecord> {
    const N: usize = 6;
    Ok(SynapseRecord {
        src_nrn_id: parse_field(field(fields, 1, line, "synapse", N)?, line, 1, "i64")?,
        dst_nrn_id: parse_field(field(fields, 2, line, "synapse", N)?, line, 2, "i64")?,
        weight: parse_field(field(fields, 3, line, "synapse", N)?, line, 3, "f32")?,
        delay_pre: parse_field(field(fields, 4, line, "synapse", N)?, line, 4, "u32")?,
        delay_post: parse_field(field(fields, 5, line, "synapse", N)?, line, 5, "u32")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_s1_style_program() {
        let text = "simcontroller 200\n\
                     neuron 0 0 0 0.5 1.0 100.0 30.0 0 0.0\n";
        let records = parse_program(text).unwrap();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0].1, Record::SimController(SimControllerRecord { tmax: 200 })));
        assert!(matches!(records[1].1, Record::Neuron(_)));
    }

    #[test]
    fn blank_and_unknown_lines_are_ignored() {
        let text = "simcontroller 10\n\n# a comment\nbogus 1 2 3\n";
        let records = parse_program(text).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn missing_simcontroller_errors() {
        let text = "neuron 0 0 0 0.5 1.0 100.0 30.0 0 0.0\n";
        assert!(matches!(parse_program(text), Err(ProgramError::MissingSimController)));
    }

    #[test]
    fn malformed_record_reports_field_count() {
        let text = "simcontroller 10\nneuron 0 0 0\n";
        let err = parse_program(text).unwrap_err();
        assert!(matches!(err, ProgramError::MalformedRecord { line: 2, .. }));
    }
}
