use std::io::{BufRead, BufReader, Read, Write};

use crate::{mig::GateId, Mig, Signal, TruthTable};

/// One persisted NPN class: the canonical representative, a minimum circuit
/// for it and, optionally, the measured synthesis time in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassRecord {
    pub representative: TruthTable,
    pub circuit: Mig,
    pub synthesis_time: Option<f64>,
}

/// Writes class records in the line-oriented text format:
///
/// ```text
/// CLASS 00010111
/// Gate 1: MAJ(x1, x2, x3)
/// Output: g1
/// TIME 0.004
/// ---
/// ```
pub fn write_records(mut f: impl Write, records: &[ClassRecord]) -> Result<(), String> {
    for record in records {
        write!(
            f,
            "CLASS {}\n{}",
            record.representative, record.circuit
        )
        .map_err(|e| e.to_string())?;
        if let Some(seconds) = record.synthesis_time {
            writeln!(f, "TIME {seconds}").map_err(|e| e.to_string())?;
        }
        writeln!(f, "---").map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Reads class records written by [`write_records`]. The parser accepts
/// exactly the shape the writer produces and reports the first malformed
/// line otherwise.
pub fn read_records(f: impl Read) -> Result<Vec<ClassRecord>, String> {
    let mut input = BufReader::new(f);
    let mut records = Vec::new();
    while let Some(line) = next_line(&mut input)? {
        if line.is_empty() {
            continue;
        }
        let representative = line
            .strip_prefix("CLASS ")
            .ok_or_else(|| format!("Expected a CLASS header, but got '{line}'."))
            .and_then(TruthTable::parse)?;
        records.push(parse_record_body(representative, &mut input)?);
    }
    Ok(records)
}

fn parse_record_body(
    representative: TruthTable,
    input: &mut impl BufRead,
) -> Result<ClassRecord, String> {
    let mut circuit = Mig::new(representative.n_vars());
    let mut handles: Vec<GateId> = Vec::new();
    let mut synthesis_time = None;
    let mut output_seen = false;
    loop {
        let line = next_line(input)?
            .ok_or_else(|| "Unexpected end of input inside a record.".to_string())?;
        if line == "---" {
            break;
        }
        if let Some(gate) = line.strip_prefix("Gate ") {
            let (id, fanins) = parse_gate(gate, circuit.n_vars(), &handles)?;
            if id != handles.len() + 1 {
                return Err(format!(
                    "Gate ids must count up from 1, but got {id} after {} gates.",
                    handles.len()
                ));
            }
            handles.push(circuit.add_gate(fanins));
        } else if let Some(literal) = line.strip_prefix("Output: ") {
            circuit.set_output(parse_signal(literal, circuit.n_vars(), &handles)?);
            output_seen = true;
        } else if let Some(seconds) = line.strip_prefix("TIME ") {
            synthesis_time = Some(
                seconds
                    .parse()
                    .map_err(|e| format!("Invalid TIME value '{seconds}': {e}"))?,
            );
        } else {
            return Err(format!("Unexpected line in record: '{line}'."));
        }
    }
    if !output_seen {
        return Err(format!(
            "Record for class {representative} has no Output line."
        ));
    }
    Ok(ClassRecord {
        representative,
        circuit,
        synthesis_time,
    })
}

/// Parses `<id>: MAJ(<lit>, <lit>, <lit>)`.
fn parse_gate(
    gate: &str,
    n_vars: usize,
    handles: &[GateId],
) -> Result<(usize, [Signal; 3]), String> {
    let (id, call) = gate
        .split_once(": ")
        .ok_or_else(|| format!("Malformed gate line: '{gate}'."))?;
    let id = id
        .parse()
        .map_err(|e| format!("Invalid gate id '{id}': {e}"))?;
    let arguments = call
        .strip_prefix("MAJ(")
        .and_then(|c| c.strip_suffix(')'))
        .ok_or_else(|| format!("Expected MAJ(...), but got '{call}'."))?;
    let fanins = arguments
        .split(", ")
        .map(|literal| parse_signal(literal, n_vars, handles))
        .collect::<Result<Vec<_>, _>>()?;
    let fanins: [Signal; 3] = fanins
        .try_into()
        .map_err(|fanins: Vec<_>| format!("Expected 3 fanins, but got {}.", fanins.len()))?;
    Ok((id, fanins))
}

/// Parses a literal: `x<i>` for inputs, `g<k>` for gates (both 1-based),
/// `0`/`1` for constants, optionally prefixed by `¬`.
fn parse_signal(literal: &str, n_vars: usize, handles: &[GateId]) -> Result<Signal, String> {
    let (negated, body) = match literal.strip_prefix('¬') {
        Some(body) => (true, body),
        None => (false, literal),
    };
    let signal = if body == "0" {
        false.into()
    } else if body == "1" {
        true.into()
    } else if let Some(index) = body.strip_prefix('x') {
        let index: usize = index
            .parse()
            .map_err(|e| format!("Invalid input literal '{literal}': {e}"))?;
        if index == 0 || index > n_vars {
            return Err(format!("Input index out of range in '{literal}'."));
        }
        Signal::input(index - 1)
    } else if let Some(index) = body.strip_prefix('g') {
        let index: usize = index
            .parse()
            .map_err(|e| format!("Invalid gate literal '{literal}': {e}"))?;
        (*handles
            .get(index.wrapping_sub(1))
            .ok_or_else(|| format!("Gate literal '{literal}' references a later gate."))?)
        .into()
    } else {
        return Err(format!("Unknown literal '{literal}'."));
    };
    Ok(if negated { !signal } else { signal })
}

fn next_line(input: &mut impl BufRead) -> Result<Option<String>, String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => Ok(None),
        Ok(_) => {
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Ok(Some(line))
        }
        Err(e) => Err(e.to_string()),
    }
}
