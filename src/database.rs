use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

use itertools::Itertools;
use log::{info, warn};

use crate::file_formats::class_db::{read_records, write_records, ClassRecord};
use crate::npn::{classes, representative_with_transform};
use crate::synthesis::{Synthesis, Synthesizer};
use crate::{Mig, TruthTable};

/// The result of synthesizing one class representative in a batch run.
/// Unsuccessful outcomes are recorded per class, never aborting the batch.
#[derive(Clone, Debug)]
pub struct ClassOutcome {
    pub representative: TruthTable,
    pub outcome: Synthesis,
    pub elapsed: Duration,
}

/// Partitions all functions of the given arity into NPN classes and
/// synthesizes a minimum circuit for each representative, in ascending
/// order of representative value.
pub fn compute_classes(n_vars: usize, synthesizer: &Synthesizer) -> Vec<ClassOutcome> {
    let representatives = classes(TruthTable::all_functions(n_vars));
    info!(
        "Synthesizing {} NPN classes over {n_vars} variables.",
        representatives.len()
    );
    representatives
        .into_iter()
        .map(|representative| {
            let report = synthesizer.run(&representative);
            match &report.outcome {
                Synthesis::Realized(mig) => info!(
                    "Class {representative}: size {}, depth {}, {:?}.",
                    mig.size(),
                    mig.depth(),
                    report.elapsed
                ),
                Synthesis::Timeout => {
                    warn!("Class {representative}: timed out after {:?}.", report.elapsed)
                }
                Synthesis::Infeasible => {
                    warn!("Class {representative}: gate cap exhausted.")
                }
            }
            ClassOutcome {
                representative,
                outcome: report.outcome,
                elapsed: report.elapsed,
            }
        })
        .collect()
}

/// A collection of synthesized class circuits, keyed by canonical
/// representative and persisted in the text record format.
#[derive(Clone, Debug, Default)]
pub struct ClassDatabase {
    records: Vec<ClassRecord>,
}

impl ClassDatabase {
    /// Builds a database from the realized outcomes of a batch run,
    /// recording the measured synthesis times.
    pub fn from_outcomes(outcomes: Vec<ClassOutcome>) -> ClassDatabase {
        let records = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome.outcome {
                Synthesis::Realized(circuit) => Some(ClassRecord {
                    representative: outcome.representative,
                    circuit,
                    synthesis_time: Some(outcome.elapsed.as_secs_f64()),
                }),
                Synthesis::Timeout | Synthesis::Infeasible => None,
            })
            .collect_vec();
        ClassDatabase { records }
    }

    /// Returns the stored records.
    pub fn records(&self) -> &[ClassRecord] {
        &self.records
    }

    /// Writes the database to a file, creating parent directories as
    /// needed. Existing content is replaced wholesale.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let file = File::create(path).map_err(|e| e.to_string())?;
        write_records(BufWriter::new(file), &self.records)
    }

    /// Reads a database previously written by [`ClassDatabase::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<ClassDatabase, String> {
        let file = File::open(path.as_ref()).map_err(|e| e.to_string())?;
        Ok(ClassDatabase {
            records: read_records(BufReader::new(file))?,
        })
    }

    /// Looks up the class of an arbitrary function and returns a circuit
    /// computing that very function: the stored representative circuit is
    /// rewired through the inverse of the function's canonicalizing
    /// transform.
    pub fn lookup(&self, f: &TruthTable) -> Option<Mig> {
        let (representative, transform) = representative_with_transform(f);
        let record = self
            .records
            .iter()
            .find(|record| record.representative == representative)?;
        Some(record.circuit.transformed(&transform.inverse()))
    }

    /// Like [`ClassDatabase::lookup`], falling back to a fresh synthesis
    /// run for functions whose class is not stored.
    pub fn lookup_or_synthesize(&self, f: &TruthTable, synthesizer: &Synthesizer) -> Synthesis {
        match self.lookup(f) {
            Some(mig) => Synthesis::Realized(mig),
            None => synthesizer.run(f).outcome,
        }
    }
}
