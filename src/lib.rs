pub mod database;
pub mod file_formats;
pub mod mig;
pub mod npn;
pub mod synthesis;
pub mod transform;
pub mod truth_table;

pub use database::{compute_classes, ClassDatabase, ClassOutcome};
pub use mig::{GateId, Mig, Signal, Source};
pub use npn::{
    classes, equivalent, representative, representative_with_transform, symmetric, symmetric_pairs,
};
pub use synthesis::{synthesize_minimum, Report, Synthesis, Synthesizer};
pub use transform::Transform;
pub use truth_table::TruthTable;
