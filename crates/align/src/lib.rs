//! `volsync-align`: two-source volume time-series alignment.
//!
//! Pure engine crate: receives raw sample records, returns aligned rows and a
//! latest-reading summary. No CLI, network or filesystem dependencies.

pub mod aligner;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod store;
pub mod summary;

pub use config::{AlignConfig, AlignStrategy, FieldMapping, VolumeMode};
pub use engine::{run, run_json};
pub use error::AlignError;
pub use model::{AlignResult, AlignedRow, IngestReport, Sample, SampleStore, SourceId, Summary};
