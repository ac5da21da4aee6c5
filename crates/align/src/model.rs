use serde::{Deserialize, Serialize};

use crate::config::AlignStrategy;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One of the two compared sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    A,
    B,
}

impl SourceId {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::A
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "a"),
            Self::B => write!(f, "b"),
        }
    }
}

/// A single normalized reading. `timestamp` is Unix seconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub source: SourceId,
    pub timestamp: i64,
    pub volume: f64,
}

/// Per-source sample sequences, each sorted ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleStore {
    pub a: Vec<Sample>,
    pub b: Vec<Sample>,
}

impl SampleStore {
    pub fn get(&self, source: SourceId) -> &[Sample] {
        match source {
            SourceId::A => &self.a,
            SourceId::B => &self.b,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty() && self.b.is_empty()
    }

    /// Most recent sample of a source, if it has any.
    pub fn latest(&self, source: SourceId) -> Option<&Sample> {
        self.get(source).last()
    }
}

/// Counters collected while normalizing raw records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub accepted_a: usize,
    pub accepted_b: usize,
    /// Records with a missing or unrecognized source id.
    pub dropped: usize,
    /// Samples whose volume is lower than the previous sample of the same source.
    pub regressions_a: usize,
    pub regressions_b: usize,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One row of the synchronized timeline. `None` means "no reading", never zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignedRow {
    pub timestamp: i64,
    pub value_a: Option<f64>,
    pub value_b: Option<f64>,
}

/// Latest true reading of each source, computed from the unaligned sequences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub last_a: Option<f64>,
    pub last_b: Option<f64>,
    pub last_timestamp: Option<i64>,
    pub discrepancy_ratio: Option<f64>,
    pub alert: bool,
}

impl Summary {
    /// Discrepancy as a percentage, for display.
    pub fn discrepancy_percent(&self) -> Option<f64> {
        self.discrepancy_ratio.map(|r| r * 100.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignMeta {
    pub strategy: AlignStrategy,
    pub tolerance_seconds: u32,
    pub reference_source: SourceId,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignResult {
    pub meta: AlignMeta,
    pub report: IngestReport,
    pub rows: Vec<AlignedRow>,
    pub summary: Summary,
}
