use serde::{Deserialize, Serialize};

use crate::error::AlignError;
use crate::model::SourceId;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub strategy: AlignStrategy,
    pub tolerance_seconds: u32,
    /// Source whose samples drive row cardinality in the nearest strategies.
    pub reference_source: SourceId,
    pub alert_threshold_percent: f64,
    pub volume_mode: VolumeMode,
    pub fields: FieldMapping,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            strategy: AlignStrategy::default(),
            tolerance_seconds: 10,
            reference_source: SourceId::A,
            alert_threshold_percent: 8.0,
            volume_mode: VolumeMode::default(),
            fields: FieldMapping::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignStrategy {
    /// Earliest other-source sample at or after the reference time, within tolerance.
    NearestForward,
    /// Other-source sample with minimal absolute distance, within tolerance.
    NearestSymmetric,
    /// Union timeline, carrying each source's last known value forward.
    ForwardFill,
}

impl Default for AlignStrategy {
    fn default() -> Self {
        Self::NearestForward
    }
}

impl std::fmt::Display for AlignStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NearestForward => write!(f, "nearest_forward"),
            Self::NearestSymmetric => write!(f, "nearest_symmetric"),
            Self::ForwardFill => write!(f, "forward_fill"),
        }
    }
}

impl std::str::FromStr for AlignStrategy {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest_forward" => Ok(Self::NearestForward),
            "nearest_symmetric" => Ok(Self::NearestSymmetric),
            "forward_fill" => Ok(Self::ForwardFill),
            other => Err(AlignError::ConfigValidation(format!(
                "unknown strategy '{other}' (expected nearest_forward, nearest_symmetric or forward_fill)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Volume mode
// ---------------------------------------------------------------------------

/// How the volume field of each record is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeMode {
    /// Values are already cumulative totals.
    Cumulative,
    /// Values are increments; the running sum is computed after sorting.
    Delta,
}

impl Default for VolumeMode {
    fn default() -> Self {
        Self::Cumulative
    }
}

// ---------------------------------------------------------------------------
// Field mapping
// ---------------------------------------------------------------------------

/// JSON keys of a raw record, and the source id values that select A and B.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub source: String,
    pub timestamp: String,
    pub volume: String,
    pub source_a_id: String,
    pub source_b_id: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            source: "gesBoxId".into(),
            timestamp: "timestamp".into(),
            volume: "volume".into(),
            source_a_id: "GesBox1".into(),
            source_b_id: "GesBox2".into(),
        }
    }
}

impl FieldMapping {
    /// Map a raw source id value to A or B.
    pub fn resolve(&self, raw: &str) -> Option<SourceId> {
        if raw == self.source_a_id {
            Some(SourceId::A)
        } else if raw == self.source_b_id {
            Some(SourceId::B)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl AlignConfig {
    pub fn from_toml(input: &str) -> Result<Self, AlignError> {
        let config: AlignConfig =
            toml::from_str(input).map_err(|e| AlignError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AlignError> {
        if !self.alert_threshold_percent.is_finite() || self.alert_threshold_percent < 0.0 {
            return Err(AlignError::ConfigValidation(format!(
                "alert_threshold_percent must be a finite number >= 0, got {}",
                self.alert_threshold_percent
            )));
        }

        let f = &self.fields;
        for (name, value) in [
            ("source", &f.source),
            ("timestamp", &f.timestamp),
            ("volume", &f.volume),
            ("source_a_id", &f.source_a_id),
            ("source_b_id", &f.source_b_id),
        ] {
            if value.trim().is_empty() {
                return Err(AlignError::ConfigValidation(format!(
                    "fields.{name} must not be empty"
                )));
            }
        }

        if f.source_a_id == f.source_b_id {
            return Err(AlignError::ConfigValidation(format!(
                "source_a_id and source_b_id must differ (both '{}')",
                f.source_a_id
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
