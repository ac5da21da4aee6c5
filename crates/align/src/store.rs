//! Ingestion normalization: raw JSON records into per-source sorted sequences.
//!
//! Records whose source id is missing or unrecognized are dropped. Records
//! with a recognized source must carry a usable timestamp and volume; anything
//! else fails the whole batch so a half-parsed snapshot is never published.

use log::{debug, warn};
use serde_json::Value;

use crate::config::{AlignConfig, FieldMapping, VolumeMode};
use crate::error::AlignError;
use crate::model::{IngestReport, Sample, SampleStore, SourceId};

/// Parse a JSON payload (top-level array) and normalize it.
pub fn ingest_json(body: &str, config: &AlignConfig) -> Result<(SampleStore, IngestReport), AlignError> {
    let value: Value = serde_json::from_str(body).map_err(|e| AlignError::Json(e.to_string()))?;
    match value {
        Value::Array(records) => ingest(&records, config),
        other => Err(AlignError::Json(format!(
            "expected a JSON array of samples, got {}",
            json_kind(&other)
        ))),
    }
}

/// Partition records by source, stable-sort each by timestamp, apply volume mode.
pub fn ingest(records: &[Value], config: &AlignConfig) -> Result<(SampleStore, IngestReport), AlignError> {
    let fields = &config.fields;
    let mut store = SampleStore::default();
    let mut report = IngestReport::default();

    for (index, record) in records.iter().enumerate() {
        let Some(source) = record_source(record, fields) else {
            debug!("dropping record {index}: missing or unrecognized '{}'", fields.source);
            report.dropped += 1;
            continue;
        };

        let timestamp = read_timestamp(record, index, &fields.timestamp)?;
        let volume = read_volume(record, index, &fields.volume)?;
        let sample = Sample { source, timestamp, volume };

        match source {
            SourceId::A => store.a.push(sample),
            SourceId::B => store.b.push(sample),
        }
    }

    // Vec::sort_by_key is stable: equal timestamps keep arrival order.
    store.a.sort_by_key(|s| s.timestamp);
    store.b.sort_by_key(|s| s.timestamp);

    if config.volume_mode == VolumeMode::Delta {
        accumulate(&mut store.a);
        accumulate(&mut store.b);
    }

    report.accepted_a = store.a.len();
    report.accepted_b = store.b.len();
    report.regressions_a = count_regressions(&store.a);
    report.regressions_b = count_regressions(&store.b);

    for (source, count) in [(SourceId::A, report.regressions_a), (SourceId::B, report.regressions_b)] {
        if count > 0 {
            warn!("source {source}: cumulative volume decreased {count} time(s) (sensor reset?)");
        }
    }

    debug!(
        "ingested {} record(s): a={}, b={}, dropped={}",
        records.len(),
        report.accepted_a,
        report.accepted_b,
        report.dropped
    );

    Ok((store, report))
}

fn record_source(record: &Value, fields: &FieldMapping) -> Option<SourceId> {
    record.get(&fields.source)?.as_str().and_then(|raw| fields.resolve(raw))
}

/// Numbers arrive either as JSON numbers or, from spreadsheet exports, as strings.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn read_timestamp(record: &Value, index: usize, field: &str) -> Result<i64, AlignError> {
    let raw = record.get(field).ok_or_else(|| malformed(index, field, "is missing"))?;

    if let Some(n) = raw.as_i64() {
        if n < 0 {
            return Err(malformed(index, field, "is negative"));
        }
        return Ok(n);
    }

    let secs = numeric(raw).ok_or_else(|| malformed(index, field, "is not a number"))?;
    if !secs.is_finite() || secs < 0.0 || secs >= i64::MAX as f64 {
        return Err(malformed(index, field, "is not a valid Unix timestamp"));
    }
    Ok(secs.floor() as i64)
}

fn read_volume(record: &Value, index: usize, field: &str) -> Result<f64, AlignError> {
    let raw = record.get(field).ok_or_else(|| malformed(index, field, "is missing"))?;
    let volume = numeric(raw).ok_or_else(|| malformed(index, field, "is not a number"))?;
    if !volume.is_finite() {
        return Err(malformed(index, field, "is not finite"));
    }
    if volume < 0.0 {
        return Err(malformed(index, field, "is negative"));
    }
    Ok(volume)
}

fn malformed(index: usize, field: &str, reason: &str) -> AlignError {
    AlignError::MalformedData {
        index,
        field: field.into(),
        reason: reason.into(),
    }
}

fn accumulate(samples: &mut [Sample]) {
    let mut total = 0.0;
    for sample in samples.iter_mut() {
        total += sample.volume;
        sample.volume = total;
    }
}

fn count_regressions(samples: &[Sample]) -> usize {
    samples.windows(2).filter(|w| w[1].volume < w[0].volume).count()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
