use serde_json::Value;

use crate::aligner::align;
use crate::config::AlignConfig;
use crate::error::AlignError;
use crate::model::{AlignMeta, AlignResult, IngestReport, SampleStore};
use crate::store::{ingest, ingest_json};
use crate::summary::evaluate;

/// Run the full pipeline over already-parsed raw records.
pub fn run(config: &AlignConfig, records: &[Value]) -> Result<AlignResult, AlignError> {
    let (store, report) = ingest(records, config)?;
    Ok(run_store(config, &store, report))
}

/// Run the full pipeline over a JSON payload (top-level array of records).
pub fn run_json(config: &AlignConfig, body: &str) -> Result<AlignResult, AlignError> {
    let (store, report) = ingest_json(body, config)?;
    Ok(run_store(config, &store, report))
}

/// Align and summarize an already-normalized store.
pub fn run_store(config: &AlignConfig, store: &SampleStore, report: IngestReport) -> AlignResult {
    let rows = align(store, config);
    let summary = evaluate(store, config.alert_threshold_percent);

    AlignResult {
        meta: AlignMeta {
            strategy: config.strategy,
            tolerance_seconds: config.tolerance_seconds,
            reference_source: config.reference_source,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        report,
        rows,
        summary,
    }
}
