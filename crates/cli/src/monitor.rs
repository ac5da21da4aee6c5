//! Poll cycle: fetch, align, summarize, publish.
//!
//! A cycle either replaces the whole snapshot or leaves the previous one in
//! place; only the status line reflects a failed cycle.

use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use log::{info, warn};
use volsync_align::{AlignConfig, AlignError, AlignResult};
use volsync_source::{SampleSource, SourceError};

pub const NO_DATA_STATUS: &str = "no synchronized data to display";

/// Output of one successful cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub result: AlignResult,
    pub fetched_at: DateTime<Local>,
}

#[derive(Debug)]
pub enum CycleError {
    Source(SourceError),
    Data(AlignError),
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleError::Source(e) => write!(f, "{}", e),
            CycleError::Data(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CycleError {}

impl From<SourceError> for CycleError {
    fn from(e: SourceError) -> Self {
        CycleError::Source(e)
    }
}

impl From<AlignError> for CycleError {
    fn from(e: AlignError) -> Self {
        CycleError::Data(e)
    }
}

pub struct Monitor<S: SampleSource> {
    source: S,
    config: AlignConfig,
    snapshot: Option<Snapshot>,
    status: String,
}

impl<S: SampleSource> Monitor<S> {
    pub fn new(source: S, config: AlignConfig) -> Self {
        Self {
            source,
            config,
            snapshot: None,
            status: "waiting for first update".to_string(),
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Run one cycle. On failure the previous snapshot is kept.
    pub fn refresh(&mut self) -> Result<&Snapshot, CycleError> {
        match self.cycle() {
            Ok(result) => {
                let snapshot = Snapshot {
                    result,
                    fetched_at: Local::now(),
                };
                self.status = if snapshot.result.rows.is_empty() {
                    NO_DATA_STATUS.to_string()
                } else {
                    format!("last update: {}", snapshot.fetched_at.to_rfc2822())
                };
                info!(
                    "cycle ok: {} rows from {}",
                    snapshot.result.rows.len(),
                    self.source.describe()
                );
                Ok(self.snapshot.insert(snapshot))
            }
            Err(e) => {
                warn!("cycle failed for {}: {}", self.source.describe(), e);
                self.status = format!("update failed: {}", e);
                Err(e)
            }
        }
    }

    fn cycle(&self) -> Result<AlignResult, CycleError> {
        let body = self.source.fetch()?;
        Ok(volsync_align::run_json(&self.config, &body)?)
    }
}

/// Blocking poll loop. Runs a cycle immediately, then one per `interval`,
/// never overlapping: an overrunning cycle is followed by the next one at
/// once. `max_cycles` of `None` polls forever. Returns the number of cycles run.
pub fn watch<S, F>(
    monitor: &mut Monitor<S>,
    interval: Duration,
    max_cycles: Option<usize>,
    mut on_cycle: F,
) -> usize
where
    S: SampleSource,
    F: FnMut(&Monitor<S>, Option<&CycleError>),
{
    let mut cycles = 0;
    loop {
        let started = Instant::now();
        let outcome = monitor.refresh().err();
        on_cycle(monitor, outcome.as_ref());
        cycles += 1;

        if max_cycles.is_some_and(|max| cycles >= max) {
            return cycles;
        }
        if let Some(remaining) = interval.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }
}
