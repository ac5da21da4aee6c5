//! Presentation adapter: turns aligned rows and the summary into display
//! values (table cells, chart series, headline). No I/O here.

use chrono::DateTime;
use serde::Serialize;
use volsync_align::{AlignedRow, Summary};
use volsync_config::DisplaySettings;

const ABSENT: &str = "---";
const NOT_AVAILABLE: &str = "N/A";

/// `dd/mm/yyyy HH:MM:SS (UTC)`. Out-of-range timestamps fall back to the raw number.
pub fn format_utc(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%d/%m/%Y %H:%M:%S (UTC)").to_string(),
        None => timestamp.to_string(),
    }
}

/// `HH:MM:SS` in UTC, used for chart labels.
pub fn format_clock(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}

fn format_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => ABSENT.to_string(),
    }
}

/// One rendered table line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub time: String,
    pub value_a: String,
    pub value_b: String,
    pub diff: String,
    pub diff_percent: String,
}

impl TableRow {
    pub fn from_row(row: &AlignedRow, decimals: usize) -> Self {
        let diff = match (row.value_a, row.value_b) {
            (Some(a), Some(b)) => format!("{:.*}", decimals, a - b),
            _ => NOT_AVAILABLE.to_string(),
        };
        // Relative to A's reading, so A must be strictly positive.
        let diff_percent = match (row.value_a, row.value_b) {
            (Some(a), Some(b)) if a > 0.0 => format!("{:.2}%", (a - b) / a * 100.0),
            _ => NOT_AVAILABLE.to_string(),
        };

        Self {
            time: format_utc(row.timestamp),
            value_a: format_value(row.value_a, decimals),
            value_b: format_value(row.value_b, decimals),
            diff,
            diff_percent,
        }
    }
}

pub fn table_rows(rows: &[AlignedRow], decimals: usize) -> Vec<TableRow> {
    rows.iter().map(|row| TableRow::from_row(row, decimals)).collect()
}

/// Line chart data, rebuilt from scratch every cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub title_a: String,
    pub title_b: String,
    pub labels: Vec<String>,
    /// `None` serializes as `null`, which charting front-ends draw as a gap.
    pub series_a: Vec<Option<f64>>,
    pub series_b: Vec<Option<f64>>,
}

pub fn chart_series(rows: &[AlignedRow], display: &DisplaySettings) -> ChartSeries {
    ChartSeries {
        title_a: display.label_a.clone(),
        title_b: display.label_b.clone(),
        labels: rows.iter().map(|r| format_clock(r.timestamp)).collect(),
        series_a: rows.iter().map(|r| r.value_a).collect(),
        series_b: rows.iter().map(|r| r.value_b).collect(),
    }
}

/// Latest readings and the discrepancy verdict, formatted for a single line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub label_a: String,
    pub label_b: String,
    pub latest_a: String,
    pub latest_b: String,
    pub last_timestamp: String,
    pub discrepancy: String,
    pub alert: bool,
}

impl Headline {
    pub fn new(summary: &Summary, display: &DisplaySettings) -> Self {
        Self {
            label_a: display.label_a.clone(),
            label_b: display.label_b.clone(),
            latest_a: format_value(summary.last_a, display.decimals),
            latest_b: format_value(summary.last_b, display.decimals),
            last_timestamp: summary
                .last_timestamp
                .map(format_utc)
                .unwrap_or_else(|| ABSENT.to_string()),
            discrepancy: summary
                .discrepancy_percent()
                .map(|p| format!("{:.2}%", p))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            alert: summary.alert,
        }
    }
}

impl std::fmt::Display for Headline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}  {}: {}  at {}  discrepancy: {}",
            self.label_a,
            self.latest_a,
            self.label_b,
            self.latest_b,
            self.last_timestamp,
            self.discrepancy
        )?;
        if self.alert {
            write!(f, "  ALERT")?;
        }
        Ok(())
    }
}
