//! Terminal, CSV and JSON output for a cycle result.

use std::io::Write;

use serde::Serialize;
use volsync_align::AlignResult;
use volsync_config::DisplaySettings;

use crate::present::{chart_series, table_rows, ChartSeries, Headline, TableRow};
use crate::util::{display_width, pad_left, pad_right};

const TIME_HEADER: &str = "Time (UTC)";
const DIFF_HEADER: &str = "Diff";
const DIFF_PERCENT_HEADER: &str = "Diff %";
const MAX_LABEL_WIDTH: usize = 24;

fn headers(display: &DisplaySettings) -> [String; 5] {
    [
        TIME_HEADER.to_string(),
        display.label_a.clone(),
        display.label_b.clone(),
        DIFF_HEADER.to_string(),
        DIFF_PERCENT_HEADER.to_string(),
    ]
}

fn cells(row: &TableRow) -> [&str; 5] {
    [
        row.time.as_str(),
        row.value_a.as_str(),
        row.value_b.as_str(),
        row.diff.as_str(),
        row.diff_percent.as_str(),
    ]
}

/// Fixed-width table: time left-aligned, numeric columns right-aligned.
pub fn table(rows: &[TableRow], display: &DisplaySettings) -> String {
    let headers = headers(display);
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|h| display_width(h).min(MAX_LABEL_WIDTH))
        .collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(cells(row)) {
            *w = (*w).max(display_width(cell));
        }
    }

    let mut out = String::new();
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| pad_right(h, w))
        .collect();
    out.push_str(header_line.join("  ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    for row in rows {
        let line: Vec<String> = cells(row)
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| if i == 0 { pad_right(cell, w) } else { pad_left(cell, w) })
            .collect();
        out.push_str(&line.join("  "));
        out.push('\n');
    }
    out
}

/// Headline, table and status line, as printed by `run`, `align` and `watch`.
pub fn human(result: &AlignResult, status: &str, display: &DisplaySettings) -> String {
    let mut out = String::new();
    out.push_str(&Headline::new(&result.summary, display).to_string());
    out.push_str("\n\n");
    if !result.rows.is_empty() {
        out.push_str(&table(&table_rows(&result.rows, display.decimals), display));
        out.push('\n');
    }
    out.push_str(status);
    out.push('\n');
    out
}

pub fn write_csv<W: Write>(
    writer: W,
    rows: &[TableRow],
    display: &DisplaySettings,
) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    // Header always written, even with zero rows
    wtr.write_record(headers(display))?;
    for row in rows {
        wtr.write_record(cells(row))?;
    }
    wtr.flush()?;
    Ok(())
}

/// `--json` document: the engine result plus display-ready views.
#[derive(Serialize)]
pub struct JsonOutput<'a> {
    #[serde(flatten)]
    pub result: &'a AlignResult,
    pub status: &'a str,
    pub headline: Headline,
    pub chart: ChartSeries,
}

impl<'a> JsonOutput<'a> {
    pub fn new(result: &'a AlignResult, status: &'a str, display: &DisplaySettings) -> Self {
        Self {
            result,
            status,
            headline: Headline::new(&result.summary, display),
            chart: chart_series(&result.rows, display),
        }
    }
}

/// Clear the terminal between watch cycles. No-op when stdout is piped.
pub fn clear_screen() {
    if atty::is(atty::Stream::Stdout) {
        print!("\x1b[2J\x1b[H");
        let _ = std::io::stdout().flush();
    }
}
