//! Sample snapshot sources shared between the CLI commands.
//!
//! A source returns the raw JSON body of one full snapshot. Parsing and
//! normalization belong to `volsync-align`.
//!
//! No retries: the poll interval is the retry mechanism.

mod client;
mod file;

pub use client::{HttpSource, SourceError, DEFAULT_TIMEOUT_SECS, MAX_BODY_BYTES};
pub use file::FileSource;

/// Anything that can produce one raw snapshot body per call.
pub trait SampleSource {
    /// Fetch the full snapshot as text.
    fn fetch(&self) -> Result<String, SourceError>;

    /// Human-readable origin, for logs and status lines.
    fn describe(&self) -> String;
}
