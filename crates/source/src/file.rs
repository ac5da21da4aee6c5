use std::path::{Path, PathBuf};

use crate::client::{SourceError, MAX_BODY_BYTES};
use crate::SampleSource;

/// Snapshot read from a local JSON file (offline runs, fixtures).
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSource for FileSource {
    fn fetch(&self) -> Result<String, SourceError> {
        let meta = std::fs::metadata(&self.path)
            .map_err(|e| SourceError::Io(format!("{}: {e}", self.path.display())))?;
        if meta.len() > MAX_BODY_BYTES {
            return Err(SourceError::TooLarge(MAX_BODY_BYTES));
        }
        std::fs::read_to_string(&self.path)
            .map_err(|e| SourceError::Io(format!("{}: {e}", self.path.display())))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, "[]").unwrap();

        let source = FileSource::new(&path);
        assert_eq!(source.fetch().unwrap(), "[]");
        assert_eq!(source.path(), path.as_path());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("nope.json"));
        let err = source.fetch().unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
        assert!(!err.is_network());
    }
}
