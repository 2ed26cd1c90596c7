//! Corpus persistence
//!
//! The corpus is the sole interface to the site renderer: one JSON array of
//! book records, UTF-8, with non-ASCII text written as-is.

use crate::crawler::BookRecord;
use crate::output::OutputResult;
use std::path::{Path, PathBuf};

/// Trait for corpus sinks
///
/// A sink receives the complete ordered corpus once per run and replaces
/// whatever it held before. There is no append mode.
pub trait CorpusWriter {
    /// Writes the full corpus
    fn write(&self, records: &[BookRecord]) -> OutputResult<()>;
}

/// Writes the corpus as a JSON array to a file
#[derive(Debug, Clone)]
pub struct JsonCorpusWriter {
    path: PathBuf,
}

impl JsonCorpusWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusWriter for JsonCorpusWriter {
    fn write(&self, records: &[BookRecord]) -> OutputResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(records)?;
        std::fs::write(&self.path, json)?;

        tracing::info!(
            "Wrote {} books to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Reads a corpus written by [`JsonCorpusWriter`]
pub fn load_corpus(path: &Path) -> OutputResult<Vec<BookRecord>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
