//! Output module for the harvested corpus and run reports
//!
//! This module handles:
//! - Writing the corpus of book records as one JSON document
//! - Reading a corpus back
//! - Recording and printing per-run statistics

mod corpus;
pub mod stats;

pub use corpus::{load_corpus, CorpusWriter, JsonCorpusWriter};
pub use stats::{print_report, CrawlReport};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize corpus: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
