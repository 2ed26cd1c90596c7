//! Book-Harvester: a catalog harvester for paginated book sites
//!
//! This crate walks category listing pages, parses book detail pages into
//! structured records, downloads each book's text and cover image, and writes
//! the collected records into a single JSON corpus.

pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Book-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Connection failure for {url}: {message}")]
    Transient { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Redirect detected for {url} (to {location})")]
    RedirectDetected { url: String, location: String },

    #[error("Malformed page at {url}: {message}")]
    MalformedPage { url: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the coordinator should do with a failed book or page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Expected absence or network trouble: log, skip, keep going
    Skip,
    /// Unexpected failure: stop the run
    Abort,
}

impl HarvestError {
    /// Returns true for connection-level failures, the only retryable class
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Classifies the error into skip-and-continue or propagate
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::Transient { .. } | Self::HttpStatus { .. } | Self::RedirectDetected { .. } => {
                Disposition::Skip
            }
            _ => Disposition::Abort,
        }
    }

    /// Shorthand for `disposition() == Disposition::Skip`
    pub fn is_skippable(&self) -> bool {
        self.disposition() == Disposition::Skip
    }

    pub(crate) fn malformed(url: impl ToString, message: impl Into<String>) -> Self {
        Self::MalformedPage {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("URL has no usable file name: {0}")]
    NoFileName(String),
}

/// Result type alias for Book-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, PageRange};
pub use crawler::{run_crawl, BookRecord, Coordinator, CrawlOutcome, CrawlPlan};
pub use output::{CorpusWriter, JsonCorpusWriter};
