//! Configuration module for Book-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All sections are optional; missing values fall back to the defaults in
//! [`Config::default`].
//!
//! # Example
//!
//! ```no_run
//! use book_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Harvesting from {}", config.site.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DownloadConfig, HttpConfig, OutputConfig, PageRange, RetryConfig, SiteConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
