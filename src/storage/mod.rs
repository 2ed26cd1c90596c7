//! Storage module for downloaded assets
//!
//! This module writes book texts and cover images to disk:
//! - `AssetDownloader`: fetch-and-write for texts and images
//! - File name sanitizing for names built from book titles and URLs
//!
//! Every write replaces an existing file unless `ExistingFiles::Skip` is used.

mod assets;
mod sanitize;

pub use assets::{AssetDownloader, ExistingFiles, TEXT_EXTENSION};
pub use sanitize::{is_valid_filename, sanitize_filename, sanitize_stem, MAX_FILENAME_BYTES};
