//! Crawler module for catalog harvesting
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with redirect guarding
//! - Fixed-delay retry of connection failures
//! - Detail and listing page parsing
//! - Category listing traversal
//! - Overall harvest coordination

mod catalog;
mod coordinator;
mod fetcher;
mod parser;
mod record;
mod retry;

pub use catalog::CatalogWalker;
pub use coordinator::{run_crawl, Coordinator, CrawlOutcome, CrawlPlan};
pub use fetcher::{
    build_http_client, check_for_redirect, check_status, HttpFetcher, RawResponse, MAX_REDIRECTS,
};
pub use parser::{extract_book_links, extract_last_page, parse_book_page, TITLE_AUTHOR_DELIMITER};
pub use record::BookRecord;
pub use retry::{RetryPolicy, DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS};
