//! Per-run statistics
//!
//! Failed books leave no trace in the corpus; this report and the log are
//! the only place they are counted.

use chrono::{DateTime, Utc};

/// Counters for one harvest run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (None while running)
    pub finished_at: Option<DateTime<Utc>>,

    /// Listing pages fetched successfully
    pub pages_listed: u64,

    /// Listing pages skipped after a redirect, HTTP or connection failure
    pub pages_skipped: u64,

    /// Detail pages attempted
    pub books_seen: u64,

    /// Records added to the corpus
    pub books_saved: u64,

    /// Books dropped after a redirect, HTTP or connection failure
    pub books_skipped: u64,

    /// Text downloads that failed (record kept without a text path)
    pub text_failures: u64,

    /// Image downloads that failed (record kept without an image path)
    pub image_failures: u64,
}

impl Default for CrawlReport {
    fn default() -> Self {
        Self::start()
    }
}

impl CrawlReport {
    /// Creates an empty report stamped with the current time
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            pages_listed: 0,
            pages_skipped: 0,
            books_seen: 0,
            books_saved: 0,
            books_skipped: 0,
            text_failures: 0,
            image_failures: 0,
        }
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Run duration in seconds, if finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Percentage of attempted books that made it into the corpus
    pub fn success_rate(&self) -> f64 {
        if self.books_seen == 0 {
            return 0.0;
        }
        (self.books_saved as f64 / self.books_seen as f64) * 100.0
    }
}

/// Prints a report to stdout in a human-readable format
pub fn print_report(report: &CrawlReport) {
    println!("=== Harvest Report ===\n");

    println!("Started:  {}", report.started_at.to_rfc3339());
    if let Some(finished) = report.finished_at {
        println!("Finished: {}", finished.to_rfc3339());
    }
    if let Some(duration) = report.duration_seconds() {
        println!("Duration: {} seconds", duration);
    }
    println!();

    println!("Listing pages: {} read, {} skipped", report.pages_listed, report.pages_skipped);
    println!("Books seen:    {}", report.books_seen);
    println!("Books saved:   {}", report.books_saved);
    println!("Books skipped: {}", report.books_skipped);
    println!("Success rate:  {:.2}%", report.success_rate());

    if report.text_failures > 0 || report.image_failures > 0 {
        println!("\nDownload failures:");
        println!("  Texts:  {}", report.text_failures);
        println!("  Images: {}", report.image_failures);
    }
}
