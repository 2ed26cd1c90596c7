//! Crawler coordinator - main harvest orchestration logic
//!
//! This module contains the harvest loop that coordinates:
//! - Walking listing pages of a category, or a range of book ids
//! - Fetching and parsing each book's detail page
//! - Downloading each book's text and cover image
//! - Deciding which failures are skipped and which end the run
//! - Writing the final corpus

use crate::config::{Config, PageRange};
use crate::crawler::catalog::CatalogWalker;
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::parser::parse_book_page;
use crate::crawler::record::BookRecord;
use crate::crawler::retry::RetryPolicy;
use crate::output::{CorpusWriter, CrawlReport, JsonCorpusWriter};
use crate::storage::{AssetDownloader, ExistingFiles};
use crate::url::{extract_book_id, SiteUrls};
use crate::HarvestError;
use std::path::{Path, PathBuf};
use url::Url;

/// What a run walks over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlPlan {
    /// Listing pages `[start, end)` of one category
    Category { category: String, pages: PageRange },
    /// Book ids `[start, end)`, each fetched from its detail page
    Ids { ids: PageRange },
}

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Harvested records in discovery order
    pub books: Vec<BookRecord>,
    /// Counters for the run
    pub report: CrawlReport,
}

/// Main harvest coordinator
///
/// Everything runs sequentially: one request in flight, one book at a time.
#[derive(Debug, Clone)]
pub struct Coordinator {
    site: SiteUrls,
    fetcher: HttpFetcher,
    retry: RetryPolicy,
    walker: CatalogWalker,
    downloader: AssetDownloader,
    books_folder: PathBuf,
    images_folder: PathBuf,
    skip_txt: bool,
    skip_imgs: bool,
}

impl Coordinator {
    /// Creates a coordinator from the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - Invalid base URL or HTTP client setup failure
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let site = SiteUrls::new(&config.site.base_url)?;
        let fetcher = HttpFetcher::new(&config.http)?;
        let retry = RetryPolicy::from(&config.retry);

        Ok(Self::with_parts(site, fetcher, retry, config))
    }

    /// Creates a coordinator around an existing fetcher and retry policy
    pub fn with_parts(
        site: SiteUrls,
        fetcher: HttpFetcher,
        retry: RetryPolicy,
        config: &Config,
    ) -> Self {
        let walker = CatalogWalker::new(fetcher.clone(), retry, site.clone());
        let downloader = AssetDownloader::new(
            fetcher.clone(),
            retry,
            ExistingFiles::from_skip_flag(config.download.skip_existing),
        );

        Self {
            site,
            fetcher,
            retry,
            walker,
            downloader,
            books_folder: config.output.books_folder(),
            images_folder: config.output.images_folder(),
            skip_txt: config.download.skip_txt,
            skip_imgs: config.download.skip_imgs,
        }
    }

    pub fn walker(&self) -> &CatalogWalker {
        &self.walker
    }

    /// Runs one full pass over the plan
    ///
    /// Redirects, HTTP errors and connection failures that survive the
    /// retries skip the affected page or book. Any other error ends the run.
    pub async fn run(&self, plan: &CrawlPlan) -> Result<CrawlOutcome, HarvestError> {
        let mut books = Vec::new();
        let mut report = CrawlReport::start();

        match plan {
            CrawlPlan::Category { category, pages } => {
                tracing::info!(
                    "Harvesting category {} pages [{}, {})",
                    category,
                    pages.start,
                    pages.end
                );
                self.crawl_category(category, *pages, &mut books, &mut report)
                    .await?;
            }
            CrawlPlan::Ids { ids } => {
                tracing::info!("Harvesting book ids [{}, {})", ids.start, ids.end);
                self.crawl_ids(*ids, &mut books, &mut report).await?;
            }
        }

        report.finish();
        tracing::info!(
            "Harvest completed: {} of {} books saved in {}s",
            report.books_saved,
            report.books_seen,
            report.duration_seconds().unwrap_or_default()
        );

        Ok(CrawlOutcome { books, report })
    }

    async fn crawl_category(
        &self,
        category: &str,
        pages: PageRange,
        books: &mut Vec<BookRecord>,
        report: &mut CrawlReport,
    ) -> Result<(), HarvestError> {
        for page in pages.iter() {
            let listing_url = self.site.listing_url(category, page)?;

            let links = match self.walker.list_book_links(&listing_url).await {
                Ok(links) => links,
                Err(e) if e.is_skippable() => {
                    tracing::warn!("Skipping listing page {} of {}: {}", page, category, e);
                    report.pages_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            report.pages_listed += 1;
            tracing::info!("Page {} of {}: {} books", page, category, links.len());

            for link in links {
                let id = extract_book_id(&link)
                    .ok_or_else(|| HarvestError::malformed(&link, "book link carries no id"))?;

                if let Some(book) = self.process_book(id, &link, report).await? {
                    books.push(book);
                }
            }
        }

        Ok(())
    }

    async fn crawl_ids(
        &self,
        ids: PageRange,
        books: &mut Vec<BookRecord>,
        report: &mut CrawlReport,
    ) -> Result<(), HarvestError> {
        for id in ids.iter() {
            let id = u64::from(id);
            let detail_url = self.site.book_url(id)?;

            if let Some(book) = self.process_book(id, &detail_url, report).await? {
                books.push(book);
            }
        }

        Ok(())
    }

    /// Harvests one book
    ///
    /// Returns `Ok(None)` when the detail page is skipped. Text and image
    /// downloads are independent; a skipped download leaves its path unset
    /// and keeps the record.
    async fn process_book(
        &self,
        id: u64,
        detail_url: &Url,
        report: &mut CrawlReport,
    ) -> Result<Option<BookRecord>, HarvestError> {
        report.books_seen += 1;

        let mut book = match self.fetch_book(detail_url).await {
            Ok(book) => book,
            Err(e) if e.is_skippable() => {
                tracing::warn!("Skipping book {}: {}", id, e);
                report.books_skipped += 1;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if !self.skip_txt {
            match self.download_text(id, &book.title).await {
                Ok(path) => book.text_path = Some(path_string(&path)),
                Err(e) if e.is_skippable() => {
                    tracing::warn!("No text for book {}: {}", id, e);
                    report.text_failures += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if !self.skip_imgs {
            let image_url = Url::parse(&book.image_url)?;
            match self
                .downloader
                .download_image(&image_url, &self.images_folder)
                .await
            {
                Ok(path) => book.image_path = Some(path_string(&path)),
                Err(e) if e.is_skippable() => {
                    tracing::warn!("No cover image for book {}: {}", id, e);
                    report.image_failures += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!("Saved book {}: {} ({})", id, book.title, book.author);
        report.books_saved += 1;

        Ok(Some(book))
    }

    async fn fetch_book(&self, detail_url: &Url) -> Result<BookRecord, HarvestError> {
        let response = self
            .retry
            .run(|| self.fetcher.fetch(detail_url, &[]))
            .await?;

        parse_book_page(&response.text(), detail_url)
    }

    async fn download_text(&self, id: u64, title: &str) -> Result<PathBuf, HarvestError> {
        let id = id.to_string();
        let text_url = self.site.text_url()?;
        let name = format!("{}. {}", id, title);
        let query = [("id", id.as_str())];

        let path = self
            .downloader
            .download_text(&text_url, &query, &name, &self.books_folder)
            .await?;

        Ok(path)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Runs a complete harvest and writes the corpus
///
/// This is the main entry point. It will:
/// 1. Build the HTTP client and coordinator from the configuration
/// 2. Walk the plan, collecting records
/// 3. Write the corpus to the configured JSON path, replacing any old one
///
/// # Example
///
/// ```no_run
/// use book_harvester::{run_crawl, Config, CrawlPlan, PageRange};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let plan = CrawlPlan::Ids { ids: PageRange::clamped(1, 11) };
/// let outcome = run_crawl(&config, &plan).await?;
/// println!("{} books", outcome.books.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, plan: &CrawlPlan) -> Result<CrawlOutcome, HarvestError> {
    let coordinator = Coordinator::new(config)?;
    let outcome = coordinator.run(plan).await?;

    JsonCorpusWriter::new(config.output.corpus_path()).write(&outcome.books)?;

    Ok(outcome)
}
