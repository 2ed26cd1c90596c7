//! Category listing traversal

use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::parser::{extract_book_links, extract_last_page};
use crate::crawler::retry::RetryPolicy;
use crate::url::SiteUrls;
use crate::HarvestError;
use url::Url;

/// Reads category listing pages
#[derive(Debug, Clone)]
pub struct CatalogWalker {
    fetcher: HttpFetcher,
    retry: RetryPolicy,
    site: SiteUrls,
}

impl CatalogWalker {
    pub fn new(fetcher: HttpFetcher, retry: RetryPolicy, site: SiteUrls) -> Self {
        Self {
            fetcher,
            retry,
            site,
        }
    }

    /// Fetches one listing page and returns its book detail links
    ///
    /// Links are absolute, resolved against `listing_url`, in document order.
    /// A listing without thumbnails yields an empty vector, not an error.
    pub async fn list_book_links(&self, listing_url: &Url) -> Result<Vec<Url>, HarvestError> {
        tracing::debug!("Listing {}", listing_url);
        let response = self
            .retry
            .run(|| self.fetcher.fetch(listing_url, &[]))
            .await?;

        let links = extract_book_links(&response.text(), listing_url);
        tracing::debug!("{} book links on {}", links.len(), listing_url);

        Ok(links)
    }

    /// Reads the number of the last listing page of a category
    ///
    /// A category whose first page has no page-count control has one page.
    pub async fn discover_last_page(&self, category: &str) -> Result<u32, HarvestError> {
        let url = self.site.category_url(category)?;
        let response = self.retry.run(|| self.fetcher.fetch(&url, &[])).await?;

        let last_page = extract_last_page(&response.text()).unwrap_or(1);
        tracing::info!("Category {} has {} pages", category, last_page);

        Ok(last_page)
    }
}
