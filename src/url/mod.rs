//! URL handling module for Book-Harvester
//!
//! This module provides the URL templates of the catalog origin, resolution of
//! page-relative links, book id extraction, and file name derivation for
//! downloaded assets.

mod filename;
mod resolve;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use filename::filename_from_url;
pub use resolve::{extract_book_id, resolve_link};

/// URL templates for the catalog origin
///
/// | Resource | Path |
/// |----------|------|
/// | First listing page | `/<category>/` |
/// | Listing page | `/<category>/<page>/` |
/// | Detail page | `/b<id>/` |
/// | Text endpoint | `/txt.php` (book id in the `id` query parameter) |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    base: Url,
}

impl SiteUrls {
    /// Parses the origin URL
    ///
    /// A path on the base URL is kept, and treated as a directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use book_harvester::url::SiteUrls;
    ///
    /// let site = SiteUrls::new("https://tululu.org").unwrap();
    /// assert_eq!(site.book_url(239).unwrap().as_str(), "https://tululu.org/b239/");
    /// ```
    pub fn new(base_url: &str) -> UrlResult<Self> {
        let mut base = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(UrlError::InvalidScheme(base.scheme().to_string()));
        }

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { base })
    }

    /// The origin URL, always ending with `/`
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// First listing page of a category, also carrying the page-count control
    pub fn category_url(&self, category: &str) -> UrlResult<Url> {
        self.join(&format!("{}/", category))
    }

    /// Listing page `page` of a category
    pub fn listing_url(&self, category: &str, page: u32) -> UrlResult<Url> {
        self.join(&format!("{}/{}/", category, page))
    }

    /// Detail page of a book
    pub fn book_url(&self, id: u64) -> UrlResult<Url> {
        self.join(&format!("b{}/", id))
    }

    /// Text download endpoint; the book id goes in the `id` query parameter
    pub fn text_url(&self) -> UrlResult<Url> {
        self.join("txt.php")
    }

    fn join(&self, path: &str) -> UrlResult<Url> {
        self.base
            .join(path)
            .map_err(|e| UrlError::Parse(e.to_string()))
    }
}
