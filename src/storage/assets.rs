//! Book text and cover image downloads

use crate::crawler::{HttpFetcher, RetryPolicy};
use crate::storage::sanitize::sanitize_stem;
use crate::url::filename_from_url;
use crate::HarvestError;
use std::path::{Path, PathBuf};
use url::Url;

/// Extension of every downloaded book text
pub const TEXT_EXTENSION: &str = "txt";

/// What to do when the destination file already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistingFiles {
    /// Fetch again and replace the file
    #[default]
    Overwrite,
    /// Keep the file and skip the request
    Skip,
}

impl ExistingFiles {
    pub fn from_skip_flag(skip_existing: bool) -> Self {
        if skip_existing {
            Self::Skip
        } else {
            Self::Overwrite
        }
    }
}

/// Persists text and image resources under target folders
///
/// Requests go through the fetcher's redirect guard and the retry policy;
/// a redirect means the resource does not exist.
#[derive(Debug, Clone)]
pub struct AssetDownloader {
    fetcher: HttpFetcher,
    retry: RetryPolicy,
    existing: ExistingFiles,
}

impl AssetDownloader {
    pub fn new(fetcher: HttpFetcher, retry: RetryPolicy, existing: ExistingFiles) -> Self {
        Self {
            fetcher,
            retry,
            existing,
        }
    }

    /// Downloads a text resource to `<folder>/<desired_name>.txt`
    ///
    /// `desired_name` is sanitized first if it is not a valid file name, or
    /// if it no longer fits once the extension is added. `folder` is created
    /// when missing.
    ///
    /// # Arguments
    ///
    /// * `source` - The text endpoint
    /// * `query` - Query parameters for the endpoint (e.g., the book id)
    /// * `desired_name` - File stem, before sanitizing
    /// * `folder` - Target folder
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written (or kept) file
    /// * `Err(HarvestError)` - `RedirectDetected`, `HttpStatus`, `Transient`
    ///   after all attempts, or an IO failure
    pub async fn download_text(
        &self,
        source: &Url,
        query: &[(&str, &str)],
        desired_name: &str,
        folder: &Path,
    ) -> Result<PathBuf, HarvestError> {
        let extension = format!(".{}", TEXT_EXTENSION);
        let filename = format!("{}{}", sanitize_stem(desired_name, &extension), extension);
        let path = folder.join(filename);

        self.save(source, query, folder, path).await
    }

    /// Downloads an image to `<folder>/<name><ext>`
    ///
    /// Name and extension come from the decoded URL path; the query string
    /// never appears in the file name.
    pub async fn download_image(&self, source: &Url, folder: &Path) -> Result<PathBuf, HarvestError> {
        let (stem, extension) = filename_from_url(source)?;
        let filename = format!("{}{}", sanitize_stem(&stem, &extension), extension);
        let path = folder.join(filename);

        self.save(source, &[], folder, path).await
    }

    async fn save(
        &self,
        source: &Url,
        query: &[(&str, &str)],
        folder: &Path,
        path: PathBuf,
    ) -> Result<PathBuf, HarvestError> {
        tokio::fs::create_dir_all(folder).await?;

        if self.existing == ExistingFiles::Skip && tokio::fs::try_exists(&path).await? {
            tracing::debug!("Keeping existing {}", path.display());
            return Ok(path);
        }

        let response = self
            .retry
            .run(|| self.fetcher.fetch(source, query))
            .await?;

        tokio::fs::write(&path, &response.body).await?;
        tracing::debug!(
            "Saved {} ({} bytes) to {}",
            response.url,
            response.body.len(),
            path.display()
        );

        Ok(path)
    }
}
