use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Book-Harvester
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub output: OutputConfig,
    pub download: DownloadConfig,
}

/// Catalog origin configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin serving listing, detail and text pages
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Category code used for listing pages (e.g., "l55")
    pub category: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tululu.org".to_string(),
            category: "l55".to_string(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Connection timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("book-harvester/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

/// Retry behavior for connection failures
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per call, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Fixed pause between attempts, in seconds
    #[serde(rename = "delay-secs")]
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 10,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root folder for downloaded assets and the default corpus location
    #[serde(rename = "dest-folder")]
    pub dest_folder: PathBuf,

    /// Text folder, relative to `dest_folder`
    #[serde(rename = "books-dir")]
    pub books_dir: String,

    /// Image folder, relative to `dest_folder`
    #[serde(rename = "images-dir")]
    pub images_dir: String,

    /// Corpus file; defaults to `<dest_folder>/books.json`
    #[serde(rename = "json-path")]
    pub json_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dest_folder: PathBuf::from("."),
            books_dir: "books".to_string(),
            images_dir: "images".to_string(),
            json_path: None,
        }
    }
}

impl OutputConfig {
    pub fn books_folder(&self) -> PathBuf {
        self.dest_folder.join(&self.books_dir)
    }

    pub fn images_folder(&self) -> PathBuf {
        self.dest_folder.join(&self.images_dir)
    }

    /// Corpus file path: `json-path` when set, else `<dest-folder>/books.json`
    ///
    /// `json-path` names the file itself, not a folder to put it in.
    pub fn corpus_path(&self) -> PathBuf {
        self.json_path
            .clone()
            .unwrap_or_else(|| self.dest_folder.join("books.json"))
    }
}

/// Asset download switches
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Do not download book texts
    #[serde(rename = "skip-txt")]
    pub skip_txt: bool,

    /// Do not download cover images
    #[serde(rename = "skip-imgs")]
    pub skip_imgs: bool,

    /// Keep files that already exist instead of fetching them again
    #[serde(rename = "skip-existing")]
    pub skip_existing: bool,
}

/// Half-open range `[start, end)` of listing pages or book ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Builds a range from raw user input
    ///
    /// A start below 1 becomes 1, and an end not strictly greater than the
    /// start becomes `start + 1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use book_harvester::PageRange;
    ///
    /// let range = PageRange::clamped(0, 1);
    /// assert_eq!((range.start, range.end), (1, 2));
    /// ```
    pub fn clamped(start: i64, end: i64) -> Self {
        let start = start.clamp(1, u32::MAX as i64 - 1);
        let end = if end <= start {
            start + 1
        } else {
            end.min(u32::MAX as i64)
        };

        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    pub fn iter(&self) -> std::ops::Range<u32> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.iter().len()
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}
