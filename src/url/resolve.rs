use url::Url;

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use book_harvester::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://tululu.org/l55/2/").unwrap();
/// let link = resolve_link("/b239/", &base).unwrap();
/// assert_eq!(link.as_str(), "https://tululu.org/b239/");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url)
        }
        _ => None,
    }
}

/// Extracts a book id from a detail page URL
///
/// The id is the first run of ASCII digits in the URL path, so `/b239/`
/// yields 239. Host and query are ignored.
pub fn extract_book_id(url: &Url) -> Option<u64> {
    let path = url.path();
    let start = path.find(|c: char| c.is_ascii_digit())?;
    let digits: String = path[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse().ok()
}
