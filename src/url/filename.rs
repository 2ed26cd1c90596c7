use crate::{UrlError, UrlResult};
use url::Url;

/// Derives a file stem and extension from the path of a URL
///
/// The path is percent-decoded (`+` counts as a space), the query string and
/// fragment are ignored, and the last path segment is split at its final dot.
/// The extension keeps its leading dot and is empty when the segment has
/// none. Leading dots of the segment never start an extension.
///
/// # Examples
///
/// ```
/// use book_harvester::url::filename_from_url;
/// use url::Url;
///
/// let url = Url::parse("https://tululu.org/shots/%D0%BA%D0%BD%D0%B8%D0%B3%D0%B0.jpg?v=2").unwrap();
/// let (stem, ext) = filename_from_url(&url).unwrap();
/// assert_eq!(stem, "книга");
/// assert_eq!(ext, ".jpg");
/// ```
pub fn filename_from_url(url: &Url) -> UrlResult<(String, String)> {
    let raw = url.path().replace('+', " ");
    let decoded = match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned(),
    };

    let segment = decoded.rsplit('/').next().unwrap_or_default();
    let leading_dots = segment.len() - segment.trim_start_matches('.').len();

    let (stem, extension) = match segment[leading_dots..].rfind('.') {
        Some(dot) => segment.split_at(leading_dots + dot),
        None => (segment, ""),
    };

    if stem.is_empty() {
        return Err(UrlError::NoFileName(url.to_string()));
    }

    Ok((stem.to_string(), extension.to_string()))
}
