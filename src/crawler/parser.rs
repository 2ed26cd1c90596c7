//! HTML parser for catalog pages
//!
//! Every structural assumption about the origin's markup lives here:
//! - Detail pages: heading, genre list, comment blocks, cover image
//! - Listing pages: book thumbnail links, page-count control
//!
//! A markup change upstream therefore shows up in one place.

use crate::crawler::record::BookRecord;
use crate::url::resolve_link;
use crate::HarvestError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Separator between title and author in the detail page heading
pub const TITLE_AUTHOR_DELIMITER: &str = "::";

const HEADING: &str = "h1";
const GENRE_LIST: &str = "span.d_book";
const GENRE_LINK: &str = "a";
const COMMENT_BLOCK: &str = "div.texts";
const COMMENT_TEXT: &str = "span";
const COVER_IMAGE: &str = "div.bookimage img";
const BOOK_THUMBNAIL_LINK: &str = "table.d_book div.bookimage a";
const PAGE_NUMBER: &str = "#content .center .npage";

fn selector(css: &str) -> Result<Selector, HarvestError> {
    Selector::parse(css).map_err(|e| HarvestError::MalformedPage {
        url: String::new(),
        message: format!("invalid selector {}: {:?}", css, e),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Parses a book detail page into a record
///
/// # Extraction Rules
///
/// | Field | Source |
/// |-------|--------|
/// | title, author | the single `<h1>`, split on `::`, trimmed |
/// | genres | anchors of the first `span.d_book` |
/// | comments | first `span` of each `div.texts` |
/// | image | `src` of `div.bookimage img`, resolved against `detail_url` |
///
/// The paths of downloaded assets are left unset.
///
/// # Arguments
///
/// * `html` - The detail page HTML
/// * `detail_url` - The URL the page was fetched from, used as the base for the cover image
///
/// # Returns
///
/// * `Ok(BookRecord)` - Successfully parsed record
/// * `Err(HarvestError::MalformedPage)` - Missing or ambiguous heading, heading
///   without exactly one non-empty title and author, or no cover image
///
/// # Example
///
/// ```
/// use book_harvester::crawler::parse_book_page;
/// use url::Url;
///
/// let html = r#"<html><body><h1>Foo :: Bar</h1>
///     <div class="bookimage"><img src="/shots/1.jpg"></div></body></html>"#;
/// let url = Url::parse("https://tululu.org/b1/").unwrap();
/// let book = parse_book_page(html, &url).unwrap();
/// assert_eq!(book.title, "Foo");
/// assert_eq!(book.author, "Bar");
/// ```
pub fn parse_book_page(html: &str, detail_url: &Url) -> Result<BookRecord, HarvestError> {
    let document = Html::parse_document(html);

    let (title, author) = extract_title_and_author(&document, detail_url)?;
    let genres = extract_genres(&document)?;
    let comments = extract_comments(&document)?;
    let image_url = extract_cover_url(&document, detail_url)?;

    if genres.is_empty() && comments.is_empty() {
        tracing::warn!(
            "No genres and no comments on {}; the page layout may have changed",
            detail_url
        );
    }

    Ok(BookRecord {
        title,
        author,
        image_url: image_url.to_string(),
        genres,
        comments,
        source_url: detail_url.to_string(),
        text_path: None,
        image_path: None,
    })
}

fn extract_title_and_author(
    document: &Html,
    detail_url: &Url,
) -> Result<(String, String), HarvestError> {
    let heading_selector = selector(HEADING)?;
    let headings: Vec<ElementRef<'_>> = document.select(&heading_selector).collect();

    let heading = match headings.as_slice() {
        [heading] => element_text(*heading),
        [] => return Err(HarvestError::malformed(detail_url, "no heading found")),
        _ => {
            return Err(HarvestError::malformed(
                detail_url,
                format!("expected one heading, found {}", headings.len()),
            ))
        }
    };

    let parts: Vec<&str> = heading.split(TITLE_AUTHOR_DELIMITER).map(str::trim).collect();
    match parts.as_slice() {
        [title, author] if !title.is_empty() && !author.is_empty() => {
            Ok((title.to_string(), author.to_string()))
        }
        _ => Err(HarvestError::malformed(
            detail_url,
            format!(
                "heading {:?} is not '<title> {} <author>'",
                heading.trim(),
                TITLE_AUTHOR_DELIMITER
            ),
        )),
    }
}

fn extract_genres(document: &Html) -> Result<Vec<String>, HarvestError> {
    let list_selector = selector(GENRE_LIST)?;
    let link_selector = selector(GENRE_LINK)?;

    Ok(document
        .select(&list_selector)
        .next()
        .map(|list| list.select(&link_selector).map(element_text).collect())
        .unwrap_or_default())
}

fn extract_comments(document: &Html) -> Result<Vec<String>, HarvestError> {
    let block_selector = selector(COMMENT_BLOCK)?;
    let text_selector = selector(COMMENT_TEXT)?;

    Ok(document
        .select(&block_selector)
        .filter_map(|block| block.select(&text_selector).next())
        .map(element_text)
        .collect())
}

fn extract_cover_url(document: &Html, detail_url: &Url) -> Result<Url, HarvestError> {
    let image_selector = selector(COVER_IMAGE)?;

    let src = document
        .select(&image_selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .ok_or_else(|| HarvestError::malformed(detail_url, "no cover image found"))?;

    resolve_link(src, detail_url).ok_or_else(|| {
        HarvestError::malformed(detail_url, format!("unusable cover image src {:?}", src))
    })
}

/// Extracts book detail links from a category listing page
///
/// Links are resolved against `listing_url` and kept in document order.
/// A page without thumbnails yields an empty vector.
pub fn extract_book_links(html: &str, listing_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(link_selector) = selector(BOOK_THUMBNAIL_LINK) else {
        return Vec::new();
    };

    document
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(href, listing_url))
        .collect()
}

/// Extracts the last page number from a listing page's page-count control
///
/// Returns None when the control is absent or its last label is not a number.
pub fn extract_last_page(html: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    let page_selector = selector(PAGE_NUMBER).ok()?;

    document
        .select(&page_selector)
        .last()
        .and_then(|label| element_text(label).trim().parse().ok())
}
