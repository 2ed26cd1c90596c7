//! File name validation and sanitizing
//!
//! Names produced here are safe on Linux, macOS and Windows.

/// Characters that are not allowed in a file name on any supported platform
const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Device names Windows refuses as file stems
const RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Longest file name, in bytes, most filesystems accept
pub const MAX_FILENAME_BYTES: usize = 255;

fn is_forbidden(c: char) -> bool {
    FORBIDDEN.contains(&c) || c.is_control()
}

fn is_reserved(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name).trim_end();
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem))
}

/// Returns true if `name` can be used as a file name unchanged
pub fn is_valid_filename(name: &str) -> bool {
    is_valid_within(name, MAX_FILENAME_BYTES)
}

fn is_valid_within(name: &str, limit: usize) -> bool {
    !name.is_empty()
        && name.len() <= limit
        && name != "."
        && name != ".."
        && !name.chars().any(is_forbidden)
        && !name.ends_with(['.', ' '])
        && !is_reserved(name)
}

/// Makes `name` usable as a file name
///
/// Forbidden and control characters become `_`, trailing dots and spaces
/// are dropped, Windows device names get a `_` prefix, and the result is
/// cut to [`MAX_FILENAME_BYTES`] on a character boundary. Valid names are
/// returned unchanged.
///
/// # Examples
///
/// ```
/// use book_harvester::storage::sanitize_filename;
///
/// assert_eq!(sanitize_filename("12. Что делать?"), "12. Что делать_");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    sanitize_within(name, MAX_FILENAME_BYTES)
}

/// Makes `stem` usable as the part of a file name before `extension`
///
/// Same rules as [`sanitize_filename`], except the stem is cut so that
/// `stem + extension` fits in [`MAX_FILENAME_BYTES`]. `extension` includes
/// its leading dot.
///
/// ```
/// use book_harvester::storage::{sanitize_stem, MAX_FILENAME_BYTES};
///
/// let stem = sanitize_stem(&"я".repeat(127), ".txt");
/// assert!(stem.len() + ".txt".len() <= MAX_FILENAME_BYTES);
/// ```
pub fn sanitize_stem(stem: &str, extension: &str) -> String {
    let limit = MAX_FILENAME_BYTES.saturating_sub(extension.len()).max(1);
    sanitize_within(stem, limit)
}

fn sanitize_within(name: &str, limit: usize) -> String {
    if is_valid_within(name, limit) {
        return name.to_string();
    }

    let mut sanitized: String = name
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();

    if sanitized.len() > limit {
        let mut cut = limit;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
    }

    let trimmed = sanitized.trim_end_matches(['.', ' ']);
    let mut sanitized = trimmed.to_string();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_reserved(&sanitized) {
        sanitized.insert(0, '_');
    }

    sanitized
}
