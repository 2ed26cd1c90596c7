use serde::{Deserialize, Serialize};

/// One harvested book, as stored in the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,

    pub author: String,

    /// Absolute cover image URL
    #[serde(rename = "image")]
    pub image_url: String,

    /// Genre labels in document order
    pub genres: Vec<String>,

    /// Comment texts in document order
    pub comments: Vec<String>,

    /// Detail page this record was parsed from
    #[serde(rename = "book_url")]
    pub source_url: String,

    /// Set only when the text download ran and succeeded
    #[serde(
        rename = "path_to_txt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub text_path: Option<String>,

    /// Set only when the image download ran and succeeded
    #[serde(
        rename = "path_to_img",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_path: Option<String>,
}
