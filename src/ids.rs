//! Identifier validation and extraction.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ReportError, Result};

static FILE_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:drive|docs)\.google\.com/(?:file|spreadsheets|document)/d/([a-zA-Z0-9_-]+)")
        .expect("Invalid file URL regex")
});

static OPEN_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/open\?id=([a-zA-Z0-9_-]+)")
        .expect("Invalid open URL regex")
});

/// Account, property, view, report and file IDs (e.g. `296593`, `UA-296593-56`).
static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.~-]+$").expect("Invalid ID regex"));

/// Editor-native Drive documents with no binary content.
static NATIVE_DOCUMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"google-apps").expect("Invalid mime type regex"));

/// Check that `value` can be placed in a resource path.
///
/// `kind` names the identifier in the error message.
pub fn validate_id<'a>(kind: &str, value: &'a str) -> Result<&'a str> {
    if ID_REGEX.is_match(value) {
        Ok(value)
    } else {
        Err(ReportError::QueryConstruction(format!(
            "invalid {} id: {:?}",
            kind, value
        )))
    }
}

/// Extract a Google Drive file ID from a URL or validate a raw ID.
///
/// Supports the following formats:
/// - `https://drive.google.com/file/d/<ID>/view`
/// - `https://docs.google.com/spreadsheets/d/<ID>/edit`
/// - `https://drive.google.com/open?id=<ID>`
/// - Raw ID string
///
/// # Examples
///
/// ```
/// use ga_reports::ids::extract_file_id;
///
/// let id = extract_file_id("https://drive.google.com/file/d/1abc123/view").unwrap();
/// assert_eq!(id, "1abc123");
///
/// let id = extract_file_id("1abc123").unwrap();
/// assert_eq!(id, "1abc123");
/// ```
pub fn extract_file_id(url_or_id: &str) -> Result<String> {
    let trimmed = url_or_id.trim();

    for regex in [&*FILE_URL_REGEX, &*OPEN_URL_REGEX] {
        if let Some(id) = regex.captures(trimmed).and_then(|c| c.get(1)) {
            return Ok(id.as_str().to_string());
        }
    }

    validate_id("file", trimmed).map(str::to_string)
}

/// Whether a Drive mime type marks an editor-native document.
pub fn is_native_document(mime_type: &str) -> bool {
    NATIVE_DOCUMENT_REGEX.is_match(mime_type)
}
