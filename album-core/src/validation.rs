//! Strict validation of photo identifiers and untrusted text.
//!
//! Unlike pagination parameters, a malformed photo id is always rejected.

use album_types::PhotoId;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhotoIdError {
    #[error("Photo ID is required")]
    Missing,

    #[error("Photo ID must be a valid positive integer")]
    Malformed,

    /// Well-formed, but larger than any id the catalog can hold.
    #[error("Photo ID is out of range")]
    OutOfRange,
}

impl PhotoIdError {
    /// Whether the input itself was unacceptable, as opposed to merely
    /// unknown to the catalog.
    pub fn is_invalid_argument(&self) -> bool {
        !matches!(self, PhotoIdError::OutOfRange)
    }
}

/// Parse a path segment as a photo id: `^[1-9][0-9]*$`.
pub fn parse_photo_id(raw: &str) -> Result<PhotoId, PhotoIdError> {
    let bytes = raw.as_bytes();
    match bytes.first() {
        None => return Err(PhotoIdError::Missing),
        Some(b'1'..=b'9') => {}
        Some(_) => return Err(PhotoIdError::Malformed),
    }
    if !bytes.iter().all(u8::is_ascii_digit) {
        return Err(PhotoIdError::Malformed);
    }

    raw.parse::<u64>()
        .map(PhotoId)
        .map_err(|_| PhotoIdError::OutOfRange)
}

/// Strip anything that looks like an HTML tag.
pub fn sanitize_input(input: &str) -> String {
    static TAG_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));
    TAG_RE.replace_all(input, "").into_owned()
}
