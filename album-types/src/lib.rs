//! Shared types for photo-album
//!
//! Wire-level records exchanged between the album server and its clients:
//! photos, pagination metadata and the error envelope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Photo identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub u64);

impl PhotoId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for PhotoId {
    fn from(id: u64) -> Self {
        PhotoId(id)
    }
}

impl From<PhotoId> for u64 {
    fn from(id: PhotoId) -> Self {
        id.0
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    /// Relative path of the image, e.g. `/images/moon.png`
    pub url: String,
}

impl Photo {
    pub fn new(id: impl Into<PhotoId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Normalized pagination request. Only ever built through validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: u32,
    pub limit: u32,
}

/// Metadata describing one page of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: usize,
    pub has_more: bool,
    pub has_previous: bool,
}

/// Body of a paginated `GET /photos` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedPhotos {
    pub photos: Vec<Photo>,
    pub pagination: PaginationMeta,
}

/// Body of `GET /photos`: flat when no pagination parameter was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhotosResponse {
    Paginated(PaginatedPhotos),
    Flat(Vec<Photo>),
}

/// Error classes surfaced by the HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::InvalidArgument => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    /// Classify an HTTP status. Anything that is not 400/404 counts as internal.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::InvalidArgument,
            404 => ErrorKind::NotFound,
            _ => ErrorKind::Internal,
        }
    }
}

/// JSON error envelope returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    /// Internal detail; only populated in development mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ErrorBody {
    pub fn new(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            status_code: Some(kind.status_code()),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.status_code.map(ErrorKind::from_status)
    }
}
