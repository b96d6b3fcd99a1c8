//! Error types for the album client.

use album_types::ErrorKind;

/// Failures talking to the album API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure: connection refused, timeout, DNS.
    #[error("network error: {message}")]
    Network { message: String },

    /// Non-2xx response without a recognizable error body.
    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    /// Non-2xx response carrying the API error envelope.
    #[error("API error ({status}): {message}")]
    Api {
        kind: ErrorKind,
        status: u16,
        message: String,
    },

    /// 2xx response whose body did not match the expected shape.
    #[error("invalid response body: {message}")]
    Decode { message: String },
}

impl ClientError {
    /// The API error class, when the server reported one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Api { kind, .. } => Some(*kind),
            ClientError::Status { status } => Some(ErrorKind::from_status(*status)),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Failures of the durable cache backend. Never fatal to the cache.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage quota exceeded: {size} bytes > {limit} bytes")]
    QuotaExceeded { size: usize, limit: usize },

    #[error("corrupt cache snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),
}
