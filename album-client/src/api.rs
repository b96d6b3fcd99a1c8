//! HTTP binding for the album API.
//!
//! Status interpretation lives in one place, [`error_from_body`]; callers only
//! ever see [`ClientError`].

use std::sync::Arc;
use std::time::Duration;

use album_types::{ErrorBody, ErrorKind, PaginatedPhotos, Photo, PhotoId, PhotosResponse};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// The three queries the client issues.
#[async_trait]
pub trait PhotoApi: Send + Sync {
    /// `GET /photos`, flat catalog.
    async fn fetch_all(&self) -> ClientResult<Vec<Photo>>;

    /// `GET /photos?page=..&limit=..`
    async fn fetch_page(&self, page: u32, limit: u32) -> ClientResult<PaginatedPhotos>;

    /// `GET /photo/{id}`
    async fn fetch_photo(&self, id: PhotoId) -> ClientResult<Photo>;
}

#[async_trait]
impl<T: PhotoApi + ?Sized> PhotoApi for Arc<T> {
    async fn fetch_all(&self) -> ClientResult<Vec<Photo>> {
        (**self).fetch_all().await
    }

    async fn fetch_page(&self, page: u32, limit: u32) -> ClientResult<PaginatedPhotos> {
        (**self).fetch_page(page, limit).await
    }

    async fn fetch_photo(&self, id: PhotoId) -> ClientResult<Photo> {
        (**self).fetch_photo(id).await
    }
}

/// `reqwest`-backed API client.
#[derive(Debug, Clone)]
pub struct HttpPhotoApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPhotoApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> ClientResult<T> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ClientError::Network {
            message: format!("failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl PhotoApi for HttpPhotoApi {
    async fn fetch_all(&self) -> ClientResult<Vec<Photo>> {
        match self.get_json::<PhotosResponse>("/photos").await? {
            PhotosResponse::Flat(photos) => Ok(photos),
            PhotosResponse::Paginated(page) => Ok(page.photos),
        }
    }

    async fn fetch_page(&self, page: u32, limit: u32) -> ClientResult<PaginatedPhotos> {
        self.get_json(&format!("/photos?page={page}&limit={limit}&paginated=true"))
            .await
    }

    async fn fetch_photo(&self, id: PhotoId) -> ClientResult<Photo> {
        self.get_json(&format!("/photo/{id}")).await
    }
}

/// Map a non-2xx response to a typed error, decoding the API envelope when
/// the body carries one.
pub fn error_from_body(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(envelope) => {
            let status = envelope.status_code.unwrap_or(status);
            let message = match envelope.message {
                Some(detail) => format!("{}: {}", envelope.error, detail),
                None => envelope.error,
            };
            ClientError::Api {
                kind: ErrorKind::from_status(status),
                status,
                message,
            }
        }
        Err(_) => ClientError::Status { status },
    }
}
