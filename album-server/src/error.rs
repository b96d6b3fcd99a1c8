//! API error taxonomy and the centralized response mapper.
//!
//! Handlers return [`ApiError`]; its `IntoResponse` impl always produces the
//! production-safe JSON envelope. The [`error_envelope`] middleware runs
//! around every route and, in development mode only, re-renders internal
//! errors with their detail attached.

use std::any::Any;

use album_core::{PhotoIdError, RuntimeMode};
use album_types::{ErrorBody, ErrorKind};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

const INTERNAL_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Message safe to show any client.
    fn public_message(&self) -> String {
        match self {
            ApiError::InvalidArgument(msg) | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl From<PhotoIdError> for ApiError {
    fn from(err: PhotoIdError) -> Self {
        if err.is_invalid_argument() {
            ApiError::InvalidArgument(err.to_string())
        } else {
            ApiError::NotFound("Photo not found".to_string())
        }
    }
}

/// Internal error detail, attached to the response for [`error_envelope`].
#[derive(Debug, Clone)]
struct ErrorDetail(String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let body = ErrorBody::new(kind, self.public_message());
        let mut response = (self.status(), Json(body)).into_response();

        if let ApiError::Internal(err) = &self {
            error!(error = %format!("{err:#}"), "internal error while handling request");
            response
                .extensions_mut()
                .insert(ErrorDetail(format!("{err:#}")));
        }

        response
    }
}

/// Adds internal error detail to the envelope when the mode allows it.
pub async fn error_envelope(
    State(mode): State<RuntimeMode>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !mode.exposes_error_details() {
        return response;
    }

    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let status = response.status();
    let mut body = ErrorBody::new(ErrorKind::from_status(status.as_u16()), INTERNAL_MESSAGE);
    body.message = Some(detail);
    (status, Json(body)).into_response()
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::Internal(anyhow::anyhow!(detail)).into_response()
}

/// Wrap a router so every failure, panics included, leaves as an
/// [`ErrorBody`].
pub fn with_error_handling(router: Router, mode: RuntimeMode) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(mode, error_envelope))
}
