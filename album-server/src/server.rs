use std::path::Path;
use std::sync::Arc;

use album_core::{normalize_query, paginate, parse_photo_id, sanitize_input, PhotoStore, RuntimeMode};
use album_types::{Photo, PhotosResponse};
use anyhow::{Context, Result};
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

use crate::{
    config::AlbumConfig,
    error::{with_error_handling, ApiError},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PhotoStore>,
    pub mode: RuntimeMode,
}

impl AppState {
    pub fn new(store: PhotoStore, mode: RuntimeMode) -> Self {
        Self {
            store: Arc::new(store),
            mode,
        }
    }
}

pub async fn serve(config: AlbumConfig) -> Result<()> {
    let store = config
        .site
        .load_store()
        .context("Failed to load photo catalog")?;
    info!(photos = store.count(), mode = %config.mode, "photo catalog loaded");

    let state = AppState::new(store, config.mode);
    let app = router(state, &config.public_dir);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "album-server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Build the full application: JSON API, static assets and SPA fallback.
pub fn router(state: AppState, public_dir: &Path) -> Router {
    let mode = state.mode;
    let static_files =
        ServeDir::new(public_dir).fallback(ServeFile::new(public_dir.join("index.html")));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/photos", get(list_photos))
        .route("/photo/{id}", get(get_photo))
        .fallback_service(static_files)
        .with_state(state);

    with_error_handling(app, mode).layer(TraceLayer::new_for_http())
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Listing parameters. A repeated key keeps its first value.
#[derive(Debug, Default)]
pub struct PhotosQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub paginated: Option<String>,
}

impl PhotosQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut query.page,
                "limit" => &mut query.limit,
                "paginated" => &mut query.paginated,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }

    fn wants_pagination(&self) -> bool {
        self.page.is_some() || self.limit.is_some() || self.paginated.as_deref() == Some("true")
    }
}

pub async fn list_photos(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<PhotosResponse> {
    let query = PhotosQuery::from_pairs(pairs);
    if !query.wants_pagination() {
        return Json(PhotosResponse::Flat(state.store.list().to_vec()));
    }

    let params = normalize_query(query.page.as_deref(), query.limit.as_deref());
    debug!(page = params.page, limit = params.limit, "paginated photo listing");
    Json(PhotosResponse::Paginated(paginate(params, state.store.list())))
}

pub async fn get_photo(
    AxumPath(raw_id): AxumPath<String>,
    State(state): State<AppState>,
) -> Result<Json<Photo>, ApiError> {
    let id = parse_photo_id(&raw_id).inspect_err(|err| {
        warn!(id = %sanitize_input(&raw_id), %err, "rejected photo id");
    })?;

    state
        .store
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Photo not found".to_string()))
}
