pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    extract::{DefaultBodyLimit, FromRequestParts},
    http::request::Parts,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    auth::AccessGuard,
    blob_store::BlobStore,
    config::Config,
    db::{ImageIndex, ReadingStore},
    ingest::IngestService,
    query::QueryService,
};
use errors::AppError;
use handlers::ApiDoc;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone)]
pub struct AppState {
    pub ingest: IngestService,
    pub query: QueryService,
    pub guard: AccessGuard,
}

impl AppState {
    pub fn new(pool: SqlitePool, blobs: BlobStore, guard: AccessGuard) -> Self {
        let readings = ReadingStore::new(pool.clone());
        let images = ImageIndex::new(pool, blobs.clone());
        Self {
            ingest: IngestService::new(readings.clone(), images.clone(), blobs),
            query: QueryService::new(readings, images),
            guard,
        }
    }
}

/// Proof that the request carried the shared secret. Taking this extractor
/// before the body guarantees a bad key is rejected before any side effect.
#[derive(Debug)]
pub struct Authorized;

impl FromRequestParts<AppState> for Authorized {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        state.guard.verify(provided).map_err(|e| {
            warn!(path = %parts.uri.path(), reason = %e, "Rejected unauthenticated request");
            AppError::from(e)
        })?;
        Ok(Authorized)
    }
}

pub fn router(pool: SqlitePool, config: &Config) -> Router {
    let blobs = BlobStore::new(&config.upload_dir);
    let uploads = ServeDir::new(blobs.dir());
    let state = AppState::new(pool, blobs, AccessGuard::new(&config.api_key));

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/data", post(handlers::submit_reading))
        .route("/cam", post(handlers::submit_image))
        .route("/api/current", get(handlers::get_current))
        .route("/api/history", get(handlers::get_history))
        .route("/api/statistics", get(handlers::get_statistics))
        .route("/api/alerts", get(handlers::get_alerts))
        .route("/api/last-image", get(handlers::get_last_image))
        .route("/api/clear", post(handlers::clear_all))
        .route("/health", get(handlers::health))
        .with_state(state)
        .split_for_parts();

    router
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}
