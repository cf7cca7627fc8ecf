use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use utoipa::OpenApi;

use super::{
    dto::{HealthResponse, ImageAccepted, ImageDto, ReadingDto, StatusResponse},
    errors::AppError,
    AppState, Authorized,
};
use crate::{ingest::ReadingSubmission, query::Statistics};

pub const SERVICE_NAME: &str = "Smart Cane GPS";

// ---------------------------------------------------------------------------
// Ingestion (sensor node)
// ---------------------------------------------------------------------------

/// Store one distance/alert/GPS sample.
///
/// The body is parsed as a JSON object whatever the `Content-Type`. Scalars
/// of the wrong type are coerced; a half GPS fix is dropped entirely.
#[utoipa::path(
    post,
    path = "/data",
    request_body(
        content = String,
        content_type = "application/json",
        description = "JSON object with `distance`, `alert` and optional `latitude`, `longitude`, `satellites`"
    ),
    params(
        ("X-API-Key" = String, Header, description = "Shared secret"),
    ),
    responses(
        (status = 200, description = "Reading stored", body = StatusResponse),
        (status = 400, description = "Body is not a JSON object"),
        (status = 403, description = "Missing or invalid API key"),
        (status = 500, description = "Storage unavailable"),
    ),
    tag = "ingest"
)]
pub async fn submit_reading(
    State(state): State<AppState>,
    _auth: Authorized,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<StatusResponse>, AppError> {
    let submission =
        ReadingSubmission::from_slice(&body?).map_err(|e| AppError::BadRequest(e.to_string()))?;
    state.ingest.submit_reading(submission).await?;
    Ok(Json(StatusResponse::new("ok")))
}

/// Store one camera capture, sent either as the multipart field `file` or as
/// the raw request body. Bytes are written verbatim.
#[utoipa::path(
    post,
    path = "/cam",
    request_body(
        content = String,
        content_type = "application/octet-stream",
        description = "Raw JPEG bytes, or a multipart/form-data body with a `file` part"
    ),
    params(
        ("X-API-Key" = String, Header, description = "Shared secret"),
    ),
    responses(
        (status = 200, description = "Image stored", body = ImageAccepted),
        (status = 400, description = "Multipart body without a `file` part"),
        (status = 403, description = "Missing or invalid API key"),
        (status = 413, description = "Body exceeds MAX_UPLOAD_BYTES"),
        (status = 500, description = "Blob directory or storage unavailable"),
    ),
    tag = "ingest"
)]
pub async fn submit_image(
    State(state): State<AppState>,
    _auth: Authorized,
    request: Request,
) -> Result<Json<ImageAccepted>, AppError> {
    let bytes = if is_multipart(request.headers()) {
        file_part(Multipart::from_request(request, &state).await?).await?
    } else {
        Bytes::from_request(request, &state).await?
    };

    let record = state.ingest.submit_image(&bytes).await?;
    Ok(Json(ImageAccepted {
        status: "ok".to_owned(),
        filename: record.filename,
    }))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

async fn file_part(mut multipart: Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            return Ok(field.bytes().await?);
        }
    }
    Err(AppError::BadRequest("multipart body has no `file` part".to_owned()))
}

/// Wipe every reading, every image record and every blob file.
#[utoipa::path(
    post,
    path = "/api/clear",
    params(
        ("X-API-Key" = String, Header, description = "Shared secret"),
    ),
    responses(
        (status = 200, description = "Everything deleted", body = StatusResponse),
        (status = 403, description = "Missing or invalid API key"),
        (status = 500, description = "Storage unavailable"),
    ),
    tag = "admin"
)]
pub async fn clear_all(
    State(state): State<AppState>,
    _auth: Authorized,
) -> Result<Json<StatusResponse>, AppError> {
    state.ingest.clear_all().await?;
    Ok(Json(StatusResponse::new("cleared")))
}

// ---------------------------------------------------------------------------
// Dashboard queries
// ---------------------------------------------------------------------------

/// Latest reading, or a zeroed placeholder with `null` id and timestamp when
/// nothing has been stored yet.
#[utoipa::path(
    get,
    path = "/api/current",
    responses(
        (status = 200, description = "Latest reading", body = ReadingDto),
        (status = 500, description = "Storage unavailable"),
    ),
    tag = "dashboard"
)]
pub async fn get_current(State(state): State<AppState>) -> Result<Json<ReadingDto>, AppError> {
    let current = state.query.current().await?;
    Ok(Json(current.map(Into::into).unwrap_or_else(ReadingDto::empty)))
}

/// Up to 200 most recent readings, newest first.
#[utoipa::path(
    get,
    path = "/api/history",
    responses(
        (status = 200, description = "Recent readings", body = Vec<ReadingDto>),
        (status = 500, description = "Storage unavailable"),
    ),
    tag = "dashboard"
)]
pub async fn get_history(State(state): State<AppState>) -> Result<Json<Vec<ReadingDto>>, AppError> {
    let rows = state.query.history().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Aggregates over the 1000 most recent readings.
#[utoipa::path(
    get,
    path = "/api/statistics",
    responses(
        (status = 200, description = "Window statistics", body = Statistics),
        (status = 500, description = "Storage unavailable"),
    ),
    tag = "dashboard"
)]
pub async fn get_statistics(State(state): State<AppState>) -> Result<Json<Statistics>, AppError> {
    Ok(Json(state.query.statistics().await?))
}

/// Alerting readings among the 1000 most recent, newest first.
#[utoipa::path(
    get,
    path = "/api/alerts",
    responses(
        (status = 200, description = "Alert readings", body = Vec<ReadingDto>),
        (status = 500, description = "Storage unavailable"),
    ),
    tag = "dashboard"
)]
pub async fn get_alerts(State(state): State<AppState>) -> Result<Json<Vec<ReadingDto>>, AppError> {
    let rows = state.query.alerts().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/last-image",
    responses(
        (status = 200, description = "Latest image metadata", body = ImageDto),
        (status = 204, description = "No image stored yet"),
        (status = 500, description = "Storage unavailable"),
    ),
    tag = "dashboard"
)]
pub async fn get_last_image(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(match state.query.latest_image().await? {
        Some(record) => Json(ImageDto::from(record)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Always `200 OK`; `lastUpdate` is the newest reading's capture time.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_owned(),
        service: SERVICE_NAME.to_owned(),
        last_update: state.query.last_update().await,
    })
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        submit_reading,
        submit_image,
        clear_all,
        get_current,
        get_history,
        get_statistics,
        get_alerts,
        get_last_image,
        health,
    ),
    components(schemas(
        ReadingDto,
        ImageDto,
        Statistics,
        StatusResponse,
        ImageAccepted,
        HealthResponse,
    )),
    tags(
        (name = "ingest",    description = "Endpoints used by the sensor node"),
        (name = "dashboard", description = "Read-only dashboard endpoints"),
        (name = "admin",     description = "Administrative endpoints"),
        (name = "system",    description = "System endpoints"),
    ),
    info(
        title = "Smart Cane Telemetry API",
        version = "0.1.0",
        description = "Ingestion and retrieval of obstacle/GPS readings and camera captures"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
