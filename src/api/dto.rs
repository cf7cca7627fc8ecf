use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::{ImageRecord, Reading};

/// A reading as the dashboard sees it. Missing GPS is rendered as explicit
/// `null` coordinates rather than omitted fields.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadingDto {
    /// `null` only for the empty-store placeholder.
    pub id: Option<i64>,
    /// Centimetres; `0` means no reading
    pub distance: f64,
    pub alert: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub satellites: u32,
    /// `null` only for the empty-store placeholder.
    pub captured_at: Option<DateTime<Utc>>,
}

impl ReadingDto {
    /// Placeholder served by `/api/current` before anything was stored.
    pub fn empty() -> Self {
        Self {
            id: None,
            distance: 0.0,
            alert: false,
            latitude: None,
            longitude: None,
            satellites: 0,
            captured_at: None,
        }
    }
}

impl From<Reading> for ReadingDto {
    fn from(r: Reading) -> Self {
        Self {
            id: Some(r.id),
            distance: r.distance,
            alert: r.alert,
            latitude: r.latitude,
            longitude: r.longitude,
            satellites: r.satellites,
            captured_at: Some(r.captured_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageDto {
    pub id: i64,
    /// Blob name, fetchable under `/uploads/{filename}`
    pub filename: String,
    pub captured_at: DateTime<Utc>,
}

impl From<ImageRecord> for ImageDto {
    fn from(r: ImageRecord) -> Self {
        Self {
            id: r.id,
            filename: r.filename,
            captured_at: r.captured_at,
        }
    }
}

/// Plain acknowledgement, e.g. `{"status":"ok"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: &str) -> Self {
        Self { status: status.to_owned() }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageAccepted {
    pub status: String,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    /// Capture time of the newest reading, `null` when none is known.
    pub last_update: Option<DateTime<Utc>>,
}
