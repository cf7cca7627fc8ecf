use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One stored distance/alert/GPS sample. Immutable once written.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Reading {
    /// Store-assigned, strictly increasing; the recency axis.
    pub id: i64,
    /// Centimetres. `0` means "no reading".
    pub distance: f64,
    pub alert: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub satellites: u32,
    /// Server clock at ingestion.
    pub captured_at: DateTime<Utc>,
}

impl Reading {
    pub fn has_fix(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// A complete GPS fix. Half-pairs are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub satellites: u32,
}

/// A normalized reading ready to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub distance: f64,
    pub alert: bool,
    pub fix: Option<GpsFix>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ImageRecord {
    pub id: i64,
    /// Name of the blob inside the upload directory.
    pub filename: String,
    pub captured_at: DateTime<Utc>,
}
