use chrono::Utc;
use tracing::info;

use super::submission::ReadingSubmission;
use crate::{
    blob_store::BlobStore,
    db::{
        models::{ImageRecord, Reading},
        ImageIndex, ReadingStore,
    },
    error::Result,
};

/// Write side of the service: everything the sensor node sends, plus the
/// administrative bulk clear.
#[derive(Debug, Clone)]
pub struct IngestService {
    readings: ReadingStore,
    images: ImageIndex,
    blobs: BlobStore,
}

impl IngestService {
    pub fn new(readings: ReadingStore, images: ImageIndex, blobs: BlobStore) -> Self {
        Self { readings, images, blobs }
    }

    /// Normalize `submission`, stamp it with the server clock and append it.
    /// Any client-supplied timestamp is ignored.
    pub async fn submit_reading(&self, submission: ReadingSubmission) -> Result<Reading> {
        let reading = self.readings.append(&submission.normalize(Utc::now())).await?;

        match (reading.latitude, reading.longitude) {
            (Some(lat), Some(lon)) => info!(
                id = reading.id,
                distance_cm = reading.distance,
                alert = reading.alert,
                lat,
                lon,
                satellites = reading.satellites,
                "Reading stored"
            ),
            _ => info!(
                id = reading.id,
                distance_cm = reading.distance,
                alert = reading.alert,
                "Reading stored without GPS fix"
            ),
        }
        Ok(reading)
    }

    /// Write `bytes` to the blob directory, then record its metadata.
    ///
    /// The two steps are not atomic. The row is only appended once the file
    /// is on disk; a crash in between leaves an orphan file behind.
    pub async fn submit_image(&self, bytes: &[u8]) -> Result<ImageRecord> {
        let captured_at = Utc::now();
        let filename = self.blobs.write_capture(captured_at, bytes).await?;
        let record = self.images.append(&filename, captured_at).await?;

        info!(id = record.id, filename = %record.filename, bytes = bytes.len(), "Image stored");
        Ok(record)
    }

    /// Empty both logs and delete every blob. Irreversible.
    pub async fn clear_all(&self) -> Result<()> {
        let readings = self.readings.clear().await?;
        let images = self.images.clear().await?;

        info!(readings, images, "All telemetry cleared");
        Ok(())
    }
}
