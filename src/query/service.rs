use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::stats::Statistics;
use crate::{
    db::{
        models::{ImageRecord, Reading},
        ImageIndex, ReadingStore,
    },
    error::Result,
};

/// Readings returned by the history view.
pub const HISTORY_LIMIT: NonZeroU32 = nonzero(200);
/// Readings considered by the alert list and the statistics.
pub const ANALYSIS_WINDOW: NonZeroU32 = nonzero(1000);

const fn nonzero(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(n) => n,
        None => panic!("window must be positive"),
    }
}

/// Read side for the dashboard. Nothing is cached: every call re-reads the
/// stores.
#[derive(Debug, Clone)]
pub struct QueryService {
    readings: ReadingStore,
    images: ImageIndex,
}

impl QueryService {
    pub fn new(readings: ReadingStore, images: ImageIndex) -> Self {
        Self { readings, images }
    }

    pub async fn current(&self) -> Result<Option<Reading>> {
        self.readings.latest().await
    }

    pub async fn history(&self) -> Result<Vec<Reading>> {
        self.readings.recent(HISTORY_LIMIT).await
    }

    /// Alerting readings from the analysis window, newest first.
    pub async fn alerts(&self) -> Result<Vec<Reading>> {
        let window = self.readings.recent(ANALYSIS_WINDOW).await?;
        Ok(window.into_iter().filter(|r| r.alert).collect())
    }

    pub async fn statistics(&self) -> Result<Statistics> {
        let window = self.readings.recent(ANALYSIS_WINDOW).await?;
        Ok(Statistics::from_window(&window))
    }

    pub async fn latest_image(&self) -> Result<Option<ImageRecord>> {
        self.images.latest().await
    }

    /// Capture time of the newest reading. Used by the liveness probe, so a
    /// storage failure is logged and reported as "unknown" instead of failing.
    pub async fn last_update(&self) -> Option<DateTime<Utc>> {
        match self.readings.latest().await {
            Ok(latest) => latest.map(|r| r.captured_at),
            Err(e) => {
                warn!(error = %e, "Health check could not read latest reading");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        blob_store::BlobStore,
        db::{models::NewReading, test_pool},
    };

    async fn seeded(rows: &[(f64, bool)]) -> (QueryService, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let pool = test_pool().await;
        let readings = ReadingStore::new(pool.clone());
        for (distance, alert) in rows {
            readings
                .append(&NewReading {
                    distance: *distance,
                    alert: *alert,
                    fix: None,
                    captured_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
                })
                .await
                .unwrap();
        }
        let images = ImageIndex::new(pool, BlobStore::new(tmp.path()));
        (QueryService::new(readings, images), tmp)
    }

    #[tokio::test]
    async fn alerts_are_history_filtered_newest_first() {
        let (svc, _tmp) =
            seeded(&[(10.0, true), (20.0, false), (30.0, true), (40.0, false), (50.0, true)]).await;

        let alerts = svc.alerts().await.unwrap();
        let distances: Vec<f64> = alerts.iter().map(|r| r.distance).collect();
        assert_eq!(distances, vec![50.0, 30.0, 10.0]);

        let from_history: Vec<Reading> =
            svc.history().await.unwrap().into_iter().filter(|r| r.alert).collect();
        assert_eq!(alerts, from_history);
    }

    #[tokio::test]
    async fn history_is_capped() {
        let rows: Vec<(f64, bool)> = (1..=205).map(|i| (i as f64, false)).collect();
        let (svc, _tmp) = seeded(&rows).await;

        let history = svc.history().await.unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT.get() as usize);
        assert_eq!(history[0].distance, 205.0);
    }

    #[tokio::test]
    async fn statistics_over_stored_window() {
        let (svc, _tmp) = seeded(&[(0.0, false), (10.0, true), (20.0, false)]).await;
        let stats = svc.statistics().await.unwrap();
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.total_alerts, 1);
        assert_eq!(stats.min_distance, Some(10.0));
        assert_eq!(stats.max_distance, Some(20.0));
        assert_eq!(stats.mean_distance, Some(15.0));
    }

    #[tokio::test]
    async fn last_update_is_none_when_empty() {
        let (svc, _tmp) = seeded(&[]).await;
        assert!(svc.current().await.unwrap().is_none());
        assert!(svc.last_update().await.is_none());
    }
}
