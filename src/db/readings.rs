use std::num::NonZeroU32;

use sqlx::SqlitePool;

use super::models::{NewReading, Reading};
use crate::error::Result;

/// Append-only log of sensor readings, ordered by `id`.
///
/// Each method is a single statement, so it is atomic on its own; nothing
/// here spans more than one call.
#[derive(Debug, Clone)]
pub struct ReadingStore {
    pool: SqlitePool,
}

impl ReadingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert `reading` and return the stored row with its assigned `id`.
    pub async fn append(&self, reading: &NewReading) -> Result<Reading> {
        let (latitude, longitude, satellites) = match reading.fix {
            Some(fix) => (Some(fix.latitude), Some(fix.longitude), fix.satellites),
            None => (None, None, 0),
        };

        let row = sqlx::query_as::<_, Reading>(
            r#"
            INSERT INTO readings
                (distance, alert, latitude, longitude, satellites, captured_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, distance, alert, latitude, longitude, satellites, captured_at
            "#,
        )
        .bind(reading.distance)
        .bind(reading.alert)
        .bind(latitude)
        .bind(longitude)
        .bind(satellites)
        .bind(reading.captured_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Most recently appended reading, if any.
    pub async fn latest(&self) -> Result<Option<Reading>> {
        let row = sqlx::query_as::<_, Reading>(
            r#"
            SELECT id, distance, alert, latitude, longitude, satellites, captured_at
            FROM readings
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Up to `limit` readings, newest first.
    pub async fn recent(&self, limit: NonZeroU32) -> Result<Vec<Reading>> {
        let rows = sqlx::query_as::<_, Reading>(
            r#"
            SELECT id, distance, alert, latitude, longitude, satellites, captured_at
            FROM readings
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete every reading. Returns the number of rows removed.
    pub async fn clear(&self) -> Result<u64> {
        let done = sqlx::query("DELETE FROM readings")
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}
