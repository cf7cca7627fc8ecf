use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use super::models::ImageRecord;
use crate::{blob_store::BlobStore, error::Result};

/// Append-only log of captured-image metadata. The bytes themselves live in
/// the [`BlobStore`]; this index only records which blob names exist.
#[derive(Debug, Clone)]
pub struct ImageIndex {
    pool: SqlitePool,
    blobs: BlobStore,
}

impl ImageIndex {
    pub fn new(pool: SqlitePool, blobs: BlobStore) -> Self {
        Self { pool, blobs }
    }

    pub async fn append(&self, filename: &str, captured_at: DateTime<Utc>) -> Result<ImageRecord> {
        let row = sqlx::query_as::<_, ImageRecord>(
            r#"
            INSERT INTO images (filename, captured_at)
            VALUES (?, ?)
            RETURNING id, filename, captured_at
            "#,
        )
        .bind(filename)
        .bind(captured_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn latest(&self) -> Result<Option<ImageRecord>> {
        let row = sqlx::query_as::<_, ImageRecord>(
            "SELECT id, filename, captured_at FROM images ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Delete all metadata rows, then every blob file in the directory.
    pub async fn clear(&self) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM images")
            .execute(&self.pool)
            .await?
            .rows_affected();
        let files = self.blobs.clear().await?;

        info!(rows, files, "Image index cleared");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn latest_is_none_when_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let index = ImageIndex::new(test_pool().await, BlobStore::new(tmp.path()));
        assert!(index.latest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_returns_last_appended() {
        let tmp = tempfile::tempdir().unwrap();
        let index = ImageIndex::new(test_pool().await, BlobStore::new(tmp.path()));
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();

        let a = index.append("a.jpg", at).await.unwrap();
        let b = index.append("b.jpg", at).await.unwrap();
        assert!(b.id > a.id);

        let latest = index.latest().await.unwrap().unwrap();
        assert_eq!(latest, b);
        assert_eq!(latest.filename, "b.jpg");
    }

    #[tokio::test]
    async fn clear_removes_rows_and_blob_files() {
        let tmp = tempfile::tempdir().unwrap();
        let blobs = BlobStore::new(tmp.path());
        let index = ImageIndex::new(test_pool().await, blobs.clone());

        let at = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let name = blobs.write_capture(at, b"jpeg").await.unwrap();
        index.append(&name, at).await.unwrap();

        assert_eq!(index.clear().await.unwrap(), 1);
        assert!(index.latest().await.unwrap().is_none());
        assert!(!tmp.path().join(&name).exists());
    }
}
