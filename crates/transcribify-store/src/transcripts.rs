use async_trait::async_trait;
use chrono::Utc;
use rusqlite::OptionalExtension;
use tracing::{debug, instrument};

use transcribify_core::{ResolutionKey, StoreError, TranscriptStore};

use crate::database::{db_err, Database};

/// `video_data` rows: one JSON blob per (video id, language).
///
/// Writes are last-write-wins: `put` on an existing key replaces the blob
/// and keeps the row id, so two racing resolutions of the same key both
/// succeed and the cache ends up holding one of their results.
#[derive(Clone)]
pub struct TranscriptRepo {
    db: Database,
}

impl TranscriptRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(key = %key))]
    pub fn get_blob(&self, key: &ResolutionKey) -> Result<Option<String>, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT json_data FROM video_data WHERE video_id = ?1 AND language = ?2",
                [key.video_id(), key.language()],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)
        })
    }

    /// Upsert, returning the row id.
    #[instrument(skip(self, blob), fields(key = %key, bytes = blob.len()))]
    pub fn put_blob(&self, key: &ResolutionKey, blob: &str) -> Result<i64, StoreError> {
        let now = Utc::now().to_rfc3339();
        let id = self.db.with_conn(|conn| {
            conn.query_row(
                "INSERT INTO video_data (video_id, language, json_data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT (video_id, language)
                 DO UPDATE SET json_data = excluded.json_data, updated_at = excluded.updated_at
                 RETURNING id",
                rusqlite::params![key.video_id(), key.language(), blob, now],
                |row| row.get(0),
            )
            .map_err(db_err)
        })?;
        debug!(id, "transcript stored");
        Ok(id)
    }

    /// Replace the blob of an existing entry.
    #[instrument(skip(self, blob), fields(key = %key))]
    pub fn update_blob(&self, key: &ResolutionKey, blob: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE video_data SET json_data = ?1, updated_at = ?2
                 WHERE video_id = ?3 AND language = ?4",
                rusqlite::params![blob, now, key.video_id(), key.language()],
            )
            .map_err(db_err)
        })?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("transcript {key}")));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key))]
    pub fn delete(&self, key: &ResolutionKey) -> Result<(), StoreError> {
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM video_data WHERE video_id = ?1 AND language = ?2",
                [key.video_id(), key.language()],
            )
            .map_err(db_err)
        })?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("transcript {key}")));
        }
        Ok(())
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM video_data", [], |row| row.get(0))
                .map_err(db_err)
        })
    }

    /// Run a blocking repo call off the async runtime.
    async fn blocking<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(TranscriptRepo) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let repo = self.clone();
        tokio::task::spawn_blocking(move || f(repo))
            .await
            .map_err(|e| StoreError::Database(format!("store task failed: {e}")))?
    }
}

#[async_trait]
impl TranscriptStore for TranscriptRepo {
    async fn get(&self, key: &ResolutionKey) -> Result<Option<String>, StoreError> {
        let key = key.clone();
        self.blocking(move |repo| repo.get_blob(&key)).await
    }

    async fn put(&self, key: &ResolutionKey, blob: &str) -> Result<i64, StoreError> {
        let key = key.clone();
        let blob = blob.to_owned();
        self.blocking(move |repo| repo.put_blob(&key, &blob)).await
    }
}
