use async_trait::async_trait;

use crate::errors::StoreError;
use crate::key::ResolutionKey;

/// Durable key → blob map for resolved transcripts.
///
/// The store never looks inside the blob. `put` on an existing key must be
/// tolerated: concurrent resolutions of the same key may both write.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// `Ok(None)` is a miss, not an error.
    async fn get(&self, key: &ResolutionKey) -> Result<Option<String>, StoreError>;

    /// Returns the row id the blob was written to.
    async fn put(&self, key: &ResolutionKey, blob: &str) -> Result<i64, StoreError>;
}
