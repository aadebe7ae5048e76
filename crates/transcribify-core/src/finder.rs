use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::FinderError;
use crate::key::ResolutionKey;
use crate::record::TranscriptRecord;

#[derive(Clone, Debug, PartialEq)]
pub enum FindOutcome {
    Hit(TranscriptRecord),
    /// This source has no answer; the next finder should be tried.
    NotFound,
}

/// A single source a transcript can be resolved from.
#[async_trait]
pub trait Finder: Send + Sync {
    fn name(&self) -> &str;

    async fn resolve(
        &self,
        key: &ResolutionKey,
        cancel: &CancellationToken,
    ) -> Result<FindOutcome, FinderError>;
}
