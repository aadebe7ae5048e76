use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::key::ResolutionKey;

/// A remote transcription service.
///
/// One `fetch` is one logical call; implementations own their credentials,
/// their timeout and any retry policy. A cancelled token must end the call
/// with [`ProviderError::Cancelled`].
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(
        &self,
        key: &ResolutionKey,
        cancel: &CancellationToken,
    ) -> Result<Bytes, ProviderError>;
}
