use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use transcribify_core::{
    FindOutcome, Finder, FinderError, ResolutionKey, StoreError, TranscriptProvider,
    TranscriptRecord, TranscriptStore,
};

/// Answers from the local cache. Read-only.
pub struct StoreFinder {
    store: Arc<dyn TranscriptStore>,
}

impl StoreFinder {
    pub fn new(store: Arc<dyn TranscriptStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Finder for StoreFinder {
    fn name(&self) -> &str {
        "store"
    }

    #[instrument(skip(self, cancel), fields(key = %key))]
    async fn resolve(
        &self,
        key: &ResolutionKey,
        cancel: &CancellationToken,
    ) -> Result<FindOutcome, FinderError> {
        let blob = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StoreError::Cancelled.into()),
            blob = self.store.get(key) => blob?,
        };

        match blob {
            Some(blob) => Ok(FindOutcome::Hit(TranscriptRecord::from_store_blob(
                key, &blob,
            )?)),
            None => Ok(FindOutcome::NotFound),
        }
    }
}

/// Fetches from the remote provider and writes the result through to the
/// store before handing it back.
///
/// Never reports `NotFound`: the provider has no way to say "no transcript",
/// so anything short of a decoded record is an error.
pub struct ProviderFinder {
    provider: Arc<dyn TranscriptProvider>,
    store: Arc<dyn TranscriptStore>,
}

impl ProviderFinder {
    pub fn new(provider: Arc<dyn TranscriptProvider>, store: Arc<dyn TranscriptStore>) -> Self {
        Self { provider, store }
    }

    /// A failed write leaves the cache cold but does not fail the request.
    async fn persist(&self, key: &ResolutionKey, record: &TranscriptRecord) {
        let written = match record.to_store_blob() {
            Ok(blob) => self.store.put(key, &blob).await,
            Err(e) => Err(e),
        };
        match written {
            Ok(id) => debug!(key = %key, id, "transcript cached"),
            Err(e) => warn!(
                key = %key,
                error = %e,
                error_kind = e.error_kind(),
                "failed to cache transcript"
            ),
        }
    }
}

#[async_trait]
impl Finder for ProviderFinder {
    fn name(&self) -> &str {
        "provider"
    }

    #[instrument(skip(self, cancel), fields(key = %key, provider = self.provider.name()))]
    async fn resolve(
        &self,
        key: &ResolutionKey,
        cancel: &CancellationToken,
    ) -> Result<FindOutcome, FinderError> {
        let body = self.provider.fetch(key, cancel).await?;
        let record = TranscriptRecord::from_provider_body(&body)?;
        self.persist(key, &record).await;
        Ok(FindOutcome::Hit(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transcribify_core::{Cue, ProviderError};
    use transcribify_provider::{MockProvider, MockResponse};
    use transcribify_store::{Database, TranscriptRepo};

    /// Store whose reads and/or writes always fail.
    struct FailingStore {
        fail_get: bool,
        fail_put: bool,
    }

    #[async_trait]
    impl TranscriptStore for FailingStore {
        async fn get(&self, _key: &ResolutionKey) -> Result<Option<String>, StoreError> {
            if self.fail_get {
                Err(StoreError::Pool("timed out waiting for connection".into()))
            } else {
                Ok(None)
            }
        }

        async fn put(&self, _key: &ResolutionKey, _blob: &str) -> Result<i64, StoreError> {
            if self.fail_put {
                Err(StoreError::Database("disk I/O error".into()))
            } else {
                Ok(1)
            }
        }
    }

    fn key() -> ResolutionKey {
        ResolutionKey::new("dQw4w9WgXcQ", "en").unwrap()
    }

    fn repo() -> Arc<TranscriptRepo> {
        Arc::new(TranscriptRepo::new(Database::in_memory().unwrap()))
    }

    fn sample() -> TranscriptRecord {
        TranscriptRecord {
            title: "Never Gonna Give You Up".into(),
            cues: vec![Cue {
                text: "We're no strangers to love".into(),
                start_seconds: 18.5,
                duration_seconds: 3.25,
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn store_miss_is_not_found() {
        let finder = StoreFinder::new(repo());
        let outcome = finder.resolve(&key(), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, FindOutcome::NotFound);
    }

    #[tokio::test]
    async fn store_hit_decodes_blob() {
        let repo = repo();
        repo.put_blob(&key(), &sample().to_store_blob().unwrap()).unwrap();

        let finder = StoreFinder::new(repo);
        let outcome = finder.resolve(&key(), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, FindOutcome::Hit(sample()));
    }

    #[tokio::test]
    async fn corrupt_blob_is_error_not_miss() {
        let repo = repo();
        repo.put_blob(&key(), "{truncated").unwrap();

        let finder = StoreFinder::new(repo);
        let err = finder
            .resolve(&key(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FinderError::Store(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn unavailable_store_is_error() {
        let finder = StoreFinder::new(Arc::new(FailingStore {
            fail_get: true,
            fail_put: false,
        }));
        let err = finder
            .resolve(&key(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.error_kind(), "pool");
    }

    #[tokio::test]
    async fn cancelled_store_lookup() {
        let finder = StoreFinder::new(repo());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = finder.resolve(&key(), &cancel).await.unwrap_err();
        assert!(matches!(err, FinderError::Store(StoreError::Cancelled)));
    }

    #[tokio::test]
    async fn provider_hit_is_written_through() {
        let repo = repo();
        let provider = Arc::new(MockProvider::new(vec![MockResponse::record(&sample())]));
        let finder = ProviderFinder::new(provider.clone(), repo.clone());

        let outcome = finder.resolve(&key(), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, FindOutcome::Hit(sample()));
        assert_eq!(provider.call_count(), 1);

        let blob = repo.get_blob(&key()).unwrap().unwrap();
        assert_eq!(
            TranscriptRecord::from_store_blob(&key(), &blob).unwrap(),
            sample()
        );
    }

    #[tokio::test]
    async fn empty_provider_list_is_error() {
        let repo = repo();
        let provider = Arc::new(MockProvider::new(vec![MockResponse::json("[]")]));
        let finder = ProviderFinder::new(provider, repo.clone());

        let err = finder
            .resolve(&key(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FinderError::Provider(ProviderError::EmptyResponse)));
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn undecodable_body_is_error() {
        let provider = Arc::new(MockProvider::new(vec![MockResponse::json(
            r#"[{"transcription":[{"subtitle":{"text":"x"}}]}]"#,
        )]));
        let finder = ProviderFinder::new(provider, repo());

        let err = finder
            .resolve(&key(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FinderError::Provider(ProviderError::Decode(_))));
    }

    #[tokio::test]
    async fn transport_failure_is_error() {
        let provider = Arc::new(MockProvider::new(vec![MockResponse::Error(
            ProviderError::Network("connection refused".into()),
        )]));
        let finder = ProviderFinder::new(provider, repo());

        let err = finder
            .resolve(&key(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.error_kind(), "network");
    }

    #[tokio::test]
    async fn persist_failure_still_returns_record() {
        let provider = Arc::new(MockProvider::new(vec![MockResponse::record(&sample())]));
        let store = Arc::new(FailingStore {
            fail_get: false,
            fail_put: true,
        });
        let finder = ProviderFinder::new(provider, store);

        let outcome = finder.resolve(&key(), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, FindOutcome::Hit(sample()));
    }
}
