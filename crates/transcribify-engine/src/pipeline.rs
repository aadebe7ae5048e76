use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use transcribify_core::{
    FindOutcome, Finder, FinderError, ResolutionError, ResolutionKey, TranscriptProvider,
    TranscriptRecord, TranscriptStore,
};

use crate::finders::{ProviderFinder, StoreFinder};

/// Tries an ordered list of finders; the first hit wins.
///
/// A miss or an error from one finder moves on to the next. Only running out
/// of finders produces `NotResolved`.
pub struct ResolutionPipeline {
    finders: Vec<Arc<dyn Finder>>,
}

impl ResolutionPipeline {
    pub fn new(finders: Vec<Arc<dyn Finder>>) -> Self {
        Self { finders }
    }

    /// Cache first, then the provider writing through to that same cache.
    pub fn standard(
        store: Arc<dyn TranscriptStore>,
        provider: Arc<dyn TranscriptProvider>,
    ) -> Self {
        Self::new(vec![
            Arc::new(StoreFinder::new(store.clone())),
            Arc::new(ProviderFinder::new(provider, store)),
        ])
    }

    pub fn finder_names(&self) -> Vec<&str> {
        self.finders.iter().map(|f| f.name()).collect()
    }

    /// Validate raw identifiers, then resolve.
    pub async fn resolve_raw(
        &self,
        video_id: &str,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<TranscriptRecord, ResolutionError> {
        let key = ResolutionKey::new(video_id, language)?;
        self.resolve(&key, cancel).await
    }

    #[instrument(skip(self, cancel), fields(key = %key))]
    pub async fn resolve(
        &self,
        key: &ResolutionKey,
        cancel: &CancellationToken,
    ) -> Result<TranscriptRecord, ResolutionError> {
        let mut last_error: Option<FinderError> = None;

        for finder in &self.finders {
            if cancel.is_cancelled() {
                debug!(finder = finder.name(), "skipping finder, resolution cancelled");
                if !last_error.as_ref().is_some_and(FinderError::is_cancelled) {
                    last_error = Some(FinderError::Cancelled);
                }
                break;
            }

            let started = Instant::now();
            match finder.resolve(key, cancel).await {
                Ok(FindOutcome::Hit(record)) => {
                    info!(
                        finder = finder.name(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        cues = record.cues.len(),
                        "transcript resolved"
                    );
                    return Ok(record);
                }
                Ok(FindOutcome::NotFound) => {
                    debug!(finder = finder.name(), "finder miss");
                }
                Err(e) => {
                    warn!(
                        finder = finder.name(),
                        error = %e,
                        error_kind = e.error_kind(),
                        "finder failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        info!(
            last_error = last_error.as_ref().map(FinderError::error_kind),
            "transcript not resolved"
        );
        Err(ResolutionError::NotResolved {
            key: key.clone(),
            last_error,
        })
    }
}
