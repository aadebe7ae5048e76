use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use transcribify_core::{ProviderError, ResolutionKey, TranscriptProvider, TranscriptRecord};

/// Pre-programmed responses for deterministic testing without network calls.
pub enum MockResponse {
    /// Return these bytes as the response body.
    Body(Bytes),
    /// Fail the fetch.
    Error(ProviderError),
    /// Wait a duration, then yield the inner response.
    Delay(Duration, Box<MockResponse>),
}

impl MockResponse {
    /// A body in the provider's wire shape: a one-element list.
    pub fn record(record: &TranscriptRecord) -> Self {
        let body = serde_json::to_vec(&[record]).unwrap_or_default();
        Self::Body(Bytes::from(body))
    }

    pub fn json(body: &str) -> Self {
        Self::Body(Bytes::copy_from_slice(body.as_bytes()))
    }

    pub fn delayed(delay: Duration, inner: MockResponse) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// Mock provider that plays back responses in sequence.
pub struct MockProvider {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<ResolutionKey>>,
    call_count: AtomicUsize,
}

impl MockProvider {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Keys seen so far, in call order.
    pub fn requests(&self) -> Vec<ResolutionKey> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl TranscriptProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        key: &ResolutionKey,
        cancel: &CancellationToken,
    ) -> Result<Bytes, ProviderError> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().push(key.clone());

        let Some(mut current) = self.responses.lock().pop_front() else {
            return Err(ProviderError::UnexpectedStatus {
                status: 0,
                body: format!("MockProvider: no response configured for call {idx}"),
            });
        };

        loop {
            match current {
                MockResponse::Body(body) => return Ok(body),
                MockResponse::Error(e) => return Err(e),
                MockResponse::Delay(duration, inner) => {
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                        _ = tokio::time::sleep(duration) => current = *inner,
                    }
                }
            }
        }
    }
}
