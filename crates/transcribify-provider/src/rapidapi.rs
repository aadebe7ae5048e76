use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use transcribify_core::{ProviderError, ResolutionKey, TranscriptProvider};

pub const DEFAULT_BASE_URL: &str = "https://youtube-transcriptor.p.rapidapi.com";
pub const DEFAULT_HOST: &str = "youtube-transcriptor.p.rapidapi.com";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Connection details for the RapidAPI transcript endpoint.
#[derive(Clone)]
pub struct RapidApiConfig {
    pub base_url: String,
    /// Sent as `X-RapidAPI-Host`.
    pub host: String,
    /// Sent as `X-RapidAPI-Key`.
    pub api_key: SecretString,
    /// Whole-request deadline, body included.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Larger 2xx bodies fail with `ResponseTooLarge` instead of being buffered.
    pub max_body_bytes: usize,
}

impl RapidApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            api_key: SecretString::from(api_key.into()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl std::fmt::Debug for RapidApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RapidApiConfig")
            .field("base_url", &self.base_url)
            .field("host", &self.host)
            .field("api_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

/// `GET {base_url}/transcript?video_id=..&lang=..` against RapidAPI.
///
/// Returns the raw body of a 2xx response. Decoding is left to the caller.
pub struct RapidApiProvider {
    client: Client,
    config: RapidApiConfig,
}

impl RapidApiProvider {
    pub fn new(config: RapidApiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/transcript", self.config.base_url.trim_end_matches('/'))
    }

    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.config.request_timeout)
        } else {
            ProviderError::Network(e.to_string())
        }
    }

    async fn send(&self, key: &ResolutionKey) -> Result<Bytes, ProviderError> {
        let mut resp = self
            .client
            .get(self.endpoint())
            .query(&[("video_id", key.video_id()), ("lang", key.language())])
            .header("X-RapidAPI-Key", self.config.api_key.expose_secret())
            .header("X-RapidAPI-Host", &self.config.host)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = retry_after(resp.headers());
            let body = resp.text().await.unwrap_or_default();
            return Err(match ProviderError::from_status(status.as_u16(), body) {
                ProviderError::RateLimited { .. } => ProviderError::RateLimited { retry_after },
                other => other,
            });
        }

        let limit = self.config.max_body_bytes;
        if resp.content_length().is_some_and(|len| len > limit as u64) {
            return Err(ProviderError::ResponseTooLarge { limit });
        }
        let mut body = BytesMut::new();
        while let Some(chunk) = resp.chunk().await.map_err(|e| self.transport_error(e))? {
            if body.len() + chunk.len() > limit {
                return Err(ProviderError::ResponseTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        let body = body.freeze();
        debug!(status = status.as_u16(), bytes = body.len(), "provider responded");
        Ok(body)
    }
}

/// `Retry-After` in delta-seconds form. HTTP dates are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl TranscriptProvider for RapidApiProvider {
    fn name(&self) -> &str {
        "rapidapi"
    }

    #[instrument(skip(self, cancel), fields(key = %key))]
    async fn fetch(
        &self,
        key: &ResolutionKey,
        cancel: &CancellationToken,
    ) -> Result<Bytes, ProviderError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = self.send(key) => result,
        }
    }
}
