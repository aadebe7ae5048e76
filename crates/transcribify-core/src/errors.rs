use std::time::Duration;

use crate::key::ResolutionKey;

/// A request that failed key validation. Never reaches a finder.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRequest {
    #[error("invalid video id {0:?}: expected 11 characters of [A-Za-z0-9_-]")]
    VideoId(String),
    #[error("invalid language tag {0:?}")]
    Language(String),
}

/// Failures of the remote transcription provider.
///
/// The provider cannot tell "no transcript exists" apart from "something
/// broke", so every variant is an error rather than a miss.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ProviderError {
    // Fatal, retrying will not help
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("provider returned an empty transcript list")]
    EmptyResponse,
    #[error("failed to decode provider response: {0}")]
    Decode(String),
    #[error("response body exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },

    // Retryable
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("circuit open, provider calls suspended")]
    CircuitOpen,

    // Operational
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    #[error("cancelled")]
    Cancelled,
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ServerError { .. } | Self::Network(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed(_)
                | Self::UnexpectedStatus { .. }
                | Self::EmptyResponse
                | Self::Decode(_)
                | Self::ResponseTooLarge { .. }
        )
    }

    pub fn suggested_delay(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Short classification string for log fields.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::EmptyResponse => "empty_response",
            Self::Decode(_) => "decode",
            Self::ResponseTooLarge { .. } => "response_too_large",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::Network(_) => "network",
            Self::CircuitOpen => "circuit_open",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
        }
    }

    /// Classify a non-2xx HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(body),
            429 => Self::RateLimited { retry_after: None },
            500..=599 => Self::ServerError { status, body },
            _ => Self::UnexpectedStatus { status, body },
        }
    }
}

/// Failures of the durable transcript store.
#[derive(Clone, Debug, thiserror::Error)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("corrupt entry for {key}: {detail}")]
    Corrupt { key: String, detail: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("cancelled")]
    Cancelled,
}

impl StoreError {
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Pool(_) => "pool",
            Self::Database(_) => "database",
            Self::NotFound(_) => "not_found",
            Self::Corrupt { .. } => "corrupt",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Error reported by a single finder. The pipeline records it and moves on.
#[derive(Clone, Debug, thiserror::Error)]
pub enum FinderError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),
    /// The caller cancelled before this finder could run.
    #[error("cancelled")]
    Cancelled,
}

impl FinderError {
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Store(e) => e.error_kind(),
            Self::Provider(e) => e.error_kind(),
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Cancelled
                | Self::Store(StoreError::Cancelled)
                | Self::Provider(ProviderError::Cancelled)
        )
    }
}

/// Outcome surfaced to whoever calls the pipeline.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequest),

    #[error("no transcript available for {key}{}", describe_last(.last_error))]
    NotResolved {
        key: ResolutionKey,
        last_error: Option<FinderError>,
    },
}

fn describe_last(last_error: &Option<FinderError>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(" (last error: {e})"))
        .unwrap_or_default()
}

impl ResolutionError {
    /// The request itself was malformed ("bad request").
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    /// Every finder was exhausted ("not found").
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotResolved { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ProviderError::RateLimited { retry_after: None }.is_retryable());
        assert!(ProviderError::ServerError { status: 502, body: String::new() }.is_retryable());
        assert!(ProviderError::Network("reset".into()).is_retryable());
        assert!(!ProviderError::EmptyResponse.is_retryable());
        assert!(!ProviderError::Cancelled.is_retryable());
        assert!(!ProviderError::CircuitOpen.is_retryable());
    }

    #[test]
    fn fatal_classification() {
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_fatal());
        assert!(ProviderError::Decode("eof".into()).is_fatal());
        assert!(ProviderError::EmptyResponse.is_fatal());
        assert!(ProviderError::UnexpectedStatus { status: 404, body: String::new() }.is_fatal());
        assert!(ProviderError::ResponseTooLarge { limit: 1024 }.is_fatal());
    }

    #[test]
    fn timeout_is_neither_fatal_nor_retryable() {
        let timeout = ProviderError::Timeout(Duration::from_secs(20));
        assert!(!timeout.is_fatal());
        assert!(!timeout.is_retryable());
    }

    #[test]
    fn from_status_mapping() {
        assert!(matches!(
            ProviderError::from_status(401, "no".into()),
            ProviderError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            ProviderError::from_status(403, "no".into()),
            ProviderError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            ProviderError::from_status(429, String::new()),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            ProviderError::from_status(503, String::new()),
            ProviderError::ServerError { status: 503, .. }
        ));
        assert!(matches!(
            ProviderError::from_status(404, String::new()),
            ProviderError::UnexpectedStatus { status: 404, .. }
        ));
    }

    #[test]
    fn suggested_delay_only_for_rate_limit() {
        let rl = ProviderError::RateLimited { retry_after: Some(Duration::from_secs(3)) };
        assert_eq!(rl.suggested_delay(), Some(Duration::from_secs(3)));
        assert_eq!(ProviderError::Network("x".into()).suggested_delay(), None);
    }

    #[test]
    fn finder_error_kind_delegates() {
        let e: FinderError = StoreError::Cancelled.into();
        assert_eq!(e.error_kind(), "cancelled");
        let e: FinderError = ProviderError::EmptyResponse.into();
        assert_eq!(e.error_kind(), "empty_response");
    }

    #[test]
    fn cancellation_recognised_from_any_source() {
        assert!(FinderError::Cancelled.is_cancelled());
        assert!(FinderError::from(StoreError::Cancelled).is_cancelled());
        assert!(FinderError::from(ProviderError::Cancelled).is_cancelled());
        assert!(!FinderError::from(ProviderError::EmptyResponse).is_cancelled());
    }

    #[test]
    fn not_resolved_message_includes_last_error() {
        let key = ResolutionKey::new("dQw4w9WgXcQ", "en").unwrap();
        let err = ResolutionError::NotResolved {
            key: key.clone(),
            last_error: Some(ProviderError::Timeout(Duration::from_secs(1)).into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("dQw4w9WgXcQ/en"), "got: {msg}");
        assert!(msg.contains("timeout"), "got: {msg}");
        assert!(err.is_not_found());
        assert!(!err.is_client_error());

        let bare = ResolutionError::NotResolved { key, last_error: None };
        assert_eq!(bare.to_string(), "no transcript available for dQw4w9WgXcQ/en");
    }

    #[test]
    fn invalid_request_is_client_error() {
        let err: ResolutionError = InvalidRequest::Language("x".into()).into();
        assert!(err.is_client_error());
        assert!(!err.is_not_found());
    }
}
