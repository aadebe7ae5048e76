use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings object, mirrors `settings.json`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscribifySettings {
    pub provider: ProviderSettings,
    pub store: StoreSettings,
    pub logging: LoggingSettings,
}

impl TranscribifySettings {
    /// Reject values that would load but cannot work.
    pub fn validate(&self) -> Result<()> {
        let provider = &self.provider;
        if provider.api_key.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "provider.apiKey is required (or set VIDEO_API_KEY)".into(),
            ));
        }
        if provider.host.trim().is_empty() {
            return Err(SettingsError::InvalidValue("provider.host is empty".into()));
        }
        if provider.base_url.trim().is_empty() {
            return Err(SettingsError::InvalidValue("provider.baseUrl is empty".into()));
        }
        if provider.request_timeout_ms == 0
            || provider.connect_timeout_ms == 0
            || provider.total_timeout_ms == 0
        {
            return Err(SettingsError::InvalidValue(
                "provider timeouts must be greater than zero".into(),
            ));
        }
        if self.store.pool_size == 0 {
            return Err(SettingsError::InvalidValue(
                "store.poolSize must be at least 1".into(),
            ));
        }
        if !is_level_name(&self.logging.level) {
            return Err(SettingsError::InvalidValue(format!(
                "logging.level {:?} is not one of trace, debug, info, warn, error",
                self.logging.level
            )));
        }
        Ok(())
    }
}

fn is_level_name(level: &str) -> bool {
    matches!(
        level.trim().to_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

/// Remote transcript provider (RapidAPI).
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    /// Subscription key, sent as `X-RapidAPI-Key`.
    pub api_key: String,
    /// Sent as `X-RapidAPI-Host`.
    pub host: String,
    pub base_url: String,
    /// Deadline for one HTTP exchange.
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Deadline for a whole fetch, retries and backoff included.
    pub total_timeout_ms: u64,
    /// Extra attempts after a retryable failure. 0 disables retries.
    pub max_retries: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            host: "youtube-transcriptor.p.rapidapi.com".to_string(),
            base_url: "https://youtube-transcriptor.p.rapidapi.com".to_string(),
            request_timeout_ms: 20_000,
            connect_timeout_ms: 10_000,
            total_timeout_ms: 60_000,
            max_retries: 2,
        }
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &"[REDACTED]")
            .field("host", &self.host)
            .field("base_url", &self.base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("total_timeout_ms", &self.total_timeout_ms)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Transcript cache database.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Relative paths are resolved against the settings directory.
    pub db_path: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: "transcripts.db".to_string(),
            pool_size: 8,
            busy_timeout_ms: 5_000,
        }
    }
}

impl StoreSettings {
    pub fn resolve_db_path(&self, base_dir: &Path) -> PathBuf {
        let path = Path::new(&self.db_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    /// JSON lines on stderr; plain text when false.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
