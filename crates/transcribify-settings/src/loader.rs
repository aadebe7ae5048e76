//! Settings loading with deep merge and environment variable overrides.
//!
//! 1. Compiled [`TranscribifySettings::default()`]
//! 2. `settings.json`, deep-merged over the defaults
//! 3. Environment overrides (highest priority)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::TranscribifySettings;

/// `~/.transcribify`, or `/tmp/.transcribify` without a home directory.
pub fn settings_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".transcribify")
}

pub fn settings_path() -> PathBuf {
    settings_dir().join("settings.json")
}

/// Load from `path` with overrides from the process environment.
///
/// A missing file yields defaults; a malformed one is an error.
pub fn load_settings_from_path(path: &Path) -> Result<TranscribifySettings> {
    load_settings_with_env(path, |name| std::env::var(name).ok())
}

/// Same as [`load_settings_from_path`], reading variables through `env`.
pub fn load_settings_with_env<F>(path: &Path, env: F) -> Result<TranscribifySettings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(TranscribifySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: TranscribifySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, env);
    Ok(settings)
}

/// Recursive merge of two JSON values.
///
/// Objects merge per key; arrays and primitives from `source` replace
/// `target`; `null` in `source` leaves `target` untouched.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment overrides. Empty and unparseable values are ignored.
pub fn apply_env_overrides<F>(settings: &mut TranscribifySettings, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let string = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = string("VIDEO_API_KEY") {
        settings.provider.api_key = v;
    }
    if let Some(v) = string("VIDEO_API_URL") {
        settings.provider.host = v;
    }
    if let Some(v) = string("TRANSCRIBIFY_PROVIDER_BASE_URL") {
        settings.provider.base_url = v;
    }
    if let Some(v) = ranged(&string, "TRANSCRIBIFY_PROVIDER_TIMEOUT_MS", 1, 600_000) {
        settings.provider.request_timeout_ms = v;
    }
    if let Some(v) = string("TRANSCRIBIFY_DB_PATH") {
        settings.store.db_path = v;
    }
    if let Some(v) = ranged(&string, "TRANSCRIBIFY_DB_POOL_SIZE", 1, 256) {
        settings.store.pool_size = v as u32;
    }
    if let Some(v) = string("TRANSCRIBIFY_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn ranged(
    string: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: u64,
    max: u64,
) -> Option<u64> {
    let val = string(name)?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        warn!(key = name, value = %val, min, max, "invalid numeric env var, ignoring");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use serde_json::json;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn deep_merge_objects_recursively() {
        let target = json!({"a": {"b": 1, "c": 2}, "d": 3});
        let source = json!({"a": {"b": 10}});
        assert_eq!(deep_merge(target, source), json!({"a": {"b": 10, "c": 2}, "d": 3}));
    }

    #[test]
    fn deep_merge_skips_null_and_replaces_arrays() {
        let target = json!({"a": 1, "list": [1, 2, 3]});
        let source = json!({"a": null, "list": [9]});
        assert_eq!(deep_merge(target, source), json!({"a": 1, "list": [9]}));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            load_settings_with_env(&dir.path().join("absent.json"), env_of(&[])).unwrap();
        assert_eq!(settings.store.pool_size, 8);
        assert_eq!(settings.provider.api_key, "");
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"provider": {"apiKey": "from-file", "maxRetries": 0}, "logging": {"json": true}}"#,
        )
        .unwrap();

        let settings = load_settings_with_env(&path, env_of(&[])).unwrap();
        assert_eq!(settings.provider.api_key, "from-file");
        assert_eq!(settings.provider.max_retries, 0);
        assert_eq!(settings.provider.request_timeout_ms, 20_000);
        assert!(settings.logging.json);
    }

    #[test]
    fn malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_settings_with_env(&path, env_of(&[])).is_err());
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"provider": {"apiKey": "from-file"}}"#).unwrap();

        let settings = load_settings_with_env(
            &path,
            env_of(&[
                ("VIDEO_API_KEY", "from-env"),
                ("VIDEO_API_URL", "mirror.example"),
                ("TRANSCRIBIFY_PROVIDER_BASE_URL", "http://127.0.0.1:8080"),
                ("TRANSCRIBIFY_PROVIDER_TIMEOUT_MS", "1500"),
                ("TRANSCRIBIFY_DB_PATH", "/srv/cache.db"),
                ("TRANSCRIBIFY_DB_POOL_SIZE", "4"),
                ("TRANSCRIBIFY_LOG_LEVEL", "debug"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.provider.api_key, "from-env");
        assert_eq!(settings.provider.host, "mirror.example");
        assert_eq!(settings.provider.base_url, "http://127.0.0.1:8080");
        assert_eq!(settings.provider.request_timeout_ms, 1500);
        assert_eq!(settings.store.db_path, "/srv/cache.db");
        assert_eq!(settings.store.pool_size, 4);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn invalid_env_values_ignored() {
        let mut settings = TranscribifySettings::default();
        apply_env_overrides(
            &mut settings,
            env_of(&[
                ("VIDEO_API_KEY", "   "),
                ("TRANSCRIBIFY_PROVIDER_TIMEOUT_MS", "soon"),
                ("TRANSCRIBIFY_DB_POOL_SIZE", "0"),
            ]),
        );
        assert_eq!(settings.provider.api_key, "");
        assert_eq!(settings.provider.request_timeout_ms, 20_000);
        assert_eq!(settings.store.pool_size, 8);
    }

    #[test]
    fn parse_u64_range_bounds() {
        assert_eq!(parse_u64_range("5", 1, 10), Some(5));
        assert_eq!(parse_u64_range(" 10 ", 1, 10), Some(10));
        assert_eq!(parse_u64_range("11", 1, 10), None);
        assert_eq!(parse_u64_range("-1", 1, 10), None);
    }
}
