//! Layered configuration for the transcript resolver.
//!
//! Compiled defaults, then `~/.transcribify/settings.json` deep-merged over
//! them, then environment overrides. Nothing else in the workspace reads the
//! environment; the binary loads settings once and hands explicit values to
//! the store and provider constructors.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings_from_path, load_settings_with_env,
    settings_dir, settings_path,
};
pub use types::{LoggingSettings, ProviderSettings, StoreSettings, TranscribifySettings};
