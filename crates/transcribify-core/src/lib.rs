//! Shared types for transcript resolution: the request key, the transcript
//! record and its decoding rules, the error taxonomy, and the traits the
//! store, provider and finders implement.

pub mod errors;
pub mod finder;
pub mod key;
pub mod provider;
pub mod record;
pub mod store;

pub use errors::{FinderError, InvalidRequest, ProviderError, ResolutionError, StoreError};
pub use finder::{FindOutcome, Finder};
pub use key::ResolutionKey;
pub use provider::TranscriptProvider;
pub use record::{Cue, Thumbnail, TranscriptRecord};
pub use store::TranscriptStore;
