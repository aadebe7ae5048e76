use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

use crate::errors::{ProviderError, StoreError};
use crate::key::ResolutionKey;

/// A resolved transcript.
///
/// Field names on the wire follow the provider payload, and the stored blob
/// uses the same shape so historical entries keep decoding. Missing fields
/// decode to their empty value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptRecord {
    pub title: String,
    pub description: String,
    #[serde(rename = "availableLangs")]
    pub available_languages: Vec<String>,
    /// Kept exactly as the provider wrote it; never parsed to a number.
    #[serde(rename = "lengthInSeconds", deserialize_with = "verbatim_length")]
    pub length_in_seconds: String,
    pub thumbnails: Vec<Thumbnail>,
    /// The timeline, in provider order.
    #[serde(rename = "transcription")]
    pub cues: Vec<Cue>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// One timed subtitle entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    #[serde(rename = "subtitle", default, deserialize_with = "cue_text")]
    pub text: String,
    #[serde(rename = "start", default)]
    pub start_seconds: f64,
    #[serde(rename = "dur", default)]
    pub duration_seconds: f64,
}

/// Cue text as the provider sends it. Variant order is the decode order:
/// a string is tried first, then an integer numeral. `null` is empty text.
#[derive(Deserialize)]
#[serde(untagged)]
enum CueText {
    Text(String),
    Numeral(i64),
}

fn cue_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<CueText>::deserialize(deserializer) {
        Ok(None) => Ok(String::new()),
        Ok(Some(CueText::Text(text))) => Ok(text),
        Ok(Some(CueText::Numeral(n))) => Ok(n.to_string()),
        Err(_) => Err(serde::de::Error::custom(
            "cue subtitle must be a string or an integer",
        )),
    }
}

/// A string is unescaped; a number keeps its source text (`212.50` stays `212.50`).
fn verbatim_length<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Box::<RawValue>::deserialize(deserializer)?;
    let text = raw.get();
    match text.as_bytes().first() {
        Some(b'"') => serde_json::from_str(text).map_err(serde::de::Error::custom),
        Some(b'-' | b'0'..=b'9') => Ok(text.to_string()),
        _ => Err(serde::de::Error::custom(
            "lengthInSeconds must be a string or a number",
        )),
    }
}

impl TranscriptRecord {
    /// Decode a provider response body.
    ///
    /// The provider always wraps the transcript in a list; the first element
    /// is the answer and any others are ignored.
    pub fn from_provider_body(body: &[u8]) -> Result<Self, ProviderError> {
        let candidates: Vec<TranscriptRecord> =
            serde_json::from_slice(body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        candidates
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)
    }

    /// Decode a blob previously written by [`TranscriptRecord::to_store_blob`].
    pub fn from_store_blob(key: &ResolutionKey, blob: &str) -> Result<Self, StoreError> {
        serde_json::from_str(blob).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            detail: e.to_string(),
        })
    }

    pub fn to_store_blob(&self) -> Result<String, StoreError> {
        serde_json::to_string(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
