use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::InvalidRequest;

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("static video id pattern"));

/// Primary subtag of 2–3 letters, then any number of `-subtag` groups.
static LANGUAGE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{1,8})*$").expect("static language tag pattern")
});

/// The (video id, language) pair a transcript is requested and cached under.
///
/// Construction validates both halves; once built the key is immutable.
/// Equality is byte-for-byte: `"EN"` and `"en"` are different keys.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize)]
pub struct ResolutionKey {
    video_id: String,
    language: String,
}

impl ResolutionKey {
    pub fn new(
        video_id: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, InvalidRequest> {
        let video_id = video_id.into();
        let language = language.into();

        if !VIDEO_ID.is_match(&video_id) {
            return Err(InvalidRequest::VideoId(video_id));
        }
        if !LANGUAGE_TAG.is_match(&language) {
            return Err(InvalidRequest::Language(language));
        }

        Ok(Self { video_id, language })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.video_id, self.language)
    }
}

// Keys read back from JSON go through the same validation as fresh ones.
impl<'de> Deserialize<'de> for ResolutionKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            video_id: String,
            language: String,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.video_id, raw.language).map_err(serde::de::Error::custom)
    }
}
