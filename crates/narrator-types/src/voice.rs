//! Voice descriptors.
//!
//! A speech backend advertises the voices it can render as a list of
//! [`VoiceInfo`] entries. Callers pick by human-readable name and the
//! backend is addressed by ID.

use serde::{Deserialize, Serialize};

/// A voice offered by a speech backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Human-readable name shown to the user.
    pub name: String,
    /// Backend-specific identifier used for synthesis.
    pub id: String,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Resolves a voice name to its backend ID.
///
/// Matching is exact; the first voice with the given name wins.
pub fn find_voice_id<'a>(voices: &'a [VoiceInfo], name: &str) -> Option<&'a str> {
    voices
        .iter()
        .find(|voice| voice.name == name)
        .map(|voice| voice.id.as_str())
}
