//! Shared types for the Narrator workspace.
//!
//! This crate holds the vocabulary every other Narrator crate speaks:
//! transcript speakers and exchanges, voice descriptors returned by speech
//! backends, and the [`DataLayout`] that maps each managed directory role to
//! a concrete path under the base data directory.
//!
//! Nothing in here reaches for ambient global paths. A `DataLayout` is built
//! once at process start and handed by reference to every component that
//! touches the filesystem.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod fs;
mod layout;
pub mod voice;

pub use layout::{unique_file_name, DataLayout, DirectoryRole, LayoutError};
pub use voice::VoiceInfo;

/// Who authored a transcript message.
///
/// Serialized as `"User"` / `"Bot"` in persisted transcripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    /// The human side of the conversation.
    User,
    /// The language-model or agent side of the conversation.
    Bot,
}

impl Speaker {
    /// Returns the label used in transcripts and composed prompts.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Bot => "Bot",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One `(speaker, message)` pair of a session transcript.
///
/// Persisted as a two-element JSON array, e.g. `["User", "hi"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Speaker, String)", into = "(Speaker, String)")]
pub struct Exchange {
    pub speaker: Speaker,
    pub message: String,
}

impl Exchange {
    pub fn new(speaker: Speaker, message: impl Into<String>) -> Self {
        Self {
            speaker,
            message: message.into(),
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(Speaker::User, message)
    }

    pub fn bot(message: impl Into<String>) -> Self {
        Self::new(Speaker::Bot, message)
    }
}

impl From<(Speaker, String)> for Exchange {
    fn from((speaker, message): (Speaker, String)) -> Self {
        Self { speaker, message }
    }
}

impl From<Exchange> for (Speaker, String) {
    fn from(exchange: Exchange) -> Self {
        (exchange.speaker, exchange.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speaker_labels() {
        assert_eq!(Speaker::User.label(), "User");
        assert_eq!(Speaker::Bot.to_string(), "Bot");
    }

    #[test]
    fn exchange_serializes_as_pair() {
        let json = serde_json::to_string(&Exchange::user("hi")).unwrap();
        assert_eq!(json, r#"["User","hi"]"#);

        let parsed: Exchange = serde_json::from_str(r#"["Bot","hello"]"#).unwrap();
        assert_eq!(parsed, Exchange::bot("hello"));
    }

    #[test]
    fn exchange_rejects_unknown_speaker() {
        let parsed = serde_json::from_str::<Exchange>(r#"["System","x"]"#);
        assert!(parsed.is_err());
    }
}
