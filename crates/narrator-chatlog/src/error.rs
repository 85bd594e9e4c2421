//! Error types for the session log store.

use std::path::PathBuf;

/// Errors that can occur while reading or writing session transcripts.
///
/// A session with no backing file is not an error; it loads as an empty
/// transcript.
#[derive(Debug, thiserror::Error)]
pub enum ChatLogError {
    /// The session id cannot be used as a file name.
    #[error("invalid session id {0:?}")]
    InvalidSessionId(String),

    /// A filesystem operation failed.
    #[error("chat log I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A complete line of the session log is not a `[speaker, message]` record.
    #[error("malformed chat log record at {path}:{line}: {source}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A legacy whole-file transcript could not be parsed.
    #[error("malformed legacy transcript {path}: {source}")]
    MalformedTranscript {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized.
    #[error("chat log serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChatLogError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
