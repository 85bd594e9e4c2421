use narrator_chatlog::ChatLogError;
use narrator_vault::VaultError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a document extractor.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to extract text from {path}: {reason}")]
    Failed { path: PathBuf, reason: String },

    #[error("unsupported document type: {0}")]
    Unsupported(String),
}

/// Failures reported by a speech backend.
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("voice not found: {0}")]
    VoiceNotFound(String),

    #[error("input text cannot be empty")]
    EmptyText,

    #[error("failed to list voices: {0}")]
    Listing(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

/// Failures reported by a language-model backend.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("language model backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Failures reported by a conversational-agent backend.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("API credential is missing")]
    MissingCredential,

    #[error("agent ID is missing")]
    MissingAgentId,

    #[error("failed to create agent: {0}")]
    Creation(String),
}

/// Errors surfaced by the orchestration layer.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    ChatLog(#[from] ChatLogError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),
}

impl PipelineError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
