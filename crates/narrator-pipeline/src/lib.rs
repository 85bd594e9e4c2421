//! Document, speech, and chat workflows for Narrator.
//!
//! External services are reached only through narrow traits:
//!
//! - [`DocumentExtractor`] turns an uploaded file into text.
//! - [`SpeechBackend`] lists voices and synthesizes audio.
//! - [`LanguageModel`] completes prompts.
//! - [`AgentBackend`] creates conversational voice agents.
//!
//! The types in this crate glue those collaborators to the local stores:
//! uploads and audio land in the managed directories, chat turns are
//! composed from and recorded to the session log, and agent credentials are
//! persisted through the settings store. Wire formats belong to the trait
//! implementations, not to this crate.
//!
//! Everything is synchronous; implementations that talk to the network
//! block the calling thread.

pub mod agent;
pub mod document;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod speech;

pub use agent::{setup_agent, use_existing_agent, AgentBackend, AgentSpec};
pub use document::{ingest_document, store_extracted_text, store_upload, DocumentExtractor};
pub use error::{AgentError, ExtractionError, LlmError, PipelineError, SpeechError};
pub use llm::{ChatSession, LanguageModel, Summarizer};
pub use prompt::{compose, PromptTemplate};
pub use speech::{Narrator, SpeechBackend};
