use crate::error::{AgentError, PipelineError};
use narrator_vault::{SecretCipher, SettingsStore, AGENT_ID, API_KEY};
use serde::{Deserialize, Serialize};

/// Language used when an `AgentSpec` does not name one.
pub const DEFAULT_AGENT_LANGUAGE: &str = "en";

/// Parameters for creating a conversational voice agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    /// Backend voice ID (resolve names with `Narrator::find_voice`).
    pub voice_id: String,
    /// Model the agent runs on, as named by the backend.
    pub llm: String,
    pub system_prompt: String,
    #[serde(default)]
    pub first_message: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    DEFAULT_AGENT_LANGUAGE.to_string()
}

impl AgentSpec {
    pub fn new(
        name: impl Into<String>,
        voice_id: impl Into<String>,
        llm: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            voice_id: voice_id.into(),
            llm: llm.into(),
            system_prompt: system_prompt.into(),
            first_message: None,
            language: default_language(),
        }
    }
}

/// A service that hosts conversational voice agents.
pub trait AgentBackend {
    /// Creates an agent and returns its identifier.
    fn create_agent(&self, api_key: &str, spec: &AgentSpec) -> Result<String, AgentError>;
}

/// Creates an agent and persists the credential and agent ID.
///
/// Settings are loaded before anything is written, so a store that can no
/// longer be decrypted fails here instead of being silently overwritten.
pub fn setup_agent<A, C>(
    backend: &A,
    settings: &SettingsStore<C>,
    api_key: &str,
    spec: &AgentSpec,
) -> Result<String, PipelineError>
where
    A: AgentBackend + ?Sized,
    C: SecretCipher,
{
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(AgentError::MissingCredential.into());
    }

    let mut current = settings.load()?;
    let agent_id = backend.create_agent(api_key, spec)?;
    tracing::info!(agent = %spec.name, agent_id = %agent_id, "created voice agent");

    current.set(API_KEY, api_key);
    current.set(AGENT_ID, agent_id.as_str());
    settings.save(&current)?;
    Ok(agent_id)
}

/// Records an existing agent ID (and credential) without creating anything.
pub fn use_existing_agent<C: SecretCipher>(
    settings: &SettingsStore<C>,
    api_key: &str,
    agent_id: &str,
) -> Result<(), PipelineError> {
    let (api_key, agent_id) = (api_key.trim(), agent_id.trim());
    if api_key.is_empty() {
        return Err(AgentError::MissingCredential.into());
    }
    if agent_id.is_empty() {
        return Err(AgentError::MissingAgentId.into());
    }

    settings.update(|s| {
        s.set(API_KEY, api_key);
        s.set(AGENT_ID, agent_id);
    })?;
    tracing::info!(agent_id, "using existing voice agent");
    Ok(())
}
