use crate::error::{LlmError, PipelineError};
use crate::prompt::{compose, PromptTemplate};
use narrator_chatlog::ChatLogStore;

/// A text-completion service.
pub trait LanguageModel {
    fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

impl<T: LanguageModel + ?Sized> LanguageModel for &T {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).complete(prompt)
    }
}

/// Document-oriented prompts: summaries, sentiment, notes.
#[derive(Debug, Clone)]
pub struct Summarizer<M> {
    model: M,
}

impl<M: LanguageModel> Summarizer<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn summarize(&self, text: &str) -> Result<String, LlmError> {
        tracing::info!(chars = text.len(), "generating summary");
        self.model.complete(&PromptTemplate::summarize(text))
    }

    pub fn analyze_sentiment(&self, text: &str) -> Result<String, LlmError> {
        self.model.complete(&PromptTemplate::sentiment(text))
    }

    /// Analyzes sentiment first, then asks for notes based on it.
    ///
    /// `additions` are appended to the notes prompt as user instructions.
    pub fn notes_with_sentiment(
        &self,
        text: &str,
        additions: Option<&str>,
    ) -> Result<String, LlmError> {
        let sentiment = self.analyze_sentiment(text)?;
        let mut prompt = PromptTemplate::notes_from_sentiment(&sentiment);
        if let Some(additions) = additions.filter(|a| !a.trim().is_empty()) {
            prompt = PromptTemplate::with_user_additions(&prompt, additions);
        }
        self.model.complete(&prompt)
    }
}

/// Multi-turn chat backed by a language model and the session log.
#[derive(Debug)]
pub struct ChatSession<'a, M> {
    model: M,
    log: &'a ChatLogStore,
    base_prompt: String,
}

impl<'a, M: LanguageModel> ChatSession<'a, M> {
    pub fn new(model: M, log: &'a ChatLogStore, base_prompt: impl Into<String>) -> Self {
        Self {
            model,
            log,
            base_prompt: base_prompt.into(),
        }
    }

    /// Sends one user turn and returns the bot's reply.
    ///
    /// The exchange is recorded only after the backend answers, so a failed
    /// completion leaves the transcript untouched.
    pub fn send(&self, session_id: &str, user_message: &str) -> Result<String, PipelineError> {
        let history = self.log.load_transcript(session_id)?;
        let prompt = compose(&self.base_prompt, &history, user_message);
        tracing::debug!(session_id, turns = history.len(), "sending chat prompt");

        let reply = self.model.complete(&prompt)?;
        self.log.append_exchange(session_id, user_message, &reply)?;
        Ok(reply)
    }

    /// Summarizes `text` and records the request and the summary in the session.
    ///
    /// The stored reply is prefixed with `Summary:` so it can be found again
    /// with [`ChatLogStore::latest_summary`].
    pub fn summarize_into_session(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<String, PipelineError> {
        let summary = self.model.complete(&PromptTemplate::summarize(text))?;
        let recorded = if summary.contains(narrator_chatlog::SUMMARY_MARKER) {
            summary.clone()
        } else {
            format!("{} {}", narrator_chatlog::SUMMARY_MARKER, summary)
        };
        self.log
            .append_exchange(session_id, "Please summarize the document.", &recorded)?;
        Ok(summary)
    }
}
