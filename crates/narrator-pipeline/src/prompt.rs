//! Prompt construction for the language-model backend.
//!
//! [`compose`] renders a chat turn as plain text:
//!
//! ```text
//! <base prompt>
//! User: earlier question
//! Bot: earlier answer
//! User: <new message>
//! Bot:
//! ```
//!
//! The trailing `Bot:` cues the backend to produce the bot's turn.

use narrator_types::Exchange;

/// Cue that asks the backend for the next bot turn.
pub const BOT_CUE: &str = "Bot:";

/// Builds the full prompt: base prompt, prior history oldest first, then the
/// new user turn and the bot cue.
pub fn compose(base_prompt: &str, history: &[Exchange], user_message: &str) -> String {
    let history_text = history
        .iter()
        .map(|entry| format!("{}: {}", entry.speaker, entry.message))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{base_prompt}\n{history_text}\nUser: {user_message}\n{BOT_CUE}")
}

/// Fixed instruction prompts used by the document workflows.
pub struct PromptTemplate;

impl PromptTemplate {
    pub fn summarize(text: &str) -> String {
        format!("Please summarize the following text:\n{text}")
    }

    pub fn sentiment(text: &str) -> String {
        format!("Analyze the sentiment of the following text:\n{text}")
    }

    pub fn notes_from_sentiment(sentiment: &str) -> String {
        format!("Generate detailed notes based on the sentiment:\n{sentiment}")
    }

    /// Appends free-form user instructions to a base prompt.
    pub fn with_user_additions(base: &str, additions: &str) -> String {
        format!("{base}\n\nUser Additions: {additions}")
    }
}
