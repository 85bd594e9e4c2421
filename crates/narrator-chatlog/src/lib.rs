//! Session transcript storage for Narrator.
//!
//! Every conversation is scoped by a caller-chosen session id and stored as
//! an append-only JSON Lines log at `chat_logs/<session_id>.jsonl`, one
//! `["User" | "Bot", message]` record per line:
//!
//! ```text
//! ["User","Summarize chapter one"]
//! ["Bot","Summary: the hero leaves home."]
//! ```
//!
//! Appends never rewrite earlier records, so two writers cannot lose each
//! other's exchanges. A final line torn by a crash is detected on replay and
//! dropped. Transcripts written in the older whole-file format
//! (`<session_id>.json`, a single JSON array of pairs) are still readable and
//! are migrated to the log format on the next append.

mod error;
mod store;

pub use error::ChatLogError;
pub use store::{
    find_latest_summary, validate_session_id, ChatLogStore, NO_SUMMARY, SUMMARY_MARKER,
};
