//! Persistence operations for session transcripts.
//!
//! Writes go through [`ChatLogStore::append_exchange`], which appends the
//! user record and the bot record in a single write to the session's log.
//! Reads go through [`ChatLogStore::load_transcript`], which replays the log
//! oldest first.

use narrator_types::{DataLayout, DirectoryRole, Exchange, Speaker};
use std::collections::hash_map::DefaultHasher;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

use crate::error::ChatLogError;

/// Marker identifying bot messages that carry a summary.
pub const SUMMARY_MARKER: &str = "Summary:";

/// Returned by [`ChatLogStore::latest_summary`] when no summary exists.
pub const NO_SUMMARY: &str = "No summary available.";

const LOG_EXTENSION: &str = "jsonl";
const LEGACY_EXTENSION: &str = "json";
const MAX_SESSION_ID_LEN: usize = 200;
const LOCK_STRIPES: usize = 16;

/// Checks that `session_id` is usable as a file name inside the log directory.
pub fn validate_session_id(session_id: &str) -> Result<(), ChatLogError> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id != "."
        && session_id != ".."
        && !session_id
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control());

    if valid {
        Ok(())
    } else {
        Err(ChatLogError::InvalidSessionId(session_id.to_string()))
    }
}

/// Returns the most recent bot message containing [`SUMMARY_MARKER`].
pub fn find_latest_summary(transcript: &[Exchange]) -> Option<&str> {
    transcript
        .iter()
        .rev()
        .find(|entry| entry.speaker == Speaker::Bot && entry.message.contains(SUMMARY_MARKER))
        .map(|entry| entry.message.as_str())
}

/// File-backed store of per-session transcripts.
#[derive(Debug)]
pub struct ChatLogStore {
    dir: PathBuf,
    /// Serializes writes per session within this process. Sessions are
    /// hashed onto a fixed set of stripes, so unrelated sessions may share one.
    session_locks: [Mutex<()>; LOCK_STRIPES],
}

impl ChatLogStore {
    /// Store rooted at the layout's `chat_logs/` directory.
    pub fn new(layout: &DataLayout) -> Self {
        Self::at(layout.dir(DirectoryRole::ChatLogs))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            session_locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the append-only log for `session_id`.
    pub fn log_path(&self, session_id: &str) -> Result<PathBuf, ChatLogError> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("{session_id}.{LOG_EXTENSION}")))
    }

    fn legacy_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.{LEGACY_EXTENSION}"))
    }

    fn session_lock(&self, session_id: &str) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        session_id.hash(&mut hasher);
        let stripe = (hasher.finish() % LOCK_STRIPES as u64) as usize;
        self.session_locks[stripe]
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Records one exchange: the user's message, then the bot's response.
    pub fn append_exchange(
        &self,
        session_id: &str,
        user_message: &str,
        bot_response: &str,
    ) -> Result<(), ChatLogError> {
        self.append(
            session_id,
            &[Exchange::user(user_message), Exchange::bot(bot_response)],
        )
    }

    /// Appends `entries` in order as a single write.
    pub fn append(&self, session_id: &str, entries: &[Exchange]) -> Result<(), ChatLogError> {
        let path = self.log_path(session_id)?;
        if entries.is_empty() {
            return Ok(());
        }

        let _guard = self.session_lock(session_id);

        self.migrate_legacy(session_id, &path)?;

        let mut batch = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut batch, entry)?;
            batch.push(b'\n');
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| ChatLogError::io("opening chat log for append", &path, e))?;

        drop_torn_tail(&mut file, &path)?;

        file.write_all(&batch)
            .map_err(|e| ChatLogError::io("appending to chat log", &path, e))?;
        file.sync_data()
            .map_err(|e| ChatLogError::io("syncing chat log", &path, e))?;

        tracing::debug!(session_id, records = entries.len(), "appended to chat log");
        Ok(())
    }

    /// Replays the transcript for `session_id`, oldest first.
    ///
    /// A session without a backing file yields an empty transcript.
    pub fn load_transcript(&self, session_id: &str) -> Result<Vec<Exchange>, ChatLogError> {
        let path = self.log_path(session_id)?;

        match std::fs::read(&path) {
            Ok(bytes) => replay(&path, &bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.load_legacy(&self.legacy_path(session_id))
            }
            Err(e) => Err(ChatLogError::io("reading chat log", &path, e)),
        }
    }

    /// The most recent summary produced in the session, or [`NO_SUMMARY`].
    pub fn latest_summary(&self, session_id: &str) -> Result<String, ChatLogError> {
        Ok(self
            .latest_summary_opt(session_id)?
            .unwrap_or_else(|| NO_SUMMARY.to_string()))
    }

    /// The most recent summary produced in the session, if any.
    pub fn latest_summary_opt(&self, session_id: &str) -> Result<Option<String>, ChatLogError> {
        let transcript = self.load_transcript(session_id)?;
        Ok(find_latest_summary(&transcript).map(str::to_string))
    }

    /// Replaces the whole transcript for `session_id`.
    pub fn save_transcript(
        &self,
        session_id: &str,
        transcript: &[Exchange],
    ) -> Result<(), ChatLogError> {
        let path = self.log_path(session_id)?;
        let _guard = self.session_lock(session_id);

        write_log(&path, transcript)?;
        remove_if_exists(&self.legacy_path(session_id))?;
        Ok(())
    }

    /// Ids of every session with a transcript on disk, sorted.
    pub fn list_sessions(&self) -> Result<Vec<String>, ChatLogError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ChatLogError::io("listing chat logs", &self.dir, e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ChatLogError::io("listing chat logs", &self.dir, e))?;
            let path = entry.path();
            let is_log = matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some(LOG_EXTENSION) | Some(LEGACY_EXTENSION)
            );
            if !is_log || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn load_legacy(&self, path: &Path) -> Result<Vec<Exchange>, ChatLogError> {
        match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| {
                ChatLogError::MalformedTranscript {
                    path: path.to_path_buf(),
                    source,
                }
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(ChatLogError::io("reading legacy transcript", path, e)),
        }
    }

    /// Moves a legacy whole-file transcript into the log format.
    fn migrate_legacy(&self, session_id: &str, log_path: &Path) -> Result<(), ChatLogError> {
        let legacy = self.legacy_path(session_id);
        if log_path.exists() || !legacy.exists() {
            return Ok(());
        }

        let transcript = self.load_legacy(&legacy)?;
        write_log(log_path, &transcript)?;
        remove_if_exists(&legacy)?;
        tracing::info!(
            session_id,
            records = transcript.len(),
            "migrated legacy transcript to append-only log"
        );
        Ok(())
    }
}

fn write_log(path: &Path, transcript: &[Exchange]) -> Result<(), ChatLogError> {
    let mut buf = Vec::new();
    for entry in transcript {
        serde_json::to_writer(&mut buf, entry)?;
        buf.push(b'\n');
    }
    narrator_types::fs::write_atomic(path, &buf)
        .map_err(|e| ChatLogError::io("writing chat log", path, e))
}

fn remove_if_exists(path: &Path) -> Result<(), ChatLogError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ChatLogError::io("removing legacy transcript", path, e)),
    }
}

/// Parses a log file. Only the final, unterminated line may be malformed.
fn replay(path: &Path, bytes: &[u8]) -> Result<Vec<Exchange>, ChatLogError> {
    let mut transcript = Vec::new();
    let terminated = bytes.last().map_or(true, |b| *b == b'\n');
    let lines: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
    let last_index = lines.len().saturating_sub(1);

    for (index, line) in lines.iter().enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<Exchange>(line) {
            Ok(entry) => transcript.push(entry),
            Err(source) if index == last_index && !terminated => {
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %source,
                    "dropping torn final chat log record"
                );
            }
            Err(source) => {
                return Err(ChatLogError::MalformedRecord {
                    path: path.to_path_buf(),
                    line: index + 1,
                    source,
                });
            }
        }
    }

    Ok(transcript)
}

/// Truncates a trailing partial line left by an interrupted append.
///
/// Reads only the end of the file: one byte when the log is newline
/// terminated, otherwise backwards in chunks to the previous newline.
fn drop_torn_tail(file: &mut std::fs::File, path: &Path) -> Result<(), ChatLogError> {
    let len = file
        .metadata()
        .map_err(|e| ChatLogError::io("inspecting chat log", path, e))?
        .len();
    if len == 0 {
        return Ok(());
    }

    let read_err = |e: std::io::Error| ChatLogError::io("reading chat log tail", path, e);
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(read_err)?;
    if last[0] == b'\n' {
        return Ok(());
    }

    let keep = line_start_before(file, len).map_err(read_err)?;
    let mut tail = Vec::with_capacity((len - keep) as usize);
    file.seek(SeekFrom::Start(keep))
        .and_then(|_| std::io::Read::by_ref(file).take(len - keep).read_to_end(&mut tail))
        .map_err(read_err)?;

    // A complete record that merely lacks its newline is kept.
    if serde_json::from_slice::<Exchange>(&tail).is_ok() {
        file.write_all(b"\n")
            .map_err(|e| ChatLogError::io("terminating chat log record", path, e))?;
        return Ok(());
    }

    tracing::warn!(
        path = %path.display(),
        dropped_bytes = tail.len(),
        "truncating torn chat log record before append"
    );
    file.set_len(keep)
        .map_err(|e| ChatLogError::io("truncating torn chat log record", path, e))?;
    Ok(())
}

const TAIL_CHUNK: u64 = 4096;

/// Offset just past the last newline before `end`, or 0 if there is none.
fn line_start_before(file: &mut std::fs::File, end: u64) -> std::io::Result<u64> {
    let mut chunk = vec![0u8; TAIL_CHUNK as usize];
    let mut pos = end;
    while pos > 0 {
        let size = pos.min(TAIL_CHUNK);
        pos -= size;
        let buf = &mut chunk[..size as usize];
        file.seek(SeekFrom::Start(pos))?;
        file.read_exact(buf)?;
        if let Some(idx) = buf.iter().rposition(|b| *b == b'\n') {
            return Ok(pos + idx as u64 + 1);
        }
    }
    Ok(0)
}
