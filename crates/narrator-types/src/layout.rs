//! On-disk layout of the Narrator data directory.
//!
//! ```text
//! <base>/
//!   encryption.key
//!   user_settings.json
//!   chat_logs/<session_id>.jsonl
//!   audio/
//!   uploaded/
//!   temp/
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

const KEY_FILE_NAME: &str = "encryption.key";
const SETTINGS_FILE_NAME: &str = "user_settings.json";

/// The managed directories under the base data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryRole {
    /// Per-session transcripts.
    ChatLogs,
    /// Synthesized audio output.
    Audio,
    /// Documents uploaded for extraction.
    Uploads,
    /// Scratch space for ephemeral working files.
    Temp,
}

impl DirectoryRole {
    /// Every role, in creation order.
    pub const ALL: [DirectoryRole; 4] = [
        DirectoryRole::ChatLogs,
        DirectoryRole::Audio,
        DirectoryRole::Uploads,
        DirectoryRole::Temp,
    ];

    /// Directory name relative to the base data directory.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::ChatLogs => "chat_logs",
            Self::Audio => "audio",
            Self::Uploads => "uploaded",
            Self::Temp => "temp",
        }
    }

    /// Whether the directory only ever holds disposable working files.
    pub fn is_scratch(self) -> bool {
        matches!(self, Self::Temp | Self::Uploads)
    }
}

/// Errors raised while preparing the data directory.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Paths for every persisted artifact, derived from one base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    base: PathBuf,
}

impl DataLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Builds the layout and creates every managed directory.
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::CreateDir` naming the first directory that
    /// could not be created.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self, LayoutError> {
        let layout = Self::new(base);
        layout.ensure()?;
        Ok(layout)
    }

    /// Creates the base directory and all four managed directories.
    ///
    /// Idempotent: existing directories are left untouched.
    pub fn ensure(&self) -> Result<(), LayoutError> {
        for role in DirectoryRole::ALL {
            let path = self.dir(role);
            std::fs::create_dir_all(&path)
                .map_err(|source| LayoutError::CreateDir { path, source })?;
        }
        tracing::debug!(base = %self.base.display(), "data directories ready");
        Ok(())
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn key_file(&self) -> PathBuf {
        self.base.join(KEY_FILE_NAME)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base.join(SETTINGS_FILE_NAME)
    }

    pub fn dir(&self, role: DirectoryRole) -> PathBuf {
        self.base.join(role.dir_name())
    }
}

/// Picks a file name in `dir` that does not exist yet.
///
/// Returns `file_name` itself when free, otherwise `stem_1.ext`,
/// `stem_2.ext`, ... until an unused name is found.
pub fn unique_file_name(dir: &Path, file_name: &str) -> String {
    if !dir.join(file_name).exists() {
        return file_name.to_string();
    }

    let (stem, ext) = match file_name.rfind('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], &file_name[idx..]),
        _ => (file_name, ""),
    };

    let mut counter: u32 = 1;
    loop {
        let candidate = format!("{stem}_{counter}{ext}");
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_all_managed_directories() {
        let temp = tempfile::tempdir().unwrap();
        let layout = DataLayout::open(temp.path().join("data")).unwrap();

        for role in DirectoryRole::ALL {
            assert!(layout.dir(role).is_dir(), "{:?} should exist", role);
        }
        assert_eq!(layout.dir(DirectoryRole::Uploads), temp.path().join("data/uploaded"));
        assert_eq!(layout.key_file(), temp.path().join("data/encryption.key"));
        assert_eq!(
            layout.settings_file(),
            temp.path().join("data/user_settings.json")
        );
    }

    #[test]
    fn ensure_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(temp.path());
        layout.ensure().unwrap();
        std::fs::write(layout.dir(DirectoryRole::Audio).join("a.mp3"), b"x").unwrap();
        layout.ensure().unwrap();
        assert!(layout.dir(DirectoryRole::Audio).join("a.mp3").exists());
    }

    #[test]
    fn unique_file_name_appends_counter() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path();

        assert_eq!(unique_file_name(dir, "notes.pdf"), "notes.pdf");
        std::fs::write(dir.join("notes.pdf"), b"").unwrap();
        assert_eq!(unique_file_name(dir, "notes.pdf"), "notes_1.pdf");
        std::fs::write(dir.join("notes_1.pdf"), b"").unwrap();
        assert_eq!(unique_file_name(dir, "notes.pdf"), "notes_2.pdf");
    }

    #[test]
    fn unique_file_name_without_extension() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("README"), b"").unwrap();
        assert_eq!(unique_file_name(temp.path(), "README"), "README_1");

        std::fs::write(temp.path().join(".env"), b"").unwrap();
        assert_eq!(unique_file_name(temp.path(), ".env"), ".env_1");
    }

    #[test]
    fn scratch_roles() {
        assert!(DirectoryRole::Temp.is_scratch());
        assert!(DirectoryRole::Uploads.is_scratch());
        assert!(!DirectoryRole::ChatLogs.is_scratch());
        assert!(!DirectoryRole::Audio.is_scratch());
    }
}
