//! Error types for the key store and settings store.

use std::path::PathBuf;

/// Errors that can occur while handling keys, secrets, or settings.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The key file does not exist. Recoverable only by generating a key.
    #[error("encryption key not found at {path}; generate one first")]
    KeyNotFound { path: PathBuf },

    /// The key file exists but does not hold a 256-bit key.
    #[error("encryption key at {path} is {len} bytes; expected 32")]
    InvalidKey { path: PathBuf, len: usize },

    /// Ciphertext could not be authenticated or decoded under the current key.
    #[error("failed to decrypt secret: {0}")]
    Decryption(String),

    /// The AEAD primitive refused to encrypt the input.
    #[error("failed to encrypt secret")]
    Encryption,

    /// A filesystem operation failed.
    #[error("I/O error while {operation} at {path}: {source}")]
    StorageIo {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file exists but is not a JSON object of strings.
    #[error("settings file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl VaultError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StorageIo {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Whether the error means stored settings exist but cannot be read back.
    ///
    /// Callers use this to offer a credential reset instead of treating the
    /// store as a first run.
    pub fn is_unusable_store(&self) -> bool {
        matches!(
            self,
            Self::Decryption(_)
                | Self::KeyNotFound { .. }
                | Self::InvalidKey { .. }
                | Self::Malformed { .. }
        )
    }
}
