//! Credential vault for Narrator.
//!
//! Two layers:
//!
//! - [`KeyStore`] owns the symmetric key file and seals/unseals secret
//!   strings with ChaCha20-Poly1305.
//! - [`SettingsStore`] persists [`UserSettings`] as JSON, encrypting the
//!   sensitive fields through any [`SecretCipher`] it is given.
//!
//! # Failure classes
//!
//! A missing settings file is a first run and loads as empty settings. A
//! missing key or a ciphertext that no longer authenticates is a different
//! class of failure ([`VaultError::is_unusable_store`]); callers should
//! offer a credential reset rather than silently recreating settings.

mod error;
mod keystore;
mod settings;

pub use error::VaultError;
pub use keystore::{EncryptionKey, KeyStore, SecretCipher, KEY_LEN};
pub use settings::{
    is_sensitive, resolve_credentials, resolve_credentials_with, Credentials, SettingsStore,
    UserSettings, AGENT_ID, AGENT_ID_ENV, API_KEY, API_KEY_ENV, SENSITIVE_FIELDS,
};
