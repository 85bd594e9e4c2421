//! Symmetric key management and secret encryption.
//!
//! Secrets are encrypted with ChaCha20-Poly1305 under a single 256-bit key
//! kept in `encryption.key`. Every encryption draws a fresh random nonce, so
//! the same secret encrypts differently each time.
//!
//! Ciphertext format (hex-encoded): `nonce(12) || ciphertext || tag(16)`.
//!
//! The key is never generated implicitly. Losing or regenerating the key file
//! makes every previously encrypted setting permanently unreadable.

use chacha20poly1305::{aead::Aead, ChaCha20Poly1305, Key, KeyInit, Nonce};
use narrator_types::DataLayout;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::VaultError;

/// Size of the symmetric key in bytes.
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;

/// Minimum decoded ciphertext length: 12 bytes nonce + 16 bytes auth tag.
const AEAD_OVERHEAD: usize = NONCE_LEN + 16;

/// Encrypts and decrypts opaque secret strings.
///
/// The settings store depends on this trait rather than on [`KeyStore`]
/// directly so it can be exercised with a fake cipher.
pub trait SecretCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, VaultError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, VaultError>;
}

impl<T: SecretCipher + ?Sized> SecretCipher for &T {
    fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        (**self).encrypt(plaintext)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, VaultError> {
        (**self).decrypt(ciphertext)
    }
}

/// A loaded 256-bit symmetric key.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Draws a new random key.
    pub fn generate() -> Self {
        Self(rand::random())
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }

    /// Encrypts `plaintext` under this key with a random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let nonce = Nonce::from(nonce_bytes);
        let ciphertext = self
            .cipher()
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::Encryption)?;

        let mut output = nonce_bytes.to_vec();
        output.extend_from_slice(&ciphertext);
        Ok(hex::encode(output))
    }

    /// Decrypts a hex-encoded ciphertext produced by [`EncryptionKey::encrypt`].
    ///
    /// Fails on malformed hex, truncated input, tampering, a foreign key, or
    /// plaintext that is not UTF-8.
    ///
    /// Only the exact lowercase-hex form produced by `encrypt` is accepted, so
    /// every changed character is a changed ciphertext.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, VaultError> {
        if !ciphertext
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(VaultError::Decryption("ciphertext is not lowercase hex".into()));
        }
        let data = hex::decode(ciphertext)
            .map_err(|e| VaultError::Decryption(format!("ciphertext is not valid hex: {e}")))?;

        if data.len() < AEAD_OVERHEAD {
            return Err(VaultError::Decryption(format!(
                "ciphertext too short: {} bytes (minimum {})",
                data.len(),
                AEAD_OVERHEAD
            )));
        }

        let (nonce_bytes, sealed) = data.split_at(NONCE_LEN);
        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| {
                VaultError::Decryption("authentication failed (tampered data or wrong key)".into())
            })?;

        String::from_utf8(plaintext)
            .map_err(|_| VaultError::Decryption("plaintext is not valid UTF-8".into()))
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// File-backed owner of the encryption key.
#[derive(Debug, Clone)]
pub struct KeyStore {
    key_file: PathBuf,
}

impl KeyStore {
    /// Key store rooted at the layout's `encryption.key`.
    pub fn new(layout: &DataLayout) -> Self {
        Self::at(layout.key_file())
    }

    /// Key store backed by an explicit key file path.
    pub fn at(key_file: impl Into<PathBuf>) -> Self {
        Self {
            key_file: key_file.into(),
        }
    }

    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    pub fn has_key(&self) -> bool {
        self.key_file.is_file()
    }

    /// Writes a brand-new key, replacing any existing one.
    ///
    /// Destructive: settings encrypted under the previous key can no longer
    /// be decrypted.
    pub fn generate_key(&self) -> Result<(), VaultError> {
        let key = EncryptionKey::generate();
        narrator_types::fs::write_atomic(&self.key_file, key.as_bytes())
            .map_err(|e| VaultError::io("writing encryption key", &self.key_file, e))?;
        tracing::warn!(
            path = %self.key_file.display(),
            "generated new encryption key; previously encrypted settings are no longer readable"
        );
        Ok(())
    }

    /// Reads the key from disk.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` when the file is absent, `InvalidKey` when it is not
    /// exactly 32 bytes, `StorageIo` for any other read failure.
    pub fn load_key(&self) -> Result<EncryptionKey, VaultError> {
        let bytes = match std::fs::read(&self.key_file) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VaultError::KeyNotFound {
                    path: self.key_file.clone(),
                });
            }
            Err(e) => return Err(VaultError::io("reading encryption key", &self.key_file, e)),
        };

        let len = bytes.len();
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| VaultError::InvalidKey {
            path: self.key_file.clone(),
            len,
        })?;
        Ok(EncryptionKey::from_bytes(key))
    }
}

impl SecretCipher for KeyStore {
    fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        self.load_key()?.encrypt(plaintext)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, VaultError> {
        self.load_key()?.decrypt(ciphertext)
    }
}

impl SecretCipher for EncryptionKey {
    fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        EncryptionKey::encrypt(self, plaintext)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, VaultError> {
        EncryptionKey::decrypt(self, ciphertext)
    }
}
