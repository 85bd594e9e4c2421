//! Persistent user settings with field-level encryption.
//!
//! Settings are a flat JSON object of string values in
//! `user_settings.json`. Only the sensitive fields (currently `api_key`) are
//! stored as ciphertext; everything else stays plaintext so the file remains
//! inspectable and new non-sensitive fields can be added without touching
//! existing secrets.
//!
//! In memory a [`UserSettings`] always holds plaintext. Encryption happens on
//! a private copy during [`SettingsStore::save`], so a value that was just
//! decrypted can never be encrypted twice.

use narrator_types::DataLayout;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::VaultError;
use crate::keystore::SecretCipher;

/// Setting holding the speech-service API credential.
pub const API_KEY: &str = "api_key";

/// Setting holding the conversational agent identifier.
pub const AGENT_ID: &str = "agent_id";

/// Fields that are encrypted at rest.
pub const SENSITIVE_FIELDS: &[&str] = &[API_KEY];

/// Environment fallback for [`API_KEY`].
pub const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Environment fallback for [`AGENT_ID`].
pub const AGENT_ID_ENV: &str = "AGENT_ID";

/// Whether `name` is stored encrypted.
pub fn is_sensitive(name: &str) -> bool {
    SENSITIVE_FIELDS.contains(&name)
}

/// User configuration: setting name to plaintext value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserSettings(BTreeMap<String, String>);

impl UserSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.get(API_KEY)
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.get(AGENT_ID)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UserSettings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Debug for UserSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.0 {
            if is_sensitive(name) {
                map.entry(name, &"[REDACTED]");
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

/// Reads and writes `user_settings.json` through an injected cipher.
#[derive(Debug, Clone)]
pub struct SettingsStore<C> {
    path: PathBuf,
    cipher: C,
}

impl<C: SecretCipher> SettingsStore<C> {
    /// Settings store at the layout's `user_settings.json`.
    pub fn new(layout: &DataLayout, cipher: C) -> Self {
        Self::at(layout.settings_file(), cipher)
    }

    pub fn at(path: impl Into<PathBuf>, cipher: C) -> Self {
        Self {
            path: path.into(),
            cipher,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    /// Encrypts the sensitive fields and atomically replaces the settings file.
    pub fn save(&self, settings: &UserSettings) -> Result<(), VaultError> {
        let mut sealed = settings.clone();
        for (name, value) in sealed.0.iter_mut() {
            if is_sensitive(name) {
                *value = self.cipher.encrypt(value)?;
            }
        }

        let json = serde_json::to_vec_pretty(&sealed).map_err(|source| VaultError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        narrator_types::fs::write_atomic(&self.path, &json)
            .map_err(|e| VaultError::io("writing settings", &self.path, e))?;

        tracing::info!(path = %self.path.display(), fields = sealed.len(), "saved user settings");
        Ok(())
    }

    /// Loads settings, decrypting sensitive fields.
    ///
    /// A missing file is a first run and yields empty settings. Decryption
    /// failures are returned as-is and must not be treated as absence.
    pub fn load(&self) -> Result<UserSettings, VaultError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no settings file, starting fresh");
                return Ok(UserSettings::new());
            }
            Err(e) => return Err(VaultError::io("reading settings", &self.path, e)),
        };

        let mut settings: UserSettings =
            serde_json::from_slice(&raw).map_err(|source| VaultError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        for (name, value) in settings.0.iter_mut() {
            if is_sensitive(name) {
                *value = self.cipher.decrypt(value)?;
            }
        }
        Ok(settings)
    }

    /// Loads, applies `f`, and saves the result.
    pub fn update<F>(&self, f: F) -> Result<UserSettings, VaultError>
    where
        F: FnOnce(&mut UserSettings),
    {
        let mut settings = self.load()?;
        f(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }

    /// Deletes the settings file so the next load is a first run.
    ///
    /// This is the recovery path after a decryption failure.
    pub fn reset(&self) -> Result<(), VaultError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::warn!(path = %self.path.display(), "user settings reset");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VaultError::io("removing settings", &self.path, e)),
        }
    }
}

/// Credentials needed to reach the speech service and voice agent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub agent_id: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("agent_id", &self.agent_id)
            .finish()
    }
}

/// Resolves credentials from saved settings, then the process environment.
pub fn resolve_credentials(settings: &UserSettings) -> Credentials {
    resolve_credentials_with(settings, |name| std::env::var(name).ok())
}

/// Like [`resolve_credentials`] with an explicit environment lookup.
///
/// Blank values count as absent at every level.
pub fn resolve_credentials_with<F>(settings: &UserSettings, env: F) -> Credentials
where
    F: Fn(&str) -> Option<String>,
{
    let pick = |setting: &str, var: &str| {
        settings
            .get(setting)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| {
                env(var)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
    };

    Credentials {
        api_key: pick(API_KEY, API_KEY_ENV),
        agent_id: pick(AGENT_ID, AGENT_ID_ENV),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Reversible stand-in cipher that counts calls.
    #[derive(Default)]
    struct FakeCipher {
        encrypts: Cell<usize>,
        decrypts: Cell<usize>,
    }

    impl SecretCipher for FakeCipher {
        fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
            self.encrypts.set(self.encrypts.get() + 1);
            Ok(format!("enc({plaintext})"))
        }

        fn decrypt(&self, ciphertext: &str) -> Result<String, VaultError> {
            self.decrypts.set(self.decrypts.get() + 1);
            ciphertext
                .strip_prefix("enc(")
                .and_then(|rest| rest.strip_suffix(')'))
                .map(str::to_string)
                .ok_or_else(|| VaultError::Decryption("not sealed by FakeCipher".into()))
        }
    }

    fn store() -> (tempfile::TempDir, SettingsStore<FakeCipher>) {
        let temp = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(temp.path().join("user_settings.json"), FakeCipher::default());
        (temp, store)
    }

    #[test]
    fn only_sensitive_fields_pass_through_cipher() {
        let (_temp, store) = store();
        let settings: UserSettings = [(API_KEY, "sk-1"), (AGENT_ID, "agent-9")]
            .into_iter()
            .collect();

        store.save(&settings).unwrap();
        assert_eq!(store.cipher().encrypts.get(), 1);

        let on_disk: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk["api_key"], "enc(sk-1)");
        assert_eq!(on_disk["agent_id"], "agent-9");

        let loaded = store.load().unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(store.cipher().decrypts.get(), 1);
    }

    #[test]
    fn save_does_not_mutate_caller_settings() {
        let (_temp, store) = store();
        let mut settings = UserSettings::new();
        settings.set(API_KEY, "sk-1");

        store.save(&settings).unwrap();
        store.save(&settings).unwrap();

        assert_eq!(settings.api_key(), Some("sk-1"));
        assert_eq!(store.load().unwrap().api_key(), Some("sk-1"));
    }

    #[test]
    fn load_save_load_is_stable() {
        let (_temp, store) = store();
        let mut settings = UserSettings::new();
        settings.set(API_KEY, "sk-1");
        store.save(&settings).unwrap();

        let reloaded = store.load().unwrap();
        store.save(&reloaded).unwrap();
        assert_eq!(store.load().unwrap().api_key(), Some("sk-1"));
    }

    #[test]
    fn update_applies_closure() {
        let (_temp, store) = store();
        store.update(|s| {
            s.set(AGENT_ID, "a-1");
        })
        .unwrap();
        let after = store
            .update(|s| {
                s.set(API_KEY, "sk-2");
            })
            .unwrap();

        assert_eq!(after.agent_id(), Some("a-1"));
        assert_eq!(store.load().unwrap().api_key(), Some("sk-2"));
    }

    #[test]
    fn debug_redacts_sensitive_values() {
        let settings: UserSettings = [(API_KEY, "sk-secret"), (AGENT_ID, "agent-9")]
            .into_iter()
            .collect();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("agent-9"));
    }

    #[test]
    fn credentials_prefer_settings_over_env() {
        let settings: UserSettings = [(API_KEY, "from-settings")].into_iter().collect();
        let env = |name: &str| match name {
            API_KEY_ENV => Some("from-env".to_string()),
            AGENT_ID_ENV => Some("  agent-env ".to_string()),
            _ => None,
        };

        let creds = resolve_credentials_with(&settings, env);
        assert_eq!(creds.api_key.as_deref(), Some("from-settings"));
        assert_eq!(creds.agent_id.as_deref(), Some("agent-env"));
    }

    #[test]
    fn blank_values_count_as_absent() {
        let settings: UserSettings = [(API_KEY, "   ")].into_iter().collect();
        let creds = resolve_credentials_with(&settings, |_| Some(String::new()));
        assert_eq!(creds, Credentials::default());
    }
}
