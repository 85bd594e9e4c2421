//! Subcommand handlers.
//!
//! Handlers write human-readable output to the given writer and leave
//! logging to `tracing`.

use narrator_chatlog::{ChatLogError, ChatLogStore};
use narrator_retention::{RetentionError, SweepReport, Sweeper};
use narrator_types::{DataLayout, DirectoryRole, LayoutError};
use narrator_vault::{
    is_sensitive, resolve_credentials, resolve_credentials_with, Credentials, KeyStore,
    SettingsStore, UserSettings, VaultError, AGENT_ID, AGENT_ID_ENV, API_KEY, API_KEY_ENV,
};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the command line.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    ChatLog(#[from] ChatLogError),

    #[error(transparent)]
    Retention(#[from] RetentionError),

    #[error("an encryption key already exists at {0}")]
    KeyExists(PathBuf),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl CommandError {
    /// A follow-up the user can take, if there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::KeyExists(_) => Some(
                "pass --force to replace it; settings encrypted with the old key become unreadable",
            ),
            Self::Vault(VaultError::KeyNotFound { .. }) => {
                Some("run `narrator key generate` to create an encryption key")
            }
            Self::Vault(e) if e.is_unusable_store() => {
                Some("run `narrator settings reset` and enter your credentials again")
            }
            _ => None,
        }
    }
}

/// Masks a secret, keeping only the last four characters.
pub fn mask_secret(value: &str) -> String {
    let count = value.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("****{tail}")
}

pub fn generate_key(
    layout: &DataLayout,
    force: bool,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let keys = KeyStore::new(layout);
    if keys.has_key() && !force {
        return Err(CommandError::KeyExists(keys.key_file().to_path_buf()));
    }
    keys.generate_key()?;
    writeln!(out, "wrote new encryption key to {}", keys.key_file().display())?;
    Ok(())
}

pub fn show_settings(layout: &DataLayout, out: &mut impl Write) -> Result<(), CommandError> {
    let settings = SettingsStore::new(layout, KeyStore::new(layout)).load()?;
    let resolved = resolve_credentials(&settings);
    write_settings(&settings, resolved, out)
}

/// [`show_settings`] with an explicit environment lookup.
///
/// Credentials missing from the settings file but supplied by the
/// environment are listed too, marked with the variable they came from.
pub fn show_settings_with<F>(
    layout: &DataLayout,
    env: F,
    out: &mut impl Write,
) -> Result<(), CommandError>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = SettingsStore::new(layout, KeyStore::new(layout)).load()?;
    let resolved = resolve_credentials_with(&settings, env);
    write_settings(&settings, resolved, out)
}

fn write_settings(
    settings: &UserSettings,
    resolved: Credentials,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    if settings.is_empty() {
        writeln!(out, "no settings saved")?;
    }
    for (name, value) in settings.iter() {
        if is_sensitive(name) {
            writeln!(out, "{name} = {}", mask_secret(value))?;
        } else {
            writeln!(out, "{name} = {value}")?;
        }
    }

    let from_env = [
        (API_KEY, API_KEY_ENV, resolved.api_key),
        (AGENT_ID, AGENT_ID_ENV, resolved.agent_id),
    ];
    for (name, var, value) in from_env {
        let saved = settings.get(name).is_some_and(|v| !v.trim().is_empty());
        if let (false, Some(value)) = (saved, value) {
            let shown = if is_sensitive(name) {
                mask_secret(&value)
            } else {
                value
            };
            writeln!(out, "{name} = {shown} (from {var})")?;
        }
    }
    Ok(())
}

pub fn set_setting(
    layout: &DataLayout,
    name: &str,
    value: &str,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let store = SettingsStore::new(layout, KeyStore::new(layout));
    store.update(|settings| {
        settings.set(name, value);
    })?;
    writeln!(out, "saved {name}")?;
    Ok(())
}

pub fn reset_settings(layout: &DataLayout, out: &mut impl Write) -> Result<(), CommandError> {
    SettingsStore::new(layout, KeyStore::new(layout)).reset()?;
    writeln!(out, "settings cleared")?;
    Ok(())
}

pub fn history(
    layout: &DataLayout,
    session_id: &str,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let transcript = ChatLogStore::new(layout).load_transcript(session_id)?;
    if transcript.is_empty() {
        writeln!(out, "no messages in session {session_id}")?;
    }
    for exchange in &transcript {
        writeln!(out, "{}: {}", exchange.speaker, exchange.message)?;
    }
    Ok(())
}

pub fn summary(
    layout: &DataLayout,
    session_id: &str,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let summary = ChatLogStore::new(layout).latest_summary(session_id)?;
    writeln!(out, "{summary}")?;
    Ok(())
}

pub fn sessions(layout: &DataLayout, out: &mut impl Write) -> Result<(), CommandError> {
    for session_id in ChatLogStore::new(layout).list_sessions()? {
        writeln!(out, "{session_id}")?;
    }
    Ok(())
}

/// Runs one sweep over every configured directory.
///
/// Every directory is swept even if an earlier one had failures; the first
/// failure is returned afterwards.
pub fn sweep(sweeper: &Sweeper, out: &mut impl Write) -> Result<(), CommandError> {
    let reports = sweeper.sweep_all();
    for (role, report) in &reports {
        write_report(out, *role, report)?;
    }
    for (_, report) in reports {
        report.into_result()?;
    }
    Ok(())
}

pub fn clear_temp(sweeper: &Sweeper, out: &mut impl Write) -> Result<(), CommandError> {
    let report = sweeper.clear_temp()?;
    write_report(out, DirectoryRole::Temp, &report)?;
    report.into_result()?;
    Ok(())
}

fn write_report(
    out: &mut impl Write,
    role: DirectoryRole,
    report: &SweepReport,
) -> std::io::Result<()> {
    write!(out, "{}: removed {}", role.dir_name(), report.removed)?;
    if !report.failures.is_empty() {
        write!(out, ", failed {}", report.failures.len())?;
    }
    writeln!(out)
}
