//! Configuration loading from file and environment variables.

use narrator_retention::RetentionPolicy;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Where persisted data lives.
    #[serde(default)]
    pub storage: StorageConfig,

    /// File-age limits and the scheduled sweep interval.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for the key, settings, and managed directories.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Retention configuration. A day count of zero disables sweeping.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Maximum age for chat logs, audio, and uploads.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,

    /// Maximum age for scratch files.
    #[serde(default = "default_temp_max_age_days")]
    pub temp_max_age_days: u64,

    /// Seconds between passes of `narrator retention run`.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "narrator_chatlog=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_max_age_days() -> u64 {
    7
}

fn default_temp_max_age_days() -> u64 {
    1
}

fn default_interval_seconds() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
            temp_max_age_days: default_temp_max_age_days(),
            interval_seconds: default_interval_seconds(),
        }
    }
}

impl RetentionConfig {
    pub fn policy(&self) -> RetentionPolicy {
        RetentionPolicy::from_days(self.max_age_days, self.temp_max_age_days)
    }

    /// Sweep interval, never shorter than one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `NARRATOR_DATA_DIR` overrides `storage.data_dir`
/// - `NARRATOR_RETENTION_DAYS` overrides `retention.max_age_days`
/// - `NARRATOR_RETENTION_INTERVAL` overrides `retention.interval_seconds`
/// - `NARRATOR_LOG_LEVEL` overrides `logging.level`
/// - `NARRATOR_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Applies `NARRATOR_*` overrides looked up through `var`.
///
/// Values that fail to parse are ignored with a warning.
pub fn apply_env_overrides<F>(config: &mut Config, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = var("NARRATOR_DATA_DIR").filter(|d| !d.trim().is_empty()) {
        config.storage.data_dir = PathBuf::from(dir);
    }
    if let Some(days) = var("NARRATOR_RETENTION_DAYS") {
        match days.trim().parse() {
            Ok(parsed) => config.retention.max_age_days = parsed,
            Err(_) => tracing::warn!(value = %days, "ignoring invalid NARRATOR_RETENTION_DAYS"),
        }
    }
    if let Some(interval) = var("NARRATOR_RETENTION_INTERVAL") {
        match interval.trim().parse() {
            Ok(parsed) => config.retention.interval_seconds = parsed,
            Err(_) => {
                tracing::warn!(value = %interval, "ignoring invalid NARRATOR_RETENTION_INTERVAL");
            }
        }
    }
    if let Some(level) = var("NARRATOR_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("NARRATOR_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
