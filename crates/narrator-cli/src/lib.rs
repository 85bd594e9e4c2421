//! The `narrator` command-line tool.
//!
//! Loads `narrator.toml`, initializes logging, opens the data directory, and
//! dispatches to the maintenance subcommands: key management, settings,
//! transcript inspection, and retention.

pub mod cli;
pub mod commands;
pub mod config;
pub mod retention;

use cli::{Commands, KeyAction, RetentionAction, SettingsAction};
use commands::CommandError;
use config::{Config, LoggingConfig};
use narrator_retention::Sweeper;
use narrator_types::DataLayout;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
pub fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Runs one subcommand against the configured data directory.
pub async fn run(command: Commands, config: &Config) -> Result<(), CommandError> {
    let layout = DataLayout::open(&config.storage.data_dir)?;
    let sweeper = Sweeper::new(&layout, config.retention.policy());
    let mut out = std::io::stdout();

    match command {
        Commands::Key { action } => match action {
            KeyAction::Generate { force } => commands::generate_key(&layout, force, &mut out),
        },
        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::show_settings(&layout, &mut out),
            SettingsAction::Set { name, value } => {
                commands::set_setting(&layout, &name, &value, &mut out)
            }
            SettingsAction::Reset => commands::reset_settings(&layout, &mut out),
        },
        Commands::History { session_id } => commands::history(&layout, &session_id, &mut out),
        Commands::Summary { session_id } => commands::summary(&layout, &session_id, &mut out),
        Commands::Sessions => commands::sessions(&layout, &mut out),
        Commands::Sweep => commands::sweep(&sweeper, &mut out),
        Commands::ClearTemp => commands::clear_temp(&sweeper, &mut out),
        Commands::Retention {
            action: RetentionAction::Run,
        } => {
            retention::run_retention_loop(
                sweeper,
                config.retention.interval(),
                retention::shutdown_signal(),
            )
            .await;
            Ok(())
        }
    }
}
