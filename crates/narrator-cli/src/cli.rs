//! Command-line definition.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "narrator")]
#[command(about = "Narrator: local storage and maintenance for document narration", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage the credential encryption key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Inspect or change saved user settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Print a session's transcript
    History { session_id: String },
    /// Print the most recent summary recorded in a session
    Summary { session_id: String },
    /// List sessions with a transcript on disk
    Sessions,
    /// Remove expired files from every managed directory once
    Sweep,
    /// Remove every file from the scratch directory
    ClearTemp,
    /// Scheduled retention
    Retention {
        #[command(subcommand)]
        action: RetentionAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum KeyAction {
    /// Create a new encryption key
    Generate {
        /// Replace an existing key; settings encrypted with it become unreadable
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Show settings with credentials masked
    Show,
    /// Set one setting
    Set { name: String, value: String },
    /// Delete all saved settings
    Reset,
}

#[derive(Debug, Subcommand)]
pub enum RetentionAction {
    /// Sweep on a timer until interrupted
    Run,
}
