//! Narrator binary: the command-line entry point.

use clap::Parser;
use narrator_cli::cli::Cli;
use std::process::ExitCode;

fn resolve_config_path(cli_arg: Option<String>) -> (Option<String>, &'static str) {
    if let Some(path) = cli_arg.filter(|value| !value.trim().is_empty()) {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("NARRATOR_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (resolved_config_path, config_source) = resolve_config_path(cli.config);
    let selected_config_path = resolved_config_path.as_deref().or(Some("narrator.toml"));

    let config = match narrator_cli::config::load_config(selected_config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    narrator_cli::init_logging(&config.logging);

    tracing::debug!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        data_dir = %config.storage.data_dir.display(),
        "resolved startup configuration"
    );

    match narrator_cli::run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(hint) = e.hint() {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}
