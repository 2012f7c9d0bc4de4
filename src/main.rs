//! clipcoach - Gameplay clip feedback from the terminal
//!
//! Entry point for the clipcoach CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clipcoach::cli::{Cli, Commands};
use clipcoach::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clipcoach::cli::completions::print(shell);
        return Ok(());
    }

    // Load configuration only for runtime commands.
    let settings = Settings::load()?;
    let to_file = matches!(cli.command, Commands::Tui);
    init_logging(&settings, cli.verbose, to_file)?;

    match cli.command {
        Commands::Upload { file, url, json } => {
            clipcoach::cli::commands::upload_video(&settings, file, url, json).await?;
        }
        Commands::Gallery {
            no_thumbnails,
            json,
        } => {
            clipcoach::cli::commands::show_gallery(&settings, !no_thumbnails, json).await?;
        }
        Commands::Thumbnail { id } => {
            clipcoach::cli::commands::generate_thumbnail(&settings, &id).await?;
        }
        Commands::Feedback { id, json } => {
            clipcoach::cli::commands::show_feedback(&settings, &id, json).await?;
        }
        Commands::Chat {
            id,
            message,
            summary,
        } => {
            clipcoach::cli::commands::chat(&settings, &id, message, summary).await?;
        }
        Commands::Tui => {
            clipcoach::tui::run(&settings).await?;
        }
        Commands::Doctor { json } => {
            clipcoach::cli::commands::run_doctor(&settings, json).await?;
        }
        Commands::Config(config_cmd) => {
            clipcoach::cli::commands::config_command(&settings, config_cmd)?;
        }
        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}

/// Logs go to stderr, or to a file while the TUI owns the terminal.
fn init_logging(settings: &Settings, verbose: bool, to_file: bool) -> Result<()> {
    let default_level = if verbose {
        "debug"
    } else {
        settings.general.log_level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if to_file {
        settings.ensure_dirs()?;
        let path = settings.log_path();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}
