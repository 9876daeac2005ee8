//! rrqueue - round-robin queue dispatcher CLI
//!
//! Loads the queue config, resolves connections through a `QueueManager`,
//! and prints each result as JSON.

#![allow(clippy::print_stdout, reason = "CLI output")]

use anyhow::{Context, Result};
use clap::Parser;
use rrqueue_core::config::{default_config_path, load_config};
use rrqueue_core::QueueManager;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path().context("Could not determine config directory")?,
    };

    match cli.command {
        Commands::Init { force } => commands::handle_init(&config_path, force),
        Commands::Push { job, payload, repeat, target } => {
            let manager = open_manager(&config_path)?;
            commands::handle_push(&manager, &job, payload.as_deref(), repeat, &target).await
        }
        Commands::PushRaw { payload, options, target } => {
            let manager = open_manager(&config_path)?;
            commands::handle_push_raw(&manager, &payload, options.as_deref(), &target).await
        }
        Commands::Later { delay, job, payload, target } => {
            let manager = open_manager(&config_path)?;
            commands::handle_later(&manager, delay, &job, payload.as_deref(), &target).await
        }
        Commands::Size { target } => {
            commands::handle_size(&open_manager(&config_path)?, &target).await
        }
        Commands::Pop { target } => commands::handle_pop(&open_manager(&config_path)?, &target).await,
        Commands::Status { connection } => {
            commands::handle_status(&open_manager(&config_path)?, connection.as_deref()).await
        }
    }
}

fn open_manager(config_path: &Path) -> Result<QueueManager> {
    let config = load_config(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let manager = QueueManager::from_app_config(&config)?;
    tracing::debug!(
        config = %config_path.display(),
        default = %manager.default_connection_name(),
        "Queue manager ready"
    );
    Ok(manager)
}
