pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::fetch::{FetchOptions, RunEntry};
use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Fetch(FetchOptions),
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

/// Runs a fetch and returns what was written for every instrument.
pub async fn fetch(options: &FetchOptions, config_path: Option<&str>) -> Result<Vec<RunEntry>> {
    let config = load_config(config_path)?;
    cli::fetch::fetch(&config, options).await
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("ledgerfx starting...");

    match command {
        AppCommand::Fetch(options) => {
            fetch(&options, config_path).await?;
        }
    }
    Ok(())
}
