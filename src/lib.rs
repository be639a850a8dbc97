pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::convert::ConvertArgs;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Convert(ConvertArgs),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => core::config::AppConfig::load_with_path(path)?,
        None => core::config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Convert(args) => cli::convert::run(&config, &args).await,
    }
}
