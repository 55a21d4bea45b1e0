//! Tradebot CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tradebot_config::{load_config, AppConfig, LogFormat};
use tradebot_monitor::{setup_logging, LogGuard};

fn init_logging(cli: &Cli, config: &AppConfig) -> Result<LogGuard> {
    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json = cli.json_logs || config.logging.format == LogFormat::Json;
    setup_logging(&level, json, config.logging.file.as_deref())
        .context("Failed to initialize logging")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // These two only print and never touch the log
    match &cli.command {
        Commands::ValidateConfig => return cli::commands::validate::run(&cli.config),
        Commands::DefaultConfig => return cli::commands::validate::print_default(),
        _ => {}
    }

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let _guard = init_logging(&cli, &config)?;

    match cli.command {
        Commands::Run => cli::commands::run::run(config).await,
        Commands::Once(args) => cli::commands::once::run(args, config).await,
        Commands::Indicators(args) => cli::commands::indicators::run(args, config).await,
        Commands::Manage(args) => cli::commands::manage::run(args, config).await,
        Commands::ValidateConfig | Commands::DefaultConfig => Ok(()),
    }
}
