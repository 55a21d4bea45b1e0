//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use tradebot_config::{default_config_toml, load_config};

pub fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Log level: {}", config.logging.level);
            println!("Symbols: {}", config.trading.symbols.join(", "));
            println!(
                "Timeframes: {}",
                config
                    .trading
                    .timeframes
                    .iter()
                    .map(|tf| tf.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!("Indicators: {}", config.indicators.len());
            println!("Minimum score: {}", config.scoring.min_score);
            println!("Reference symbol: {}", config.correlation.reference_symbol);
            println!("Capital: {}", config.sizing.capital);
            println!(
                "Leverage: {}x (range {}x-{}x)",
                config.sizing.base_leverage, config.sizing.min_leverage, config.sizing.max_leverage
            );
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

pub fn print_default() -> Result<()> {
    print!("{}", default_config_toml()?);
    Ok(())
}
