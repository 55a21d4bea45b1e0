//! Single cycle command.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;
use tradebot_config::AppConfig;

use super::{build_engine, load_context};
use crate::cli::{OnceArgs, OutputFormat};

pub async fn run(args: OnceArgs, config: AppConfig) -> Result<()> {
    let mut engine = build_engine(&config)?;
    let mut ctx = load_context(&config)?;

    let report = engine.run_cycle(&mut ctx, Utc::now()).await;
    if let Some(path) = &config.trading.snapshot_path {
        ctx.save_snapshot(path, Utc::now());
    }

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(save_path) = &args.save {
        let json = report.to_json()?;
        std::fs::write(save_path, json)
            .with_context(|| format!("Failed to write report to {}", save_path.display()))?;
        info!("Report saved to {:?}", save_path);
    }

    Ok(())
}
