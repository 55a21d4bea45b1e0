//! Continuous run command.

use anyhow::Result;
use tracing::{info, warn};
use tradebot_config::AppConfig;

use super::{build_engine, load_context};

pub async fn run(config: AppConfig) -> Result<()> {
    info!(
        name = %config.app.name,
        data_dir = %config.app.data_dir.display(),
        positions = %config.app.positions_file.display(),
        "Starting tradebot"
    );

    let mut engine = build_engine(&config)?;
    let mut ctx = load_context(&config)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C; stop the process to exit");
            std::future::pending::<()>().await;
        }
    };

    let cycles = engine.run(&mut ctx, shutdown).await;
    let stats = engine.generator().stats();
    info!(
        cycles,
        evaluated = stats.evaluated,
        generated = stats.generated,
        "Tradebot stopped"
    );
    Ok(())
}
