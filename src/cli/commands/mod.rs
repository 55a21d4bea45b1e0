//! CLI command implementations.

pub mod indicators;
pub mod manage;
pub mod once;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use std::sync::Arc;
use tradebot_config::AppConfig;
use tradebot_data::{CsvDataSource, JsonPositionSource};
use tradebot_engine::{Collaborators, CycleContext, CycleEngine};
use tradebot_indicators::IndicatorEngine;
use tradebot_monitor::{FanoutNotifier, JsonlNotifier, LogNotifier, MessageFormatter};
use tradebot_risk::{PositionManager, PositionSizer};
use tradebot_signals::{
    CorrelationFactor, PatternRecognizer, PlanBuilder, SignalGenerator, SignalScorer,
};

/// Data, positions and notification channels from the app settings.
pub(crate) fn collaborators(config: &AppConfig) -> Collaborators {
    let mut notifier = FanoutNotifier::new().with(Arc::new(LogNotifier::new(
        MessageFormatter::new(config.sizing.capital),
    )));
    if let Some(path) = &config.app.notifications_file {
        notifier = notifier.with(Arc::new(JsonlNotifier::new(path.clone())));
    }

    Collaborators {
        data: Arc::new(CsvDataSource::new(config.app.data_dir.clone())),
        positions: Arc::new(JsonPositionSource::new(config.app.positions_file.clone())),
        notifier: Arc::new(notifier),
    }
}

pub(crate) fn indicator_engine(config: &AppConfig) -> Result<IndicatorEngine> {
    IndicatorEngine::from_specs(&config.indicators).context("Invalid indicator set")
}

pub(crate) fn build_engine(config: &AppConfig) -> Result<CycleEngine> {
    let generator = SignalGenerator::new(
        SignalScorer::new(config.scoring.clone()),
        PatternRecognizer::new(config.patterns.clone()),
        CorrelationFactor::new(config.correlation.clone()),
        PlanBuilder::new(config.plan.clone(), PositionSizer::new(config.sizing.clone())),
    );

    Ok(CycleEngine::new(
        config.trading.clone(),
        indicator_engine(config)?,
        generator,
        PositionManager::new(config.management.clone()),
        collaborators(config),
    ))
}

/// Cycle context seeded from the management snapshot when one is configured.
pub(crate) fn load_context(config: &AppConfig) -> Result<CycleContext> {
    match &config.trading.snapshot_path {
        Some(path) => CycleContext::from_snapshot(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display())),
        None => Ok(CycleContext::new()),
    }
}
