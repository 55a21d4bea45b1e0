//! Cycle engine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tradebot_core::traits::{MarketDataSource, Notifier, PositionSource};
use tradebot_core::types::{
    ManagementEvent, PositionSummary, Timeframe, TimeframeSeries, TradingSignal,
};
use tradebot_indicators::IndicatorEngine;
use tradebot_risk::PositionManager;
use tradebot_signals::{SignalContext, SignalGenerator};

use crate::context::CycleContext;
use crate::report::{CycleReport, CycleStage};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Symbols scored every cycle
    pub symbols: Vec<String>,
    /// Timeframes fetched and aggregated for every symbol
    pub timeframes: Vec<Timeframe>,
    /// Candles requested per series
    pub candle_limit: usize,
    /// Minimum minutes between two signals for the same symbol
    pub signal_interval_mins: i64,
    /// Seconds between cycle starts
    pub cycle_interval_secs: u64,
    /// Auto-management settings snapshot
    pub snapshot_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: ["BTCUSDT", "ETHUSDT", "SOLUSDT"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeframes: vec![
                Timeframe::Minute1,
                Timeframe::Minute3,
                Timeframe::Minute5,
                Timeframe::Minute15,
                Timeframe::Minute30,
                Timeframe::Hour1,
            ],
            candle_limit: 200,
            signal_interval_mins: 15,
            cycle_interval_secs: 60,
            snapshot_path: Some(PathBuf::from("data/auto_management.json")),
        }
    }
}

/// External collaborators the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub data: Arc<dyn MarketDataSource>,
    pub positions: Arc<dyn PositionSource>,
    pub notifier: Arc<dyn Notifier>,
}

/// Runs cycles: data refresh, aggregation, scoring, then position management.
pub struct CycleEngine {
    config: EngineConfig,
    indicators: IndicatorEngine,
    generator: SignalGenerator,
    manager: PositionManager,
    io: Collaborators,
}

impl CycleEngine {
    pub fn new(
        config: EngineConfig,
        indicators: IndicatorEngine,
        generator: SignalGenerator,
        manager: PositionManager,
        io: Collaborators,
    ) -> Self {
        Self {
            config,
            indicators,
            generator,
            manager,
            io,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn generator(&self) -> &SignalGenerator {
        &self.generator
    }

    pub fn manager(&self) -> &PositionManager {
        &self.manager
    }

    /// Configured symbols plus the correlation reference, which is always
    /// aggregated so the regime factor has readings.
    fn scan_symbols(&self) -> Vec<String> {
        let mut symbols = self.config.symbols.clone();
        let reference = &self.generator.correlation().config().reference_symbol;
        if !symbols.contains(reference) {
            symbols.push(reference.clone());
        }
        symbols
    }

    /// Every configured timeframe of one symbol. A failing timeframe is
    /// logged and left out; the symbol fails only when nothing loaded.
    async fn fetch(&self, symbol: &str, report: &mut CycleReport) -> Option<TimeframeSeries> {
        let mut data = TimeframeSeries::new();
        let mut last_error = None;
        for &timeframe in &self.config.timeframes {
            match self
                .io
                .data
                .candles(symbol, timeframe, self.config.candle_limit)
                .await
            {
                Ok(series) if !series.is_empty() => {
                    data.insert(timeframe, series);
                }
                Ok(_) => debug!(symbol, timeframe = %timeframe, "Empty series"),
                Err(e) => {
                    debug!(symbol, timeframe = %timeframe, error = %e, "Candle fetch failed");
                    last_error = Some(e);
                }
            }
        }

        if data.is_empty() {
            let error = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no candles".to_string());
            warn!(symbol, error = %error, "Skipping symbol without market data");
            report.fail(symbol, CycleStage::Data, error);
            return None;
        }
        Some(data)
    }

    /// Run one full cycle at `now`.
    pub async fn run_cycle(&mut self, ctx: &mut CycleContext, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::new(ctx.cycles + 1, now);

        // Aggregate everything first so the reference readings are current
        // before any altcoin is scored.
        let mut market = Vec::new();
        for symbol in self.scan_symbols() {
            if let Some(data) = self.fetch(&symbol, &mut report).await {
                self.indicators.refresh(&mut ctx.results, &symbol, &data);
                report.aggregated.push(symbol.clone());
                market.push((symbol, data));
            }
        }

        let interval = Duration::minutes(self.config.signal_interval_mins);
        for (symbol, data) in &market {
            if !self.config.symbols.contains(symbol) {
                continue;
            }
            if ctx.recently_signalled(symbol, now, interval) {
                debug!(symbol = %symbol, "Inside re-fire interval");
                report.cooling_down.push(symbol.clone());
                continue;
            }
            let Some(readings) = ctx.results.get(symbol) else {
                continue;
            };

            let signal_ctx = SignalContext {
                symbol,
                readings,
                data,
                reference: self.generator.reference_readings(&ctx.results),
            };
            match self.generator.generate(signal_ctx, now) {
                Ok(Some(signal)) => {
                    ctx.record_signal(symbol, now);
                    self.deliver_signal(&signal, &mut report).await;
                    report.signals.push(signal);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Signal generation failed");
                    report.fail(symbol, CycleStage::Signal, e);
                }
            }
        }

        self.manage_positions(ctx, now, &mut report).await;

        ctx.cycles += 1;
        report.stats = self.generator.stats().clone();
        report.finished_at = Utc::now().max(now);
        info!(
            cycle = report.cycle,
            aggregated = report.aggregated.len(),
            signals = report.signals.len(),
            events = report.events.len(),
            failures = report.failures.len(),
            "Cycle complete"
        );
        report
    }

    async fn manage_positions(
        &self,
        ctx: &mut CycleContext,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) {
        let mut events = self.sync_settings(ctx, now);

        match self.io.positions.open_positions().await {
            Ok(mut positions) => {
                self.manager.mark_managed(&ctx.risk, &mut positions);
                events.extend(self.manager.reconcile(&mut ctx.risk, &positions, now));

                for position in positions.iter().filter(|p| p.auto_managed) {
                    match self.manager.manage(&mut ctx.risk, position, now) {
                        Ok(position_events) => events.extend(position_events),
                        Err(e) => {
                            warn!(
                                symbol = %position.symbol,
                                error = %e,
                                "Position management failed"
                            );
                            report.fail(&position.symbol, CycleStage::Management, e);
                        }
                    }
                }
                report.positions = PositionSummary::from_positions(&positions);
            }
            Err(e) => {
                warn!(
                    source = self.io.positions.name(),
                    error = %e,
                    "Position lookup failed"
                );
                report.fail("", CycleStage::Positions, e);
            }
        }

        for event in &events {
            if let Err(e) = self.io.notifier.send_event(event).await {
                warn!(
                    symbol = event.symbol(),
                    kind = event.kind(),
                    error = %e,
                    "Event delivery failed"
                );
                report.fail(event.symbol(), CycleStage::Notify, e);
            }
        }
        report.events = events;
    }

    /// Adopt enable/disable changes made to the snapshot file while running.
    /// Disabled symbols yield `Closed` events.
    fn sync_settings(
        &self,
        ctx: &mut CycleContext,
        now: DateTime<Utc>,
    ) -> Vec<ManagementEvent> {
        let Some(path) = &self.config.snapshot_path else {
            return Vec::new();
        };
        match ctx.sync_snapshot(path) {
            Ok(merge) => merge
                .disabled
                .into_iter()
                .map(|symbol| ManagementEvent::Closed {
                    symbol,
                    reason: "management disabled".to_string(),
                    timestamp: now,
                })
                .collect(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Snapshot sync failed");
                Vec::new()
            }
        }
    }

    async fn deliver_signal(&self, signal: &TradingSignal, report: &mut CycleReport) {
        if let Err(e) = self.io.notifier.send_signal(signal).await {
            warn!(symbol = %signal.symbol, error = %e, "Signal delivery failed");
            report.fail(&signal.symbol, CycleStage::Notify, e);
        }
    }

    /// Run cycles on the configured cadence until `shutdown` resolves.
    ///
    /// A cycle in progress always runs to completion. The settings snapshot
    /// is written on the way out. Returns the number of cycles run.
    pub async fn run(
        &mut self,
        ctx: &mut CycleContext,
        shutdown: impl Future<Output = ()>,
    ) -> u64 {
        let period = std::time::Duration::from_secs(self.config.cycle_interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            symbols = ?self.config.symbols,
            interval_secs = period.as_secs(),
            "Engine started"
        );

        let mut ran = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle(ctx, Utc::now()).await;
                    ran += 1;
                }
            }
        }

        if let Some(path) = &self.config.snapshot_path {
            // Keep changes made since the last cycle
            if let Err(e) = ctx.sync_snapshot(path) {
                warn!(path = %path.display(), error = %e, "Snapshot sync failed");
            }
            ctx.save_snapshot(path, Utc::now());
        }
        info!(cycles = ran, "Engine stopped");
        ran
    }
}
