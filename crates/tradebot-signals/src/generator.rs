//! Signal generation from scored readings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tradebot_core::error::SignalError;
use tradebot_core::types::{IndicatorReading, IndicatorResultSet, TimeframeSeries, TradingSignal};
use tradebot_indicators::ResultStore;

use crate::correlation::CorrelationFactor;
use crate::pattern::PatternRecognizer;
use crate::plan::PlanBuilder;
use crate::scorer::SignalScorer;

/// Inputs for one symbol in one cycle.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    pub symbol: &'a str,
    pub readings: &'a IndicatorResultSet,
    pub data: &'a TimeframeSeries,
    /// Reference symbol readings on the correlation timeframe
    pub reference: &'a [IndicatorReading],
}

/// Outcome counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorStats {
    pub evaluated: u64,
    pub generated: u64,
    pub below_threshold: u64,
    pub no_direction: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    scorer: SignalScorer,
    patterns: PatternRecognizer,
    correlation: CorrelationFactor,
    plan: PlanBuilder,
    stats: GeneratorStats,
}

impl SignalGenerator {
    pub fn new(
        scorer: SignalScorer,
        patterns: PatternRecognizer,
        correlation: CorrelationFactor,
        plan: PlanBuilder,
    ) -> Self {
        Self {
            scorer,
            patterns,
            correlation,
            plan,
            stats: GeneratorStats::default(),
        }
    }

    pub fn stats(&self) -> &GeneratorStats {
        &self.stats
    }

    pub fn scorer(&self) -> &SignalScorer {
        &self.scorer
    }

    pub fn correlation(&self) -> &CorrelationFactor {
        &self.correlation
    }

    /// Readings the correlation factor is computed from.
    pub fn reference_readings<'a>(&self, store: &'a ResultStore) -> &'a [IndicatorReading] {
        let cfg = self.correlation.config();
        store.readings(&cfg.reference_symbol, cfg.timeframe)
    }

    /// Score a symbol and, if it clears the minimum with a clear direction,
    /// build its trade plan.
    ///
    /// `Ok(None)` is the normal no-signal outcome. Errors only come from plan
    /// construction.
    pub fn generate(
        &mut self,
        ctx: SignalContext<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<TradingSignal>, SignalError> {
        if ctx.readings.is_empty() {
            return Ok(None);
        }
        self.stats.evaluated += 1;

        let pattern = ctx
            .data
            .get(&self.patterns.config().timeframe)
            .and_then(|series| self.patterns.detect(series));
        let bonus = pattern.as_ref().map(|p| p.bonus).unwrap_or(0.0);
        let factor = self.correlation.factor(ctx.symbol, ctx.reference);

        let breakdown = self.scorer.score(ctx.readings, bonus, factor);
        debug!(
            symbol = ctx.symbol,
            base = breakdown.base_score,
            bonus,
            factor,
            score = breakdown.final_score,
            "Scored"
        );

        if !self.scorer.passes(&breakdown) {
            self.stats.below_threshold += 1;
            return Ok(None);
        }
        let Some(direction) = breakdown.direction else {
            self.stats.no_direction += 1;
            debug!(
                symbol = ctx.symbol,
                buy = breakdown.buy_strength,
                sell = breakdown.sell_strength,
                "No clear direction"
            );
            return Ok(None);
        };

        let signal = match self.plan.build(
            ctx.symbol,
            direction,
            breakdown.final_score,
            ctx.readings,
            ctx.data,
            pattern.as_ref(),
            now,
        ) {
            Ok(signal) => signal,
            Err(e) => {
                self.stats.failed += 1;
                return Err(e);
            }
        };

        self.stats.generated += 1;
        info!(
            symbol = ctx.symbol,
            direction = %signal.direction,
            score = signal.score,
            entry = signal.entry_price,
            "Signal generated"
        );
        Ok(Some(signal))
    }
}
