//! Cycle report generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tradebot_core::types::{ManagementEvent, PositionSummary, TradingSignal};
use tradebot_signals::GeneratorStats;

/// Where in the cycle a symbol failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStage {
    Data,
    Signal,
    Positions,
    Management,
    Notify,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CycleStage::Data => "data",
            CycleStage::Signal => "signal",
            CycleStage::Positions => "positions",
            CycleStage::Management => "management",
            CycleStage::Notify => "notify",
        };
        f.write_str(label)
    }
}

/// An isolated failure; the rest of the cycle continued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolFailure {
    /// Empty for account-wide stages such as the position lookup
    pub symbol: String,
    pub stage: CycleStage,
    pub error: String,
}

/// What one cycle did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Symbols with fresh indicator results
    pub aggregated: Vec<String>,
    /// Symbols skipped inside their re-fire interval
    pub cooling_down: Vec<String>,
    pub signals: Vec<TradingSignal>,
    pub events: Vec<ManagementEvent>,
    pub positions: PositionSummary,
    pub failures: Vec<SymbolFailure>,
    /// Generator counters, cumulative over the engine's life
    pub stats: GeneratorStats,
}

impl CycleReport {
    pub fn new(cycle: u64, started_at: DateTime<Utc>) -> Self {
        Self {
            cycle,
            started_at,
            finished_at: started_at,
            aggregated: Vec::new(),
            cooling_down: Vec::new(),
            signals: Vec::new(),
            events: Vec::new(),
            positions: PositionSummary::default(),
            failures: Vec::new(),
            stats: GeneratorStats::default(),
        }
    }

    pub fn fail(&mut self, symbol: &str, stage: CycleStage, error: impl ToString) {
        self.failures.push(SymbolFailure {
            symbol: symbol.to_string(),
            stage,
            error: error.to_string(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str(&format!(
            "                      CYCLE {:<6}                      \n",
            self.cycle
        ));
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("SCAN\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Started:             {}\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        ));
        s.push_str(&format!(
            "  Duration:            {} ms\n",
            (self.finished_at - self.started_at).num_milliseconds()
        ));
        s.push_str(&format!("  Aggregated:          {}\n", self.aggregated.join(", ")));
        if !self.cooling_down.is_empty() {
            s.push_str(&format!("  Cooling down:        {}\n", self.cooling_down.join(", ")));
        }
        s.push_str(&format!(
            "  Evaluated/Generated: {}/{}\n",
            self.stats.evaluated, self.stats.generated
        ));
        s.push('\n');

        s.push_str("SIGNALS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        if self.signals.is_empty() {
            s.push_str("  none\n");
        }
        for signal in &self.signals {
            s.push_str(&format!(
                "  {:<10} {:<5} score {:>3}  entry {:.4}  stop {:.4}  {}x\n",
                signal.symbol,
                signal.direction,
                signal.score,
                signal.entry_price,
                signal.stop_loss,
                signal.leverage
            ));
        }
        s.push('\n');

        s.push_str("POSITIONS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Open:                {} ({} managed)\n",
            self.positions.count, self.positions.auto_managed
        ));
        s.push_str(&format!("  Total P&L:           {:.2}\n", self.positions.total_pnl));
        s.push_str(&format!("  Avg P&L:             {:.2}%\n", self.positions.avg_pnl_percentage));
        for event in &self.events {
            s.push_str(&format!("  {:<10} {}\n", event.symbol(), event.kind()));
        }
        s.push('\n');

        if !self.failures.is_empty() {
            s.push_str("FAILURES\n");
            s.push_str("───────────────────────────────────────────────────────────\n");
            for failure in &self.failures {
                s.push_str(&format!(
                    "  {:<10} [{}] {}\n",
                    failure.symbol, failure.stage, failure.error
                ));
            }
            s.push('\n');
        }

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
