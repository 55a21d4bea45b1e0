//! Position sizing and leverage for new trade plans.

use serde::{Deserialize, Serialize};

/// Capital and leverage limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Account capital the plan sizes against
    pub capital: f64,
    /// Largest share of capital a single position may use at score 100
    pub max_position_ratio: f64,
    /// Largest share of capital a stop-out may cost
    pub max_risk_per_trade: f64,
    pub base_leverage: u32,
    pub min_leverage: u32,
    pub max_leverage: u32,
    /// Volatility at which leverage is not penalized
    pub volatility_reference: f64,
    /// Excess volatility that takes the full base leverage away
    pub volatility_span: f64,
    /// Floor on the volatility factor
    pub min_volatility_factor: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            capital: 3000.0,
            max_position_ratio: 0.2,
            max_risk_per_trade: 0.02,
            base_leverage: 10,
            min_leverage: 5,
            max_leverage: 20,
            volatility_reference: 0.02,
            volatility_span: 0.06,
            min_volatility_factor: 0.5,
        }
    }
}

/// Result of sizing a plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    /// Position value to commit
    pub value: f64,
    /// Capital lost if the stop is hit
    pub risk_amount: f64,
    /// Stop distance as a fraction of entry
    pub stop_fraction: f64,
}

/// Sizes positions by score, capped by a per-trade loss budget.
#[derive(Debug, Clone, Default)]
pub struct PositionSizer {
    config: SizingConfig,
}

impl PositionSizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Capital allotted to an entry tranche holding `ratio` of the position.
    pub fn tranche_amount(&self, ratio: f64) -> f64 {
        self.config.capital * self.config.max_position_ratio * ratio
    }

    /// Size a position entered at `entry` with its stop at `stop`.
    ///
    /// The score-scaled allocation is capped so that a stop-out loses at
    /// most `max_risk_per_trade` of capital.
    pub fn size(&self, score: u8, entry: f64, stop: f64) -> PositionSize {
        let cfg = &self.config;
        let score_value = cfg.capital * cfg.max_position_ratio * f64::from(score) / 100.0;

        let stop_fraction = if entry > 0.0 {
            (entry - stop).abs() / entry
        } else {
            0.0
        };

        let value = if stop_fraction > 0.0 {
            score_value.min(cfg.capital * cfg.max_risk_per_trade / stop_fraction)
        } else {
            score_value
        };

        PositionSize {
            value,
            risk_amount: value * stop_fraction,
            stop_fraction,
        }
    }

    /// Leverage scaled by score and reduced as volatility rises.
    pub fn leverage(&self, score: u8, volatility: f64) -> u32 {
        let cfg = &self.config;
        let excess = (volatility - cfg.volatility_reference) / cfg.volatility_span;
        let volatility_factor = (1.0 - excess).max(cfg.min_volatility_factor);
        let raw = f64::from(cfg.base_leverage) * f64::from(score) / 100.0 * volatility_factor;

        // Truncation toward zero, then bounds
        let leverage = if raw.is_finite() && raw > 0.0 { raw as u32 } else { 0 };
        leverage.clamp(cfg.min_leverage, cfg.max_leverage)
    }
}
