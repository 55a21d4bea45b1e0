//! Market regime factor derived from the reference symbol.

use serde::{Deserialize, Serialize};
use std::fmt;
use tradebot_core::types::{IndicatorReading, SignalType, Timeframe};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Symbol whose readings set the regime; it is never adjusted itself
    pub reference_symbol: String,
    pub timeframe: Timeframe,
    pub strong_threshold: f64,
    pub threshold: f64,
    pub strong_bull_weight: f64,
    pub bull_weight: f64,
    pub sideways_weight: f64,
    pub bear_weight: f64,
    pub strong_bear_weight: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            reference_symbol: "BTCUSDT".to_string(),
            timeframe: Timeframe::Minute15,
            strong_threshold: 0.6,
            threshold: 0.3,
            strong_bull_weight: 2.0,
            bull_weight: 1.5,
            sideways_weight: 1.0,
            bear_weight: 0.7,
            strong_bear_weight: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    StrongBull,
    Bull,
    Sideways,
    Bear,
    StrongBear,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketRegime::StrongBull => write!(f, "strong bull"),
            MarketRegime::Bull => write!(f, "bull"),
            MarketRegime::Sideways => write!(f, "sideways"),
            MarketRegime::Bear => write!(f, "bear"),
            MarketRegime::StrongBear => write!(f, "strong bear"),
        }
    }
}

/// Multiplier applied to every symbol except the reference.
#[derive(Debug, Clone, Default)]
pub struct CorrelationFactor {
    config: CorrelationConfig,
}

impl CorrelationFactor {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    pub fn is_reference(&self, symbol: &str) -> bool {
        symbol == self.config.reference_symbol
    }

    /// Net directional strength: (sum BUY - sum SELL) / reading count.
    pub fn average(readings: &[IndicatorReading]) -> Option<f64> {
        if readings.is_empty() {
            return None;
        }
        let net: f64 = readings
            .iter()
            .map(|r| match r.signal {
                SignalType::Buy => r.strength,
                SignalType::Sell => -r.strength,
                SignalType::Neutral => 0.0,
            })
            .sum();
        let avg = net / readings.len() as f64;
        avg.is_finite().then_some(avg)
    }

    pub fn regime(&self, average: f64) -> MarketRegime {
        let cfg = &self.config;
        if average > cfg.strong_threshold {
            MarketRegime::StrongBull
        } else if average > cfg.threshold {
            MarketRegime::Bull
        } else if average < -cfg.strong_threshold {
            MarketRegime::StrongBear
        } else if average < -cfg.threshold {
            MarketRegime::Bear
        } else {
            MarketRegime::Sideways
        }
    }

    pub fn weight(&self, regime: MarketRegime) -> f64 {
        let cfg = &self.config;
        match regime {
            MarketRegime::StrongBull => cfg.strong_bull_weight,
            MarketRegime::Bull => cfg.bull_weight,
            MarketRegime::Sideways => cfg.sideways_weight,
            MarketRegime::Bear => cfg.bear_weight,
            MarketRegime::StrongBear => cfg.strong_bear_weight,
        }
    }

    /// Factor for `symbol` given the reference symbol's readings on the
    /// configured timeframe. Neutral (1.0) for the reference itself and
    /// whenever the regime cannot be computed.
    pub fn factor(&self, symbol: &str, reference: &[IndicatorReading]) -> f64 {
        if self.is_reference(symbol) {
            return 1.0;
        }
        match Self::average(reference) {
            Some(avg) => self.weight(self.regime(avg)),
            None => 1.0,
        }
    }
}
