//! Trade plan construction for a scored signal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tradebot_core::error::SignalError;
use tradebot_core::types::{
    Direction, EntryZone, IndicatorReading, IndicatorResultSet, ProfitScenarios, SignalType,
    Timeframe, TimeframeSeries, TradingSignal,
};
use tradebot_indicators::Atr;
use tradebot_risk::{PositionSizer, StopPolicy};
use uuid::Uuid;

use crate::pattern::PatternMatch;

/// Expected holding time for scores at or above `min_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationBand {
    pub min_score: u8,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Series whose last close is the entry price
    pub price_timeframe: Timeframe,
    /// Timeframe the signal is reported against
    pub primary_timeframe: Timeframe,
    pub volatility_timeframe: Timeframe,
    pub volatility_period: usize,
    /// Used when the volatility series is missing or too short
    pub default_volatility: f64,
    /// Share of the position per tranche, summing to 1
    pub entry_ratios: Vec<f64>,
    /// Distance of each tranche from the entry price, against the direction
    pub entry_distances: Vec<f64>,
    /// Take-profit distances as multiples of volatility, nearest first
    pub take_profit_multipliers: Vec<f64>,
    pub trailing_activation: f64,
    pub stop: StopPolicy,
    pub primary_strength: f64,
    pub supporting_strength: f64,
    pub risk_strength: f64,
    pub max_reasons: usize,
    /// Checked in order; the first band the score reaches wins
    pub duration_bands: Vec<DurationBand>,
    pub fallback_duration: String,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            price_timeframe: Timeframe::Minute1,
            primary_timeframe: Timeframe::Minute5,
            volatility_timeframe: Timeframe::Minute15,
            volatility_period: 14,
            default_volatility: 0.02,
            entry_ratios: vec![0.3, 0.3, 0.4],
            entry_distances: vec![0.005, 0.01, 0.025],
            take_profit_multipliers: vec![2.0, 4.0],
            trailing_activation: 0.02,
            stop: StopPolicy::default(),
            primary_strength: 0.7,
            supporting_strength: 0.4,
            risk_strength: 0.5,
            max_reasons: 3,
            duration_bands: vec![
                DurationBand {
                    min_score: 85,
                    label: "30m-2h (strong signal)".to_string(),
                },
                DurationBand {
                    min_score: 70,
                    label: "1-4h (moderate signal)".to_string(),
                },
            ],
            fallback_duration: "2-8h (weak signal)".to_string(),
        }
    }
}

impl PlanConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        let invalid = |msg: String| Err(SignalError::InvalidPlan(msg));

        if self.entry_ratios.is_empty() {
            return invalid("entry_ratios must not be empty".into());
        }
        if self.entry_ratios.len() != self.entry_distances.len() {
            return invalid(format!(
                "{} entry ratios but {} entry distances",
                self.entry_ratios.len(),
                self.entry_distances.len()
            ));
        }
        let total: f64 = self.entry_ratios.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return invalid(format!("entry ratios sum to {}, expected 1.0", total));
        }
        if self.take_profit_multipliers.is_empty() {
            return invalid("at least one take-profit multiplier is required".into());
        }
        if self.volatility_period == 0 {
            return invalid("volatility_period must be > 0".into());
        }
        if self.stop.min_distance <= 0.0 || self.stop.min_distance > self.stop.max_distance {
            return invalid(format!(
                "stop distance bounds {}..{} are invalid",
                self.stop.min_distance, self.stop.max_distance
            ));
        }
        Ok(())
    }

    pub fn duration_for(&self, score: u8) -> &str {
        self.duration_bands
            .iter()
            .find(|band| score >= band.min_score)
            .map(|band| band.label.as_str())
            .unwrap_or(&self.fallback_duration)
    }
}

/// Builds the entry, exit and sizing plan of a signal.
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    config: PlanConfig,
    sizer: PositionSizer,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl PlanBuilder {
    pub fn new(config: PlanConfig, sizer: PositionSizer) -> Self {
        Self { config, sizer }
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn sizer(&self) -> &PositionSizer {
        &self.sizer
    }

    /// Mean true range as a fraction of the last close.
    pub fn volatility(&self, data: &TimeframeSeries) -> f64 {
        let atr = Atr::new(self.config.volatility_period);
        data.get(&self.config.volatility_timeframe)
            .and_then(|series| {
                let price = series.last_close().filter(|p| *p > 0.0)?;
                atr.latest(series).map(|atr| atr / price)
            })
            .filter(|v| v.is_finite())
            .unwrap_or(self.config.default_volatility)
    }

    pub fn entry_zones(&self, price: f64, direction: Direction) -> Vec<EntryZone> {
        self.config
            .entry_ratios
            .iter()
            .zip(&self.config.entry_distances)
            .enumerate()
            .map(|(i, (&ratio, &distance))| EntryZone {
                order: (i + 1) as u8,
                price: round_to(price * (1.0 - direction.sign() * distance), 4),
                ratio,
                amount: self.sizer.tranche_amount(ratio),
            })
            .collect()
    }

    pub fn take_profits(&self, price: f64, direction: Direction, volatility: f64) -> Vec<f64> {
        self.config
            .take_profit_multipliers
            .iter()
            .map(|m| price * (1.0 + direction.sign() * volatility * m))
            .collect()
    }

    /// Reward to the first target over risk to the stop, 0 without risk.
    pub fn risk_reward(entry: f64, stop: f64, target: f64) -> f64 {
        let risk = (entry - stop).abs();
        if risk > 0.0 {
            (target - entry).abs() / risk
        } else {
            0.0
        }
    }

    /// Signed P&L per target and at the stop for a position of `value`.
    pub fn scenarios(
        entry: f64,
        take_profits: &[f64],
        stop: f64,
        value: f64,
        direction: Direction,
    ) -> ProfitScenarios {
        let pnl = |price: f64| round_to((price - entry) / entry * direction.sign() * value, 2);
        ProfitScenarios {
            targets: take_profits.iter().map(|&tp| pnl(tp)).collect(),
            stop_loss: pnl(stop),
        }
    }

    /// (primary reasons, supporting factors, risk factors).
    pub fn reasons(
        &self,
        set: &IndicatorResultSet,
        direction: Direction,
    ) -> (Vec<String>, Vec<String>, Vec<String>) {
        let cfg = &self.config;
        let mut readings: Vec<&IndicatorReading> = set.iter().collect();
        readings.sort_by(|a, b| b.strength.partial_cmp(&a.strength).unwrap_or(Ordering::Equal));

        let labelled = |r: &IndicatorReading| {
            format!("{} {}: {} ({:.1})", r.name, r.timeframe, r.signal, r.strength)
        };

        let primary = readings
            .iter()
            .filter(|r| r.strength > cfg.primary_strength)
            .take(cfg.max_reasons)
            .map(|r| labelled(*r))
            .collect();

        let supporting = readings
            .iter()
            .filter(|r| r.strength > cfg.supporting_strength && r.strength <= cfg.primary_strength)
            .take(cfg.max_reasons)
            .map(|r| format!("{} {}: {}", r.name, r.timeframe, r.signal))
            .collect();

        let opposing = match direction {
            Direction::Long => SignalType::Sell,
            Direction::Short => SignalType::Buy,
        };
        let risks = readings
            .iter()
            .filter(|r| r.signal == opposing && r.strength > cfg.risk_strength)
            .take(cfg.max_reasons)
            .map(|r| labelled(*r))
            .collect();

        (primary, supporting, risks)
    }

    /// Full plan for `symbol`, priced off the last close of the price
    /// timeframe.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &self,
        symbol: &str,
        direction: Direction,
        score: u8,
        set: &IndicatorResultSet,
        data: &TimeframeSeries,
        pattern: Option<&PatternMatch>,
        now: DateTime<Utc>,
    ) -> Result<TradingSignal, SignalError> {
        let price = data
            .get(&self.config.price_timeframe)
            .and_then(|series| series.last_close())
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| SignalError::MissingPrice(symbol.to_string()))?;

        let volatility = self.volatility(data);
        let stop_loss = self.config.stop.stop_price(price, direction, volatility);
        let take_profits = self.take_profits(price, direction, volatility);
        let first_target = take_profits
            .first()
            .copied()
            .ok_or_else(|| SignalError::InvalidPlan("no take-profit levels".into()))?;

        let size = self.sizer.size(score, price, stop_loss);
        let (primary_reasons, supporting_factors, risk_factors) = self.reasons(set, direction);

        Ok(TradingSignal {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            direction,
            score,
            confidence: f64::from(score) / 100.0,
            entry_price: price,
            entry_zones: self.entry_zones(price, direction),
            stop_loss,
            trailing_stop_activation: price
                * (1.0 + direction.sign() * self.config.trailing_activation),
            recommended_size: size.value,
            risk_amount: size.risk_amount,
            leverage: self.sizer.leverage(score, volatility),
            risk_reward_ratio: Self::risk_reward(price, stop_loss, first_target),
            volatility,
            primary_reasons,
            supporting_factors,
            risk_factors,
            pattern: pattern.map(PatternMatch::describe),
            scenarios: Self::scenarios(price, &take_profits, stop_loss, size.value, direction),
            take_profits,
            expected_duration: self.config.duration_for(score).to_string(),
            timeframe: self.config.primary_timeframe,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradebot_core::types::{Candle, CandleSeries};

    fn flat_series(timeframe: Timeframe, len: usize, high: f64, low: f64) -> CandleSeries {
        CandleSeries::from_candles(
            "ETHUSDT",
            timeframe,
            (0..len).map(|i| Candle::new(i as i64 * 60_000, 100.0, high, low, 100.0, 10.0)),
        )
    }

    fn market(with_volatility: bool) -> TimeframeSeries {
        let mut data = TimeframeSeries::new();
        data.insert(Timeframe::Minute1, flat_series(Timeframe::Minute1, 5, 100.5, 99.5));
        if with_volatility {
            // True range 2 on a close of 100
            data.insert(Timeframe::Minute15, flat_series(Timeframe::Minute15, 30, 101.0, 99.0));
        }
        data
    }

    fn readings() -> IndicatorResultSet {
        let mut set = IndicatorResultSet::new("ETHUSDT");
        set.insert(
            Timeframe::Minute5,
            vec![
                IndicatorReading::new("RSI_14", 25.0, SignalType::Buy, 0.9, Timeframe::Minute5, 0),
                IndicatorReading::new("SMA_8", 99.0, SignalType::Buy, 0.6, Timeframe::Minute5, 0),
                IndicatorReading::new(
                    "BB_20_2.0",
                    95.0,
                    SignalType::Sell,
                    0.8,
                    Timeframe::Minute5,
                    0,
                ),
                IndicatorReading::new(
                    "VOLUME_20",
                    1.0,
                    SignalType::Neutral,
                    0.1,
                    Timeframe::Minute5,
                    0,
                ),
            ],
        );
        set
    }

    #[test]
    fn test_long_plan() {
        let builder = PlanBuilder::default();
        let signal = builder
            .build("ETHUSDT", Direction::Long, 80, &readings(), &market(true), None, Utc::now())
            .unwrap();

        assert_eq!(signal.entry_price, 100.0);
        assert!((signal.volatility - 0.02).abs() < 1e-12);
        assert!((signal.stop_loss - 95.0).abs() < 1e-9);
        assert!((signal.take_profits[0] - 104.0).abs() < 1e-9);
        assert!((signal.take_profits[1] - 108.0).abs() < 1e-9);
        assert!((signal.trailing_stop_activation - 102.0).abs() < 1e-9);
        assert!((signal.recommended_size - 480.0).abs() < 1e-9);
        assert!((signal.risk_amount - 24.0).abs() < 1e-9);
        assert_eq!(signal.leverage, 8);
        assert!((signal.risk_reward_ratio - 0.8).abs() < 1e-9);
        assert!((signal.confidence - 0.8).abs() < 1e-12);
        assert_eq!(signal.expected_duration, "1-4h (moderate signal)");
        assert_eq!(signal.timeframe, Timeframe::Minute5);

        let prices: Vec<f64> = signal.entry_zones.iter().map(|z| z.price).collect();
        assert_eq!(prices, vec![99.5, 99.0, 97.5]);
        assert!((signal.total_entry_ratio() - 1.0).abs() < 1e-9);
        assert!((signal.entry_zones[2].amount - 240.0).abs() < 1e-9);

        assert_eq!(signal.scenarios.targets, vec![19.2, 38.4]);
        assert_eq!(signal.scenarios.stop_loss, -24.0);
    }

    #[test]
    fn test_short_plan_mirrors() {
        let builder = PlanBuilder::default();
        let signal = builder
            .build("ETHUSDT", Direction::Short, 90, &readings(), &market(true), None, Utc::now())
            .unwrap();

        assert!((signal.stop_loss - 105.0).abs() < 1e-9);
        assert!(signal.take_profits[0] < signal.entry_price);
        assert!(signal.entry_zones.iter().all(|z| z.price > signal.entry_price));
        assert!((signal.trailing_stop_activation - 98.0).abs() < 1e-9);
        assert!(signal.scenarios.targets.iter().all(|p| *p > 0.0));
        assert!(signal.scenarios.stop_loss < 0.0);
        assert_eq!(signal.expected_duration, "30m-2h (strong signal)");
    }

    #[test]
    fn test_missing_volatility_series_defaults() {
        let builder = PlanBuilder::default();
        assert_eq!(builder.volatility(&market(false)), 0.02);

        let mut short = market(false);
        short.insert(Timeframe::Minute15, flat_series(Timeframe::Minute15, 10, 110.0, 90.0));
        assert_eq!(builder.volatility(&short), 0.02);
    }

    #[test]
    fn test_missing_price_is_error() {
        let builder = PlanBuilder::default();
        let mut data = market(true);
        data.remove(&Timeframe::Minute1);

        let err = builder
            .build("ETHUSDT", Direction::Long, 80, &readings(), &data, None, Utc::now())
            .unwrap_err();
        assert_eq!(err, SignalError::MissingPrice("ETHUSDT".to_string()));
    }

    #[test]
    fn test_reasons_and_risk_factors() {
        let builder = PlanBuilder::default();
        let (primary, supporting, risks) = builder.reasons(&readings(), Direction::Long);

        assert_eq!(primary, vec!["RSI_14 5m: BUY (0.9)", "BB_20_2.0 5m: SELL (0.8)"]);
        assert_eq!(supporting, vec!["SMA_8 5m: BUY"]);
        assert_eq!(risks, vec!["BB_20_2.0 5m: SELL (0.8)"]);

        let (_, _, risks) = builder.reasons(&readings(), Direction::Short);
        assert_eq!(risks, vec!["RSI_14 5m: BUY (0.9)", "SMA_8 5m: BUY (0.6)"]);
    }

    #[test]
    fn test_validate() {
        assert!(PlanConfig::default().validate().is_ok());

        let config = PlanConfig {
            entry_ratios: vec![0.5, 0.4],
            entry_distances: vec![0.01, 0.02],
            ..PlanConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PlanConfig {
            entry_distances: vec![0.01],
            ..PlanConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_bands() {
        let config = PlanConfig::default();
        assert_eq!(config.duration_for(85), "30m-2h (strong signal)");
        assert_eq!(config.duration_for(70), "1-4h (moderate signal)");
        assert_eq!(config.duration_for(50), "2-8h (weak signal)");
    }
}
