//! Configuration structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tradebot_engine::EngineConfig;
use tradebot_indicators::{default_indicator_set, IndicatorSpec};
use tradebot_risk::{ManagementConfig, SizingConfig};
use tradebot_signals::{CorrelationConfig, PatternConfig, PlanConfig, ScoringConfig};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub trading: EngineConfig,
    #[serde(default = "default_indicator_set")]
    pub indicators: Vec<IndicatorSpec>,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub correlation: CorrelationConfig,
    #[serde(default)]
    pub patterns: PatternConfig,
    #[serde(default)]
    pub plan: PlanConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub management: ManagementConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings::default(),
            logging: LoggingConfig::default(),
            trading: EngineConfig::default(),
            indicators: default_indicator_set(),
            scoring: ScoringConfig::default(),
            correlation: CorrelationConfig::default(),
            patterns: PatternConfig::default(),
            plan: PlanConfig::default(),
            sizing: SizingConfig::default(),
            management: ManagementConfig::default(),
        }
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    /// Directory of `{SYMBOL}_{interval}.csv` candle files
    pub data_dir: PathBuf,
    /// Exchange position list, refreshed by an external bridge
    pub positions_file: PathBuf,
    /// JSON-lines notification log; disabled when unset
    pub notifications_file: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "tradebot".to_string(),
            data_dir: PathBuf::from("data/candles"),
            positions_file: PathBuf::from("data/positions.json"),
            notifications_file: Some(PathBuf::from("data/notifications.jsonl")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Directory for daily log files
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

fn check(ok: bool, msg: impl FnOnce() -> String) -> Result<(), SettingsError> {
    if ok {
        Ok(())
    } else {
        Err(SettingsError::Invalid(msg()))
    }
}

impl AppConfig {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let trading = &self.trading;
        check(!trading.symbols.is_empty(), || "trading.symbols must not be empty".into())?;
        check(!trading.timeframes.is_empty(), || {
            "trading.timeframes must not be empty".into()
        })?;
        check(trading.candle_limit > 0, || "trading.candle_limit must be > 0".into())?;
        check(trading.signal_interval_mins >= 0, || {
            "trading.signal_interval_mins must not be negative".into()
        })?;

        for (key, timeframe) in [
            ("plan.price_timeframe", self.plan.price_timeframe),
            ("patterns.timeframe", self.patterns.timeframe),
            ("correlation.timeframe", self.correlation.timeframe),
        ] {
            check(trading.timeframes.contains(&timeframe), || {
                format!("{} {} is not in trading.timeframes", key, timeframe)
            })?;
        }

        check(!self.indicators.is_empty(), || "at least one indicator is required".into())?;
        for spec in &self.indicators {
            spec.validate()
                .map_err(|e| SettingsError::Invalid(format!("indicator {}: {}", spec, e)))?;
        }

        check(self.scoring.min_score <= 100, || {
            format!("scoring.min_score {} exceeds 100", self.scoring.min_score)
        })?;
        let weights = &self.scoring.timeframe_weights;
        check(
            weights.values().all(|w| *w >= 0.0) && self.scoring.default_weight >= 0.0,
            || "timeframe weights must not be negative".into(),
        )?;

        let corr = &self.correlation;
        check(corr.threshold > 0.0 && corr.threshold <= corr.strong_threshold, || {
            format!(
                "correlation thresholds {} / {} must satisfy 0 < threshold <= strong_threshold",
                corr.threshold, corr.strong_threshold
            )
        })?;

        self.plan
            .validate()
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;

        let sizing = &self.sizing;
        check(sizing.capital > 0.0, || "sizing.capital must be > 0".into())?;
        check(
            sizing.max_position_ratio > 0.0 && sizing.max_position_ratio <= 1.0,
            || "sizing.max_position_ratio must be in (0, 1]".into(),
        )?;
        check(
            sizing.min_leverage >= 1
                && sizing.min_leverage <= sizing.base_leverage
                && sizing.base_leverage <= sizing.max_leverage,
            || {
                format!(
                    "leverage bounds must satisfy 1 <= min ({}) <= base ({}) <= max ({})",
                    sizing.min_leverage, sizing.base_leverage, sizing.max_leverage
                )
            },
        )?;
        check(sizing.volatility_span > 0.0, || "sizing.volatility_span must be > 0".into())?;

        let mgmt = &self.management;
        let trailing = &mgmt.trailing;
        check(
            trailing.distance_pct > Decimal::ZERO && trailing.activation_pct > Decimal::ZERO,
            || "management.trailing percentages must be > 0".into(),
        )?;
        check(
            mgmt.partial_profits.first_target_pct < mgmt.partial_profits.second_target_pct,
            || "management.partial_profits targets must increase".into(),
        )?;
        check(mgmt.alerts.history_len > 0, || {
            "management.alerts.history_len must be > 0".into()
        })?;
        check(mgmt.status_interval_mins >= 0, || {
            "management.status_interval_mins must not be negative".into()
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tradebot_core::types::Timeframe;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.indicators.len(), 14);
    }

    #[test]
    fn test_split_ratios_must_sum_to_one() {
        let mut config = AppConfig::default();
        config.plan.entry_ratios = vec![0.3, 0.3, 0.3];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sum to"));
    }

    #[test]
    fn test_ratio_distance_mismatch() {
        let mut config = AppConfig::default();
        config.plan.entry_distances = vec![0.005, 0.01];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_leverage_bounds() {
        let mut config = AppConfig::default();
        config.sizing.min_leverage = 12;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("leverage bounds"));
    }

    #[test]
    fn test_empty_symbols_and_bad_indicator() {
        let mut config = AppConfig::default();
        config.trading.symbols.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.indicators.push(IndicatorSpec::Rsi { period: 0 });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("RSI(0)"));
    }

    #[test]
    fn test_stage_timeframes_must_be_fetched() {
        let mut config = AppConfig::default();
        config.trading.timeframes.retain(|tf| *tf != Timeframe::Minute5);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("patterns.timeframe"));

        let mut config = AppConfig::default();
        config.trading.timeframes = vec![Timeframe::Minute5, Timeframe::Minute15];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("plan.price_timeframe"));
    }

    #[test]
    fn test_alert_history_must_hold_a_sample() {
        let mut config = AppConfig::default();
        config.management.alerts.history_len = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("history_len"));
    }

    #[test]
    fn test_trailing_distance_must_be_positive() {
        let mut config = AppConfig::default();
        config.management.trailing.distance_pct = dec!(0);
        assert!(config.validate().is_err());
    }
}
