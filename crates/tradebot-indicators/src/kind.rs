//! Configured indicator set.

use serde::{Deserialize, Serialize};
use std::fmt;
use tradebot_core::error::IndicatorError;
use tradebot_core::traits::Indicator;
use tradebot_core::types::{CandleSeries, IndicatorReading, Timeframe};

use crate::momentum::{MacdIndicator, RsiIndicator};
use crate::moving_average::{AverageKind, MovingAverageIndicator};
use crate::volatility::BandIndicator;
use crate::volume::VolumeIndicator;

/// Indicator as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndicatorSpec {
    Rsi {
        period: usize,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        std_dev: f64,
    },
    Volume {
        period: usize,
    },
    MovingAverage {
        period: usize,
        #[serde(default)]
        average: AverageKind,
    },
}

impl IndicatorSpec {
    /// Check parameters before constructing the indicator.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let invalid = |msg: String| Err(IndicatorError::InvalidParameter(msg));
        match *self {
            IndicatorSpec::Rsi { period } if period == 0 => {
                invalid("RSI period must be > 0".into())
            }
            IndicatorSpec::Macd { fast, slow, signal }
                if fast == 0 || signal == 0 || fast >= slow =>
            {
                invalid(format!(
                    "MACD {}/{}/{} needs 0 < fast < slow and signal > 0",
                    fast, slow, signal
                ))
            }
            IndicatorSpec::Bollinger { period, std_dev } if period < 2 || std_dev <= 0.0 => {
                invalid(format!(
                    "Bollinger {}/{} needs period >= 2 and std_dev > 0",
                    period, std_dev
                ))
            }
            IndicatorSpec::Volume { period } if period == 0 => {
                invalid("Volume period must be > 0".into())
            }
            IndicatorSpec::MovingAverage { period, .. } if period == 0 => {
                invalid("Moving average period must be > 0".into())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for IndicatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorSpec::Rsi { period } => write!(f, "RSI({})", period),
            IndicatorSpec::Macd { fast, slow, signal } => {
                write!(f, "MACD({}, {}, {})", fast, slow, signal)
            }
            IndicatorSpec::Bollinger { period, std_dev } => {
                write!(f, "Bollinger({}, {})", period, std_dev)
            }
            IndicatorSpec::Volume { period } => write!(f, "Volume({})", period),
            IndicatorSpec::MovingAverage { period, average } => {
                write!(f, "{}({})", average.prefix(), period)
            }
        }
    }
}

/// Default set: RSI 14/21/50, MACD 12/26/9, Bollinger 20/2,
/// SMA and EMA 8/21/50/200, Volume 20.
pub fn default_indicator_set() -> Vec<IndicatorSpec> {
    let mut specs: Vec<IndicatorSpec> = [14, 21, 50]
        .into_iter()
        .map(|period| IndicatorSpec::Rsi { period })
        .collect();

    specs.push(IndicatorSpec::Macd {
        fast: 12,
        slow: 26,
        signal: 9,
    });
    specs.push(IndicatorSpec::Bollinger {
        period: 20,
        std_dev: 2.0,
    });

    for average in [AverageKind::Simple, AverageKind::Exponential] {
        for period in [8, 21, 50, 200] {
            specs.push(IndicatorSpec::MovingAverage { period, average });
        }
    }

    specs.push(IndicatorSpec::Volume { period: 20 });
    specs
}

/// The closed set of reading calculators.
#[derive(Debug, Clone)]
pub enum IndicatorKind {
    Rsi(RsiIndicator),
    Macd(MacdIndicator),
    Band(BandIndicator),
    Volume(VolumeIndicator),
    MovingAverage(MovingAverageIndicator),
}

impl IndicatorKind {
    pub fn from_spec(spec: &IndicatorSpec) -> Result<Self, IndicatorError> {
        spec.validate()?;
        Ok(match *spec {
            IndicatorSpec::Rsi { period } => IndicatorKind::Rsi(RsiIndicator::new(period)),
            IndicatorSpec::Macd { fast, slow, signal } => {
                IndicatorKind::Macd(MacdIndicator::new(fast, slow, signal))
            }
            IndicatorSpec::Bollinger { period, std_dev } => {
                IndicatorKind::Band(BandIndicator::new(period, std_dev))
            }
            IndicatorSpec::Volume { period } => IndicatorKind::Volume(VolumeIndicator::new(period)),
            IndicatorSpec::MovingAverage { period, average } => {
                IndicatorKind::MovingAverage(MovingAverageIndicator::new(period, average))
            }
        })
    }

    fn inner(&self) -> &dyn Indicator {
        match self {
            IndicatorKind::Rsi(i) => i,
            IndicatorKind::Macd(i) => i,
            IndicatorKind::Band(i) => i,
            IndicatorKind::Volume(i) => i,
            IndicatorKind::MovingAverage(i) => i,
        }
    }
}

impl Indicator for IndicatorKind {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn min_history(&self) -> usize {
        self.inner().min_history()
    }

    fn calculate(
        &self,
        series: &CandleSeries,
        timeframe: Timeframe,
    ) -> Result<IndicatorReading, IndicatorError> {
        self.inner().calculate(series, timeframe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set() {
        let specs = default_indicator_set();
        assert_eq!(specs.len(), 14);

        let kinds: Vec<IndicatorKind> = specs
            .iter()
            .map(|s| IndicatorKind::from_spec(s).unwrap())
            .collect();
        let names: Vec<&str> = kinds.iter().map(|k| k.name()).collect();
        assert!(names.contains(&"RSI_50"));
        assert!(names.contains(&"MACD_12_26_9"));
        assert!(names.contains(&"BB_20_2.0"));
        assert!(names.contains(&"EMA_200"));
        assert!(names.contains(&"VOLUME_20"));
    }

    #[test]
    fn test_invalid_specs_rejected() {
        assert!(IndicatorKind::from_spec(&IndicatorSpec::Rsi { period: 0 }).is_err());
        assert!(IndicatorKind::from_spec(&IndicatorSpec::Macd {
            fast: 26,
            slow: 12,
            signal: 9
        })
        .is_err());
        assert!(IndicatorKind::from_spec(&IndicatorSpec::Bollinger {
            period: 20,
            std_dev: 0.0
        })
        .is_err());
    }

    #[test]
    fn test_spec_deserializes_from_tagged_json() {
        let json = r#"{"type": "moving_average", "period": 21, "average": "exponential"}"#;
        let spec: IndicatorSpec = serde_json::from_str(json).unwrap();
        assert_eq!(
            spec,
            IndicatorSpec::MovingAverage {
                period: 21,
                average: AverageKind::Exponential
            }
        );

        let spec: IndicatorSpec =
            serde_json::from_str(r#"{"type": "moving_average", "period": 8}"#).unwrap();
        assert_eq!(spec.to_string(), "SMA(8)");
    }

    #[test]
    fn test_kind_delegates_min_history() {
        let kind = IndicatorKind::from_spec(&IndicatorSpec::Rsi { period: 14 }).unwrap();
        assert_eq!(kind.min_history(), 15);
    }
}
