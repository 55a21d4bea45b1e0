//! Indicator readings and per-symbol result sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::Timeframe;

/// Direction an indicator votes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    Buy,
    Sell,
    Neutral,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalType::Buy => write!(f, "BUY"),
            SignalType::Sell => write!(f, "SELL"),
            SignalType::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Output of one indicator on one timeframe.
///
/// `strength` is a magnitude in [0, 1]; direction lives only in `signal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub name: String,
    pub value: f64,
    pub signal: SignalType,
    pub strength: f64,
    pub timeframe: Timeframe,
    /// Open time of the candle the reading was computed on
    pub timestamp: i64,
}

impl IndicatorReading {
    /// Create a reading, clamping strength into [0, 1].
    pub fn new(
        name: impl Into<String>,
        value: f64,
        signal: SignalType,
        strength: f64,
        timeframe: Timeframe,
        timestamp: i64,
    ) -> Self {
        let strength = if strength.is_finite() {
            strength.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            name: name.into(),
            value,
            signal,
            strength,
            timeframe,
            timestamp,
        }
    }

    /// Zero-strength neutral reading, used when history is too short.
    pub fn neutral(
        name: impl Into<String>,
        value: f64,
        timeframe: Timeframe,
        timestamp: i64,
    ) -> Self {
        Self::new(name, value, SignalType::Neutral, 0.0, timeframe, timestamp)
    }

    pub fn is_buy(&self) -> bool {
        self.signal == SignalType::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.signal == SignalType::Sell
    }
}

/// Latest readings for one symbol, grouped by timeframe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResultSet {
    pub symbol: String,
    readings: BTreeMap<Timeframe, Vec<IndicatorReading>>,
}

impl IndicatorResultSet {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            readings: BTreeMap::new(),
        }
    }

    /// Store the readings of one timeframe, replacing earlier ones.
    pub fn insert(&mut self, timeframe: Timeframe, readings: Vec<IndicatorReading>) {
        self.readings.insert(timeframe, readings);
    }

    /// Readings for a timeframe, empty when none were computed.
    pub fn timeframe(&self, timeframe: Timeframe) -> &[IndicatorReading] {
        self.readings
            .get(&timeframe)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn timeframes(&self) -> impl Iterator<Item = Timeframe> + '_ {
        self.readings.keys().copied()
    }

    /// Every reading across all timeframes, shortest timeframe first.
    pub fn iter(&self) -> impl Iterator<Item = &IndicatorReading> {
        self.readings.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.readings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tally of readings on one timeframe.
    pub fn summary(&self, timeframe: Timeframe) -> IndicatorSummary {
        IndicatorSummary::from_readings(timeframe, self.timeframe(timeframe))
    }
}

/// Vote counts and average strengths for one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSummary {
    pub timeframe: Timeframe,
    pub buy: usize,
    pub sell: usize,
    pub neutral: usize,
    pub avg_buy_strength: f64,
    pub avg_sell_strength: f64,
    pub bias: SignalType,
}

impl IndicatorSummary {
    pub fn from_readings(timeframe: Timeframe, readings: &[IndicatorReading]) -> Self {
        let (mut buy, mut sell, mut neutral) = (0usize, 0usize, 0usize);
        let (mut buy_sum, mut sell_sum) = (0.0, 0.0);

        for r in readings {
            match r.signal {
                SignalType::Buy => {
                    buy += 1;
                    buy_sum += r.strength;
                }
                SignalType::Sell => {
                    sell += 1;
                    sell_sum += r.strength;
                }
                SignalType::Neutral => neutral += 1,
            }
        }

        let avg = |sum: f64, n: usize| if n > 0 { sum / n as f64 } else { 0.0 };
        let bias = if buy > sell {
            SignalType::Buy
        } else if sell > buy {
            SignalType::Sell
        } else {
            SignalType::Neutral
        };

        Self {
            timeframe,
            buy,
            sell,
            neutral,
            avg_buy_strength: avg(buy_sum, buy),
            avg_sell_strength: avg(sell_sum, sell),
            bias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(signal: SignalType, strength: f64, tf: Timeframe) -> IndicatorReading {
        IndicatorReading::new("TEST", 0.0, signal, strength, tf, 0)
    }

    #[test]
    fn test_strength_is_clamped() {
        assert_eq!(reading(SignalType::Buy, 1.7, Timeframe::Minute1).strength, 1.0);
        assert_eq!(reading(SignalType::Sell, -0.3, Timeframe::Minute1).strength, 0.0);
        assert_eq!(reading(SignalType::Buy, f64::NAN, Timeframe::Minute1).strength, 0.0);
    }

    #[test]
    fn test_neutral_reading() {
        let r = IndicatorReading::neutral("RSI_14", 50.0, Timeframe::Minute5, 42);
        assert_eq!(r.signal, SignalType::Neutral);
        assert_eq!(r.strength, 0.0);
        assert_eq!(r.value, 50.0);
        assert_eq!(r.timestamp, 42);
    }

    #[test]
    fn test_result_set_grouping() {
        let mut set = IndicatorResultSet::new("BTCUSDT");
        set.insert(Timeframe::Minute15, vec![reading(SignalType::Buy, 0.5, Timeframe::Minute15)]);
        set.insert(
            Timeframe::Minute1,
            vec![
                reading(SignalType::Sell, 0.2, Timeframe::Minute1),
                reading(SignalType::Neutral, 0.1, Timeframe::Minute1),
            ],
        );

        assert_eq!(set.len(), 3);
        assert_eq!(set.timeframe(Timeframe::Minute1).len(), 2);
        assert!(set.timeframe(Timeframe::Hour1).is_empty());
        let order: Vec<Timeframe> = set.timeframes().collect();
        assert_eq!(order, vec![Timeframe::Minute1, Timeframe::Minute15]);
        assert_eq!(set.iter().next().unwrap().signal, SignalType::Sell);
    }

    #[test]
    fn test_summary() {
        let readings = vec![
            reading(SignalType::Buy, 0.8, Timeframe::Minute5),
            reading(SignalType::Buy, 0.4, Timeframe::Minute5),
            reading(SignalType::Sell, 0.5, Timeframe::Minute5),
            reading(SignalType::Neutral, 0.1, Timeframe::Minute5),
        ];
        let summary = IndicatorSummary::from_readings(Timeframe::Minute5, &readings);

        assert_eq!(summary.buy, 2);
        assert_eq!(summary.sell, 1);
        assert_eq!(summary.neutral, 1);
        assert!((summary.avg_buy_strength - 0.6).abs() < 1e-10);
        assert!((summary.avg_sell_strength - 0.5).abs() < 1e-10);
        assert_eq!(summary.bias, SignalType::Buy);
    }

    #[test]
    fn test_signal_type_serde() {
        let json = serde_json::to_string(&SignalType::Neutral).unwrap();
        assert_eq!(json, "\"NEUTRAL\"");
    }
}
