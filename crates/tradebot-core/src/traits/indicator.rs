//! Indicator trait definitions.

use crate::error::IndicatorError;
use crate::types::{CandleSeries, IndicatorReading, Timeframe};

/// Raw series math (moving averages, oscillators, bands).
///
/// Produces one output per fully formed window. Returns an empty vector when
/// the input is shorter than `period()`.
pub trait SeriesIndicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    fn name(&self) -> &str;

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

/// Turns a candle series into a directional reading.
///
/// Implementations fail closed: a series shorter than `min_history()` yields
/// a neutral zero-strength reading. `Err` is reserved for computation
/// failures, which the aggregation engine logs and skips.
pub trait Indicator: Send + Sync {
    /// Reading name, e.g. `RSI_14` or `EMA_21`.
    fn name(&self) -> &str;

    /// Candles required before the indicator votes.
    fn min_history(&self) -> usize;

    fn calculate(
        &self,
        series: &CandleSeries,
        timeframe: Timeframe,
    ) -> Result<IndicatorReading, IndicatorError>;

    /// Whether `series` is too short for a vote.
    fn lacks_history(&self, series: &CandleSeries) -> bool {
        series.len() < self.min_history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candle, SignalType};

    struct WindowSum {
        period: usize,
    }

    impl SeriesIndicator for WindowSum {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<f64> {
            if data.len() < self.period {
                return vec![];
            }
            data.windows(self.period).map(|w| w.iter().sum()).collect()
        }

        fn period(&self) -> usize {
            self.period
        }

        fn name(&self) -> &str {
            "window_sum"
        }
    }

    struct LastCloseAboveHundred;

    impl Indicator for LastCloseAboveHundred {
        fn name(&self) -> &str {
            "ABOVE_100"
        }

        fn min_history(&self) -> usize {
            2
        }

        fn calculate(
            &self,
            series: &CandleSeries,
            timeframe: Timeframe,
        ) -> Result<IndicatorReading, IndicatorError> {
            let ts = series.last_open_time();
            if self.lacks_history(series) {
                return Ok(IndicatorReading::neutral(self.name(), 0.0, timeframe, ts));
            }
            let close = series.last_close().unwrap_or_default();
            let signal = if close > 100.0 { SignalType::Buy } else { SignalType::Neutral };
            Ok(IndicatorReading::new(self.name(), close, signal, 0.5, timeframe, ts))
        }
    }

    #[test]
    fn test_series_validation() {
        let indicator = WindowSum { period: 5 };
        assert!(indicator.validate_data(&[1.0, 2.0, 3.0]).is_err());
        assert!(indicator.validate_data(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_ok());
        assert_eq!(indicator.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), vec![15.0, 20.0]);
    }

    #[test]
    fn test_reading_indicator_fails_closed() {
        let mut series = CandleSeries::new("ETHUSDT", Timeframe::Minute1);
        series.push(Candle::new(1, 101.0, 101.0, 101.0, 101.0, 1.0));

        let reading = LastCloseAboveHundred.calculate(&series, Timeframe::Minute1).unwrap();
        assert_eq!(reading.signal, SignalType::Neutral);
        assert_eq!(reading.strength, 0.0);

        series.push(Candle::new(2, 102.0, 102.0, 102.0, 102.0, 1.0));
        let reading = LastCloseAboveHundred.calculate(&series, Timeframe::Minute1).unwrap();
        assert_eq!(reading.signal, SignalType::Buy);
    }
}
