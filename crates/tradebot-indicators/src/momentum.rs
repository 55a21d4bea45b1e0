//! Momentum indicators: RSI and MACD.

use serde::{Deserialize, Serialize};
use tradebot_core::error::IndicatorError;
use tradebot_core::traits::{Indicator, SeriesIndicator};
use tradebot_core::types::{CandleSeries, IndicatorReading, SignalType, Timeframe};

use crate::moving_average::Ema;

/// Relative Strength Index (RSI) with Wilder smoothing.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// avg = (prev_avg * (period-1) + value) / period
    fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
        if values.len() < period {
            return vec![];
        }

        let mut result = Vec::with_capacity(values.len() - period + 1);
        let period_f64 = period as f64;

        let mut avg: f64 = values[..period].iter().sum::<f64>() / period_f64;
        result.push(avg);

        for &value in &values[period..] {
            avg = (avg * (period_f64 - 1.0) + value) / period_f64;
            result.push(avg);
        }

        result
    }
}

impl SeriesIndicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.period {
            return vec![];
        }

        let (gains, losses): (Vec<f64>, Vec<f64>) = data
            .windows(2)
            .map(|w| {
                let change = w[1] - w[0];
                (change.max(0.0), (-change).max(0.0))
            })
            .unzip();

        let avg_gains = Self::wilder_smooth(&gains, self.period);
        let avg_losses = Self::wilder_smooth(&losses, self.period);

        avg_gains
            .iter()
            .zip(avg_losses.iter())
            .map(|(&gain, &loss)| {
                if gain == 0.0 && loss == 0.0 {
                    // No movement at all
                    50.0
                } else if loss == 0.0 {
                    100.0
                } else {
                    100.0 - (100.0 / (1.0 + gain / loss))
                }
            })
            .collect()
    }

    fn period(&self) -> usize {
        // One extra point for the first price change
        self.period + 1
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// Overbought/oversold vote on the latest RSI value.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    name: String,
    rsi: Rsi,
    oversold: f64,
    overbought: f64,
}

impl RsiIndicator {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("RSI_{}", period),
            rsi: Rsi::new(period),
            oversold: 30.0,
            overbought: 70.0,
        }
    }

    /// Map an RSI value to a vote.
    ///
    /// Strength grows by 0.1 per point beyond the threshold, capped at 1.
    pub fn classify(&self, value: f64) -> (SignalType, f64) {
        if value <= self.oversold {
            (SignalType::Buy, ((self.oversold - value) / 10.0).min(1.0))
        } else if value >= self.overbought {
            (SignalType::Sell, ((value - self.overbought) / 10.0).min(1.0))
        } else {
            (SignalType::Neutral, 0.1)
        }
    }
}

impl Indicator for RsiIndicator {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_history(&self) -> usize {
        self.rsi.period()
    }

    fn calculate(
        &self,
        series: &CandleSeries,
        timeframe: Timeframe,
    ) -> Result<IndicatorReading, IndicatorError> {
        let ts = series.last_open_time();
        if self.lacks_history(series) {
            return Ok(IndicatorReading::neutral(&self.name, 50.0, timeframe, ts));
        }

        let value = self
            .rsi
            .calculate(&series.closes())
            .last()
            .copied()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                IndicatorError::CalculationError(format!("{} produced no value", self.name))
            })?;

        let (signal, strength) = self.classify(value);
        Ok(IndicatorReading::new(&self.name, value, signal, strength, timeframe, ts))
    }
}

/// MACD output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdOutput {
    /// Fast EMA - slow EMA
    pub macd: f64,
    /// EMA of the MACD line
    pub signal: f64,
    /// MACD - signal
    pub histogram: f64,
}

/// MACD (Moving Average Convergence Divergence).
#[derive(Debug, Clone)]
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    /// Standard 12/26/9.
    pub fn new() -> Self {
        Self::with_periods(12, 26, 9)
    }

    pub fn with_periods(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast > 0 && slow > 0 && signal > 0);
        assert!(fast < slow, "Fast period must be less than slow period");
        Self {
            fast_period: fast,
            slow_period: slow,
            signal_period: signal,
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesIndicator for Macd {
    type Output = MacdOutput;

    fn calculate(&self, data: &[f64]) -> Vec<MacdOutput> {
        if data.len() < self.period() {
            return vec![];
        }

        let fast_ema = Ema::new(self.fast_period).calculate(data);
        let slow_ema = Ema::new(self.slow_period).calculate(data);

        // Fast EMA starts earlier; align on the slow one
        let offset = self.slow_period - self.fast_period;
        let macd_line: Vec<f64> = fast_ema[offset..]
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        let signal_line = Ema::new(self.signal_period).calculate(&macd_line);
        if signal_line.is_empty() {
            return vec![];
        }

        let offset = self.signal_period - 1;
        macd_line[offset..]
            .iter()
            .zip(signal_line.iter())
            .map(|(&macd, &signal)| MacdOutput {
                macd,
                signal,
                histogram: macd - signal,
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    fn name(&self) -> &str {
        "MACD"
    }
}

/// Histogram crossover and momentum vote.
///
/// A fresh zero cross of the histogram in the direction of MACD vs signal
/// scores 0.8; a histogram still expanding on its side of zero scores 0.5.
/// The reading value is the histogram.
#[derive(Debug, Clone)]
pub struct MacdIndicator {
    name: String,
    macd: Macd,
    min_history: usize,
}

impl MacdIndicator {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        let macd = Macd::with_periods(fast, slow, signal);
        // Ten candles of slack beyond the longest window, and always enough
        // for two histogram values
        let min_history = (slow.max(signal) + 10).max(macd.period() + 1);
        Self {
            name: format!("MACD_{}_{}_{}", fast, slow, signal),
            macd,
            min_history,
        }
    }

    /// Classify from the last MACD output and the previous histogram.
    pub fn classify(&self, current: &MacdOutput, prev_histogram: f64) -> (SignalType, f64) {
        let hist = current.histogram;
        if current.macd > current.signal && prev_histogram <= 0.0 && hist > 0.0 {
            (SignalType::Buy, 0.8)
        } else if current.macd < current.signal && prev_histogram >= 0.0 && hist < 0.0 {
            (SignalType::Sell, 0.8)
        } else if hist > 0.0 && hist > prev_histogram {
            (SignalType::Buy, 0.5)
        } else if hist < 0.0 && hist < prev_histogram {
            (SignalType::Sell, 0.5)
        } else {
            (SignalType::Neutral, 0.1)
        }
    }
}

impl Indicator for MacdIndicator {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_history(&self) -> usize {
        self.min_history
    }

    fn calculate(
        &self,
        series: &CandleSeries,
        timeframe: Timeframe,
    ) -> Result<IndicatorReading, IndicatorError> {
        let ts = series.last_open_time();
        if self.lacks_history(series) {
            return Ok(IndicatorReading::neutral(&self.name, 0.0, timeframe, ts));
        }

        let outputs = self.macd.calculate(&series.closes());
        let (current, prev_histogram) = match outputs.as_slice() {
            [.., prev, last] => (*last, prev.histogram),
            [only] => (*only, only.histogram),
            [] => {
                return Err(IndicatorError::CalculationError(format!(
                    "{} produced no values",
                    self.name
                )))
            }
        };

        let (signal, strength) = self.classify(&current, prev_histogram);
        Ok(IndicatorReading::new(
            &self.name,
            current.histogram,
            signal,
            strength,
            timeframe,
            ts,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradebot_core::types::Candle;

    fn series_from_closes(closes: &[f64]) -> CandleSeries {
        CandleSeries::from_candles(
            "ETHUSDT",
            Timeframe::Minute15,
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| Candle::new(i as i64 * 900_000, c, c, c, c, 1000.0)),
        )
    }

    fn output(macd: f64, signal: f64) -> MacdOutput {
        MacdOutput {
            macd,
            signal,
            histogram: macd - signal,
        }
    }

    #[test]
    fn test_rsi_bounds() {
        let rsi = Rsi::new(14);
        let data: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.5).sin() * 5.0).collect();
        let result = rsi.calculate(&data);

        assert!(!result.is_empty());
        for value in &result {
            assert!(*value >= 0.0 && *value <= 100.0);
        }
    }

    #[test]
    fn test_rsi_extremes() {
        let rsi = Rsi::new(5);
        let up = rsi.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let down = rsi.calculate(&[7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        let flat = rsi.calculate(&[5.0; 7]);

        assert!((up[0] - 100.0).abs() < 1e-10);
        assert!(down[0].abs() < 1e-10);
        assert!((flat[0] - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_rsi_classification() {
        let indicator = RsiIndicator::new(14);

        let (signal, strength) = indicator.classify(25.0);
        assert_eq!(signal, SignalType::Buy);
        assert!((strength - 0.5).abs() < 1e-10);

        let (signal, strength) = indicator.classify(75.0);
        assert_eq!(signal, SignalType::Sell);
        assert!((strength - 0.5).abs() < 1e-10);

        let (signal, strength) = indicator.classify(5.0);
        assert_eq!(signal, SignalType::Buy);
        assert_eq!(strength, 1.0);

        assert_eq!(indicator.classify(50.0), (SignalType::Neutral, 0.1));
    }

    #[test]
    fn test_rsi_reading_on_selloff() {
        let indicator = RsiIndicator::new(14);
        let closes: Vec<f64> = (0..20).map(|i| 200.0 - i as f64).collect();
        let reading = indicator
            .calculate(&series_from_closes(&closes), Timeframe::Minute15)
            .unwrap();

        assert_eq!(reading.name, "RSI_14");
        assert_eq!(reading.signal, SignalType::Buy);
        assert_eq!(reading.strength, 1.0);
        assert!(reading.value.abs() < 1e-10);
    }

    #[test]
    fn test_rsi_short_series_neutral() {
        let indicator = RsiIndicator::new(14);
        let reading = indicator
            .calculate(&series_from_closes(&[1.0; 14]), Timeframe::Minute15)
            .unwrap();

        assert_eq!(reading.signal, SignalType::Neutral);
        assert_eq!(reading.strength, 0.0);
        assert_eq!(reading.value, 50.0);
    }

    #[test]
    fn test_macd_uptrend() {
        let macd = Macd::new();
        let data: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let result = macd.calculate(&data);

        assert!(!result.is_empty());
        assert!(result.last().unwrap().macd > 0.0);
    }

    #[test]
    fn test_macd_output_alignment() {
        let macd = Macd::with_periods(5, 10, 3);
        let data: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        // MACD line has 30 - 10 + 1 values, signal trims 3 - 1 more
        assert_eq!(macd.calculate(&data).len(), 19);
        assert!(macd.calculate(&data[..11]).is_empty());
    }

    #[test]
    fn test_macd_classification() {
        let indicator = MacdIndicator::new(12, 26, 9);

        assert_eq!(indicator.classify(&output(1.0, 0.5), -0.1), (SignalType::Buy, 0.8));
        assert_eq!(indicator.classify(&output(-1.0, -0.5), 0.1), (SignalType::Sell, 0.8));
        assert_eq!(indicator.classify(&output(1.0, 0.6), 0.2), (SignalType::Buy, 0.5));
        assert_eq!(indicator.classify(&output(-1.0, -0.6), -0.2), (SignalType::Sell, 0.5));
        // Positive but contracting histogram
        assert_eq!(indicator.classify(&output(1.0, 0.7), 0.4), (SignalType::Neutral, 0.1));
    }

    #[test]
    fn test_macd_reading_history() {
        let indicator = MacdIndicator::new(12, 26, 9);
        assert_eq!(indicator.min_history(), 36);

        let closes: Vec<f64> = (0..35).map(|i| 100.0 + i as f64).collect();
        let reading = indicator
            .calculate(&series_from_closes(&closes), Timeframe::Minute15)
            .unwrap();
        assert_eq!(reading.signal, SignalType::Neutral);
        assert_eq!(reading.strength, 0.0);

        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin() * 4.0).collect();
        let reading = indicator
            .calculate(&series_from_closes(&closes), Timeframe::Minute15)
            .unwrap();
        assert_eq!(reading.name, "MACD_12_26_9");
        assert!(reading.strength >= 0.1 && reading.strength <= 0.8);
    }
}
