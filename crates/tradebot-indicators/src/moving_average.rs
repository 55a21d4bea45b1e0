//! Moving averages and the price-vs-average reading.

use serde::{Deserialize, Serialize};
use tradebot_core::error::IndicatorError;
use tradebot_core::traits::{Indicator, SeriesIndicator};
use tradebot_core::types::{CandleSeries, IndicatorReading, SignalType, Timeframe};

/// Simple Moving Average (SMA).
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl SeriesIndicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let mut result = Vec::with_capacity(data.len() - self.period + 1);
        let period_f64 = self.period as f64;

        let mut sum: f64 = data[..self.period].iter().sum();
        result.push(sum / period_f64);

        // Sliding window
        for i in self.period..data.len() {
            sum = sum - data[i - self.period] + data[i];
            result.push(sum / period_f64);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA), seeded with the SMA of the first window.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        let multiplier = 2.0 / (period as f64 + 1.0);
        Self { period, multiplier }
    }
}

impl SeriesIndicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let mut result = Vec::with_capacity(data.len() - self.period + 1);

        let seed: f64 = data[..self.period].iter().sum::<f64>() / self.period as f64;
        result.push(seed);

        let mut ema = seed;
        let one_minus_mult = 1.0 - self.multiplier;
        for &price in &data[self.period..] {
            ema = price * self.multiplier + ema * one_minus_mult;
            result.push(ema);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

/// Weighted Moving Average (WMA), linearly decreasing weights.
#[derive(Debug, Clone)]
pub struct Wma {
    period: usize,
    weights_sum: f64,
}

impl Wma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        // 1 + 2 + ... + n
        let weights_sum = (period * (period + 1)) as f64 / 2.0;
        Self { period, weights_sum }
    }
}

impl SeriesIndicator for Wma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        data.windows(self.period)
            .map(|window| {
                let weighted: f64 = window
                    .iter()
                    .enumerate()
                    .map(|(i, &price)| price * (i + 1) as f64)
                    .sum();
                weighted / self.weights_sum
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "WMA"
    }
}

/// Averaging method for [`MovingAverageIndicator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AverageKind {
    #[default]
    Simple,
    Exponential,
    Weighted,
}

impl AverageKind {
    /// Prefix used in reading names.
    pub fn prefix(&self) -> &'static str {
        match self {
            AverageKind::Simple => "SMA",
            AverageKind::Exponential => "EMA",
            AverageKind::Weighted => "WMA",
        }
    }

    /// Compute the average series for `period`.
    pub fn series(&self, period: usize, data: &[f64]) -> Vec<f64> {
        match self {
            AverageKind::Simple => Sma::new(period).calculate(data),
            AverageKind::Exponential => Ema::new(period).calculate(data),
            AverageKind::Weighted => Wma::new(period).calculate(data),
        }
    }
}

/// Price position against a moving average, confirmed by the average's slope.
///
/// BUY when price is above the average and the average rises by more than
/// the slope threshold (in percent per candle); SELL is the mirror image.
#[derive(Debug, Clone)]
pub struct MovingAverageIndicator {
    name: String,
    period: usize,
    kind: AverageKind,
    slope_threshold: f64,
}

impl MovingAverageIndicator {
    pub fn new(period: usize, kind: AverageKind) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            name: format!("{}_{}", kind.prefix(), period),
            period,
            kind,
            slope_threshold: 0.1,
        }
    }

    pub fn kind(&self) -> AverageKind {
        self.kind
    }

    /// Classify from percent distance to the average and percent slope.
    pub fn classify(
        &self,
        price: f64,
        average: f64,
        price_vs_ma: f64,
        slope: f64,
    ) -> (SignalType, f64) {
        let strength = (price_vs_ma.abs() / 2.0 + slope.abs()).min(1.0);
        if price > average && slope > self.slope_threshold {
            (SignalType::Buy, strength)
        } else if price < average && slope < -self.slope_threshold {
            (SignalType::Sell, strength)
        } else {
            (SignalType::Neutral, 0.1)
        }
    }
}

impl Indicator for MovingAverageIndicator {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_history(&self) -> usize {
        self.period
    }

    fn calculate(
        &self,
        series: &CandleSeries,
        timeframe: Timeframe,
    ) -> Result<IndicatorReading, IndicatorError> {
        let ts = series.last_open_time();
        if self.lacks_history(series) {
            let value = series.last_close().unwrap_or(0.0);
            return Ok(IndicatorReading::neutral(&self.name, value, timeframe, ts));
        }

        let closes = series.closes();
        let averages = self.kind.series(self.period, &closes);
        let (current, previous) = match averages.as_slice() {
            [.., prev, last] => (*last, *prev),
            [only] => (*only, *only),
            [] => {
                return Err(IndicatorError::CalculationError(format!(
                    "{} produced no values",
                    self.name
                )))
            }
        };

        if current == 0.0 || previous == 0.0 {
            return Err(IndicatorError::CalculationError(format!(
                "{} average is zero",
                self.name
            )));
        }

        let price = closes[closes.len() - 1];
        let price_vs_ma = (price - current) / current * 100.0;
        let slope = (current - previous) / previous * 100.0;
        let (signal, strength) = self.classify(price, current, price_vs_ma, slope);

        Ok(IndicatorReading::new(&self.name, current, signal, strength, timeframe, ts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradebot_core::types::Candle;

    fn series_from_closes(closes: &[f64]) -> CandleSeries {
        CandleSeries::from_candles(
            "ETHUSDT",
            Timeframe::Minute5,
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| Candle::new(i as i64, c, c, c, c, 1000.0)),
        )
    }

    #[test]
    fn test_sma() {
        let sma = Sma::new(3);
        let result = sma.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 1e-10);
        assert!((result[1] - 3.0).abs() < 1e-10);
        assert!((result[2] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_insufficient_data() {
        assert!(Sma::new(5).calculate(&[1.0, 2.0, 3.0]).is_empty());
        assert!(Ema::new(5).calculate(&[1.0, 2.0, 3.0]).is_empty());
        assert!(Wma::new(5).calculate(&[1.0, 2.0, 3.0]).is_empty());
    }

    #[test]
    fn test_ema() {
        let ema = Ema::new(3);
        let result = ema.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(result.len(), 3);
        // Seed is the SMA of the first window
        assert!((result[0] - 2.0).abs() < 1e-10);
        // multiplier 0.5: 4*0.5 + 2*0.5
        assert!((result[1] - 3.0).abs() < 1e-10);
        assert!((result[2] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_wma() {
        let wma = Wma::new(3);
        let result = wma.calculate(&[1.0, 2.0, 3.0]);

        // (1*1 + 2*2 + 3*3) / 6
        assert_eq!(result.len(), 1);
        assert!((result[0] - 14.0 / 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_average_kind_names() {
        assert_eq!(MovingAverageIndicator::new(21, AverageKind::Exponential).name(), "EMA_21");
        assert_eq!(MovingAverageIndicator::new(8, AverageKind::Simple).name(), "SMA_8");
        assert_eq!(MovingAverageIndicator::new(10, AverageKind::Weighted).name(), "WMA_10");
    }

    #[test]
    fn test_short_series_is_neutral_at_last_close() {
        let indicator = MovingAverageIndicator::new(50, AverageKind::Simple);
        let reading = indicator
            .calculate(&series_from_closes(&[10.0, 11.0, 12.0]), Timeframe::Minute5)
            .unwrap();

        assert_eq!(reading.signal, SignalType::Neutral);
        assert_eq!(reading.strength, 0.0);
        assert_eq!(reading.value, 12.0);
    }

    #[test]
    fn test_strong_uptrend_buys() {
        let closes: Vec<f64> = (0..=20).map(|i| 100.0 + i as f64).collect();
        let indicator = MovingAverageIndicator::new(8, AverageKind::Simple);
        let reading = indicator
            .calculate(&series_from_closes(&closes), Timeframe::Minute5)
            .unwrap();

        // MA 116.5, prev 115.5: 3.0% above the average, slope 0.87%
        assert_eq!(reading.signal, SignalType::Buy);
        assert!((reading.strength - 1.0).abs() < 1e-10);
        assert!((reading.value - 116.5).abs() < 1e-10);
    }

    #[test]
    fn test_downtrend_sells() {
        let closes: Vec<f64> = (0..=20).map(|i| 200.0 - i as f64).collect();
        let indicator = MovingAverageIndicator::new(8, AverageKind::Exponential);
        let reading = indicator
            .calculate(&series_from_closes(&closes), Timeframe::Minute5)
            .unwrap();

        assert_eq!(reading.signal, SignalType::Sell);
        assert!(reading.strength > 0.0 && reading.strength <= 1.0);
    }

    #[test]
    fn test_flat_slope_is_neutral() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 0.01).collect();
        let indicator = MovingAverageIndicator::new(8, AverageKind::Simple);
        let reading = indicator
            .calculate(&series_from_closes(&closes), Timeframe::Minute5)
            .unwrap();

        assert_eq!(reading.signal, SignalType::Neutral);
        assert!((reading.strength - 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_zero_average_is_error() {
        let closes = vec![0.0; 10];
        let indicator = MovingAverageIndicator::new(5, AverageKind::Simple);
        assert!(indicator.calculate(&series_from_closes(&closes), Timeframe::Minute5).is_err());
    }
}
