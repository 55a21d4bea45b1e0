//! Volatility indicators: Bollinger Bands and ATR.

use serde::{Deserialize, Serialize};
use tradebot_core::error::IndicatorError;
use tradebot_core::traits::{Indicator, SeriesIndicator};
use tradebot_core::types::{CandleSeries, IndicatorReading, SignalType, Timeframe};

use crate::simd;

/// Average True Range as a plain mean of the latest true ranges.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Mean true range over the last `period` candles.
    ///
    /// The oldest candle in the series has no previous close and contributes
    /// its high-low range. Returns `None` when the series is shorter than the
    /// period.
    pub fn latest(&self, series: &CandleSeries) -> Option<f64> {
        if series.len() < self.period {
            return None;
        }

        let mut prev_close = None;
        let true_ranges: Vec<f64> = series
            .iter()
            .map(|c| {
                let tr = c.true_range(prev_close);
                prev_close = Some(c.close);
                tr
            })
            .collect();

        let window = &true_ranges[true_ranges.len() - self.period..];
        Some(simd::sum_simd(window) / self.period as f64)
    }
}

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerOutput {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// (price - lower) / (upper - lower), 0.5 when the bands collapse
    pub percent_b: f64,
}

/// Bollinger Bands over a population standard deviation.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    /// Standard 20 / 2.0.
    pub fn new() -> Self {
        Self::with_params(20, 2.0)
    }

    pub fn with_params(period: usize, std_dev_multiplier: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(
            std_dev_multiplier > 0.0,
            "Std dev multiplier must be positive"
        );
        Self {
            period,
            std_dev_multiplier,
        }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesIndicator for BollingerBands {
    type Output = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> Vec<BollingerOutput> {
        if data.len() < self.period {
            return vec![];
        }

        let period_f64 = self.period as f64;
        let deviations = simd::std_dev_simd(data, self.period);

        data.windows(self.period)
            .zip(deviations)
            .map(|(window, std_dev)| {
                let mean = simd::sum_simd(window) / period_f64;
                let upper = mean + self.std_dev_multiplier * std_dev;
                let lower = mean - self.std_dev_multiplier * std_dev;
                let price = window[window.len() - 1];
                let percent_b = if upper != lower {
                    (price - lower) / (upper - lower)
                } else {
                    0.5
                };

                BollingerOutput {
                    upper,
                    middle: mean,
                    lower,
                    percent_b,
                }
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "Bollinger Bands"
    }
}

/// Band-position vote: buys near the lower band, sells near the upper band.
///
/// The reading value is the price position within the bands on a 0-100
/// scale (can fall outside when price breaks a band).
#[derive(Debug, Clone)]
pub struct BandIndicator {
    name: String,
    bands: BollingerBands,
    period: usize,
}

impl BandIndicator {
    pub fn new(period: usize, std_dev: f64) -> Self {
        Self {
            name: format!("BB_{}_{:?}", period, std_dev),
            bands: BollingerBands::with_params(period, std_dev),
            period,
        }
    }

    /// Map a 0-100 band position to a vote.
    pub fn classify(&self, position: f64) -> (SignalType, f64) {
        if position <= 10.0 {
            (SignalType::Buy, ((10.0 - position) / 10.0).min(1.0))
        } else if position >= 90.0 {
            (SignalType::Sell, ((position - 90.0) / 10.0).min(1.0))
        } else {
            (SignalType::Neutral, 0.1)
        }
    }
}

impl Indicator for BandIndicator {
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
            return Ok(IndicatorReading::neutral(&self.name, 50.0, timeframe, ts));
        }

        let latest = self.bands.calculate(&series.closes()).last().copied().ok_or_else(|| {
            IndicatorError::CalculationError(format!("{} produced no values", self.name))
        })?;

        let position = latest.percent_b * 100.0;
        if !position.is_finite() {
            return Err(IndicatorError::CalculationError(format!(
                "{} band position is not finite",
                self.name
            )));
        }

        let (signal, strength) = self.classify(position);
        Ok(IndicatorReading::new(&self.name, position, signal, strength, timeframe, ts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradebot_core::types::Candle;

    fn series_from_closes(closes: &[f64]) -> CandleSeries {
        CandleSeries::from_candles(
            "SOLUSDT",
            Timeframe::Minute5,
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| Candle::new(i as i64, c, c, c, c, 1000.0)),
        )
    }

    #[test]
    fn test_bollinger_bands() {
        let bb = BollingerBands::with_params(5, 2.0);
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = bb.calculate(&data);

        assert_eq!(result.len(), 1);
        let out = result[0];
        assert!((out.middle - 3.0).abs() < 1e-10);
        // population std dev of 1..5 is sqrt(2)
        assert!((out.upper - (3.0 + 2.0 * 2f64.sqrt())).abs() < 1e-10);
        assert!(out.upper > out.middle && out.middle > out.lower);
    }

    #[test]
    fn test_collapsed_bands_read_midpoint() {
        let bb = BollingerBands::with_params(5, 2.0);
        let result = bb.calculate(&[7.0; 6]);
        assert_eq!(result.len(), 2);
        assert!((result[1].percent_b - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_band_classification() {
        let indicator = BandIndicator::new(20, 2.0);
        assert_eq!(indicator.name(), "BB_20_2.0");

        assert_eq!(indicator.classify(0.0), (SignalType::Buy, 1.0));
        let (signal, strength) = indicator.classify(95.0);
        assert_eq!(signal, SignalType::Sell);
        assert!((strength - 0.5).abs() < 1e-10);
        assert_eq!(indicator.classify(50.0), (SignalType::Neutral, 0.1));
        // Outside the lower band still caps at 1
        assert_eq!(indicator.classify(-30.0), (SignalType::Buy, 1.0));
    }

    #[test]
    fn test_band_reading_on_drop() {
        let mut closes = vec![100.0; 19];
        closes.push(90.0);
        let reading = BandIndicator::new(20, 2.0)
            .calculate(&series_from_closes(&closes), Timeframe::Minute5)
            .unwrap();

        assert_eq!(reading.signal, SignalType::Buy);
        assert_eq!(reading.strength, 1.0);
        assert!(reading.value < 0.0);
    }

    #[test]
    fn test_band_short_series() {
        let reading = BandIndicator::new(20, 2.0)
            .calculate(&series_from_closes(&[100.0; 5]), Timeframe::Minute5)
            .unwrap();
        assert_eq!(reading.value, 50.0);
        assert_eq!(reading.strength, 0.0);
    }

    #[test]
    fn test_atr_mean_true_range() {
        let series = CandleSeries::from_candles(
            "SOLUSDT",
            Timeframe::Minute15,
            vec![
                Candle::new(0, 10.0, 12.0, 9.0, 11.0, 1.0),
                Candle::new(1, 11.0, 13.0, 10.0, 12.0, 1.0),
                // Gap up: true range reaches back to the previous close
                Candle::new(2, 15.0, 16.0, 15.0, 15.5, 1.0),
            ],
        );

        let atr = Atr::new(2);
        // TRs: 3, 3, max(1, 4, 3) = 4
        assert!((atr.latest(&series).unwrap() - 3.5).abs() < 1e-10);
        assert!((Atr::new(3).latest(&series).unwrap() - 10.0 / 3.0).abs() < 1e-10);
        assert!(Atr::new(4).latest(&series).is_none());
    }
}
