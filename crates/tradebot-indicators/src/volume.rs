//! Volume surge confirmation.

use tradebot_core::error::IndicatorError;
use tradebot_core::traits::Indicator;
use tradebot_core::types::{CandleSeries, IndicatorReading, SignalType, Timeframe};

use crate::simd;

/// Votes in the direction of the last candle's move when volume surges.
///
/// The reading value is current volume over the rolling mean volume.
#[derive(Debug, Clone)]
pub struct VolumeIndicator {
    name: String,
    period: usize,
    surge_ratio: f64,
    dry_ratio: f64,
    min_move: f64,
}

impl VolumeIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            name: format!("VOLUME_{}", period),
            period,
            surge_ratio: 2.0,
            dry_ratio: 0.5,
            min_move: 0.01,
        }
    }

    /// Classify from the volume ratio and the fractional close-to-close move.
    pub fn classify(&self, ratio: f64, price_change: f64) -> (SignalType, f64) {
        if ratio > self.surge_ratio && price_change > self.min_move {
            (SignalType::Buy, (ratio / 3.0).min(1.0))
        } else if ratio > self.surge_ratio && price_change < -self.min_move {
            (SignalType::Sell, (ratio / 3.0).min(1.0))
        } else if ratio < self.dry_ratio {
            (SignalType::Neutral, 0.2)
        } else {
            (SignalType::Neutral, 0.1)
        }
    }
}

impl Indicator for VolumeIndicator {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_history(&self) -> usize {
        // A price change needs two candles
        self.period.max(2)
    }

    fn calculate(
        &self,
        series: &CandleSeries,
        timeframe: Timeframe,
    ) -> Result<IndicatorReading, IndicatorError> {
        let ts = series.last_open_time();
        if self.lacks_history(series) {
            return Ok(IndicatorReading::neutral(&self.name, 1.0, timeframe, ts));
        }

        let volumes = series.volumes();
        let window = &volumes[volumes.len() - self.period..];
        let avg_volume = simd::mean_simd(window);
        if avg_volume <= 0.0 {
            return Err(IndicatorError::CalculationError(format!(
                "{}: no volume in window",
                self.name
            )));
        }

        let last = series.last_n(2);
        let (prev_close, close) = (last[0].close, last[1].close);
        if prev_close == 0.0 {
            return Err(IndicatorError::CalculationError(format!(
                "{}: previous close is zero",
                self.name
            )));
        }

        let ratio = volumes[volumes.len() - 1] / avg_volume;
        let price_change = (close - prev_close) / prev_close;
        let (signal, strength) = self.classify(ratio, price_change);

        Ok(IndicatorReading::new(&self.name, ratio, signal, strength, timeframe, ts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradebot_core::types::Candle;

    fn series(points: &[(f64, f64)]) -> CandleSeries {
        CandleSeries::from_candles(
            "ADAUSDT",
            Timeframe::Minute1,
            points
                .iter()
                .enumerate()
                .map(|(i, &(close, volume))| {
                    Candle::new(i as i64, close, close, close, close, volume)
                }),
        )
    }

    #[test]
    fn test_surge_with_rally_buys() {
        let mut points = vec![(100.0, 100.0); 19];
        points.push((102.0, 1000.0));
        let reading = VolumeIndicator::new(20)
            .calculate(&series(&points), Timeframe::Minute1)
            .unwrap();

        // mean = (19*100 + 1000) / 20 = 145
        assert!((reading.value - 1000.0 / 145.0).abs() < 1e-10);
        assert_eq!(reading.signal, SignalType::Buy);
        assert_eq!(reading.strength, 1.0);
    }

    #[test]
    fn test_surge_with_selloff_sells() {
        let mut points = vec![(100.0, 100.0); 19];
        points.push((98.0, 500.0));
        let reading = VolumeIndicator::new(20)
            .calculate(&series(&points), Timeframe::Minute1)
            .unwrap();

        // ratio = 500 / 120
        assert_eq!(reading.signal, SignalType::Sell);
        assert!((reading.strength - (500.0_f64 / 120.0 / 3.0).min(1.0)).abs() < 1e-10);
    }

    #[test]
    fn test_classification_neutral_bands() {
        let indicator = VolumeIndicator::new(20);
        assert_eq!(indicator.classify(0.3, 0.05), (SignalType::Neutral, 0.2));
        assert_eq!(indicator.classify(1.0, 0.05), (SignalType::Neutral, 0.1));
        // Surge without a decisive move
        assert_eq!(indicator.classify(2.5, 0.005), (SignalType::Neutral, 0.1));
        let (signal, strength) = indicator.classify(2.4, 0.02);
        assert_eq!(signal, SignalType::Buy);
        assert!((strength - 0.8).abs() < 1e-10);
    }

    #[test]
    fn test_short_series_and_zero_volume() {
        let indicator = VolumeIndicator::new(20);
        let reading = indicator.calculate(&series(&[(1.0, 1.0); 5]), Timeframe::Minute1).unwrap();
        assert_eq!(reading.value, 1.0);
        assert_eq!(reading.strength, 0.0);

        assert!(indicator.calculate(&series(&[(1.0, 0.0); 25]), Timeframe::Minute1).is_err());
    }
}
