//! OHLCV candle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use super::Timeframe;

/// Candle series of one symbol keyed by timeframe.
pub type TimeframeSeries = BTreeMap<Timeframe, CandleSeries>;

/// Compact OHLCV candle.
/// Uses f64 for fast indicator calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time, Unix milliseconds
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Create a new candle.
    pub fn new(open_time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Calculate the candle's range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Get the open time as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.open_time).unwrap_or_default()
    }

    /// Calculate the true range (used for ATR).
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            Some(pc) => {
                let hl = self.high - self.low;
                let hc = (self.high - pc).abs();
                let lc = (self.low - pc).abs();
                hl.max(hc).max(lc)
            }
            None => self.high - self.low,
        }
    }
}

/// Chronological candles for one (symbol, timeframe).
///
/// Producers append; the engine only reads.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    candles: VecDeque<Candle>,
    /// Maximum capacity (0 = unlimited)
    capacity: usize,
}

impl CandleSeries {
    /// Create a new empty series.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            candles: VecDeque::new(),
            capacity: 0,
        }
    }

    /// Create a series with a maximum capacity.
    /// When capacity is reached, oldest candles are removed.
    pub fn with_capacity(symbol: impl Into<String>, timeframe: Timeframe, capacity: usize) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a series from already ordered candles.
    pub fn from_candles(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        candles: impl IntoIterator<Item = Candle>,
    ) -> Self {
        let mut series = Self::new(symbol, timeframe);
        series.extend(candles);
        series
    }

    /// Push a new candle, removing the oldest if at capacity.
    pub fn push(&mut self, candle: Candle) {
        if self.capacity > 0 && self.candles.len() >= self.capacity {
            self.candles.pop_front();
        }
        self.candles.push_back(candle);
    }

    pub fn extend(&mut self, candles: impl IntoIterator<Item = Candle>) {
        for candle in candles {
            self.push(candle);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Get the last N candles, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<&Candle> {
        let start = self.candles.len().saturating_sub(n);
        self.candles.iter().skip(start).collect()
    }

    /// Keep only the most recent `n` candles.
    pub fn truncate_front(&mut self, n: usize) {
        while self.candles.len() > n {
            self.candles.pop_front();
        }
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    /// Close of the most recent candle.
    pub fn last_close(&self) -> Option<f64> {
        self.candles.back().map(|c| c.close)
    }

    /// Open time of the most recent candle, 0 when empty.
    pub fn last_open_time(&self) -> i64 {
        self.candles.back().map(|c| c.open_time).unwrap_or(0)
    }

    /// Get a candle by index (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_true_range() {
        let candle = Candle::new(1000, 100.0, 110.0, 95.0, 105.0, 1000.0);

        assert!((candle.range() - 15.0).abs() < 1e-10);
        assert!((candle.true_range(None) - 15.0).abs() < 1e-10);
        // Gap below the previous close widens the range
        assert!((candle.true_range(Some(90.0)) - 20.0).abs() < 1e-10);
        assert!((candle.true_range(Some(120.0)) - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_series_capacity() {
        let mut series = CandleSeries::with_capacity("BTCUSDT", Timeframe::Minute1, 3);
        for i in 0..4 {
            let p = 100.0 + i as f64;
            series.push(Candle::new(i, p, p + 1.0, p - 1.0, p, 10.0));
        }

        assert_eq!(series.len(), 3);
        assert_eq!(series.get(0).unwrap().open_time, 1);
        assert_eq!(series.last_close(), Some(103.0));
        assert_eq!(series.last_open_time(), 3);
    }

    #[test]
    fn test_series_extractions() {
        let series = CandleSeries::from_candles(
            "ETHUSDT",
            Timeframe::Minute5,
            vec![
                Candle::new(1, 100.0, 101.0, 99.0, 100.5, 1000.0),
                Candle::new(2, 100.5, 102.0, 100.0, 101.5, 2000.0),
            ],
        );

        assert_eq!(series.closes(), vec![100.5, 101.5]);
        assert_eq!(series.highs(), vec![101.0, 102.0]);
        assert_eq!(series.lows(), vec![99.0, 100.0]);
        assert_eq!(series.volumes(), vec![1000.0, 2000.0]);
        assert_eq!(series.last_n(1)[0].open_time, 2);
    }

    #[test]
    fn test_truncate_front_keeps_latest() {
        let mut series = CandleSeries::from_candles(
            "ETHUSDT",
            Timeframe::Minute5,
            (0..10).map(|i| Candle::new(i, 1.0, 1.0, 1.0, 1.0, 1.0)),
        );
        series.truncate_front(4);
        assert_eq!(series.len(), 4);
        assert_eq!(series.get(0).unwrap().open_time, 6);
    }

    #[test]
    fn test_empty_series() {
        let series = CandleSeries::new("XRPUSDT", Timeframe::Daily);
        assert!(series.is_empty());
        assert_eq!(series.last_close(), None);
        assert_eq!(series.last_open_time(), 0);
    }
}
