//! Parsed candle cache.

use std::collections::HashMap;
use std::time::SystemTime;
use tradebot_core::types::{CandleSeries, Timeframe};

#[derive(Debug, Clone)]
struct CachedSeries {
    series: CandleSeries,
    /// File modification time the series was parsed from
    modified: Option<SystemTime>,
}

/// In-memory cache of parsed series keyed by symbol and timeframe.
#[derive(Debug, Default)]
pub struct CandleCache {
    entries: HashMap<String, CachedSeries>,
}

impl CandleCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cache_key(symbol: &str, timeframe: Timeframe) -> String {
        format!("{}_{}", symbol, timeframe.label())
    }

    /// Cached series, unless the source file changed since it was parsed.
    pub fn get(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        modified: Option<SystemTime>,
    ) -> Option<&CandleSeries> {
        self.entries
            .get(&Self::cache_key(symbol, timeframe))
            .filter(|cached| cached.modified == modified)
            .map(|cached| &cached.series)
    }

    pub fn put(&mut self, series: CandleSeries, modified: Option<SystemTime>) {
        let key = Self::cache_key(&series.symbol, series.timeframe);
        self.entries.insert(key, CachedSeries { series, modified });
    }

    /// Drop every timeframe of a symbol.
    pub fn clear(&mut self, symbol: &str) {
        let prefix = format!("{}_", symbol);
        self.entries.retain(|k, _| !k.starts_with(&prefix));
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tradebot_core::types::Candle;

    fn series(symbol: &str, timeframe: Timeframe) -> CandleSeries {
        CandleSeries::from_candles(symbol, timeframe, [Candle::new(0, 1.0, 1.0, 1.0, 1.0, 1.0)])
    }

    #[test]
    fn test_stale_entries_are_ignored() {
        let mut cache = CandleCache::new();
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        cache.put(series("ETHUSDT", Timeframe::Minute5), Some(t0));

        assert!(cache.get("ETHUSDT", Timeframe::Minute5, Some(t0)).is_some());
        assert!(cache
            .get("ETHUSDT", Timeframe::Minute5, Some(t0 + Duration::from_secs(1)))
            .is_none());
        assert!(cache.get("ETHUSDT", Timeframe::Minute15, Some(t0)).is_none());
    }

    #[test]
    fn test_clear_by_symbol() {
        let mut cache = CandleCache::new();
        cache.put(series("ETHUSDT", Timeframe::Minute1), None);
        cache.put(series("ETHUSDT", Timeframe::Minute5), None);
        cache.put(series("ETHUSDTX", Timeframe::Minute1), None);

        cache.clear("ETHUSDT");
        assert_eq!(cache.len(), 1);
        assert!(cache.get("ETHUSDTX", Timeframe::Minute1, None).is_some());

        cache.clear_all();
        assert!(cache.is_empty());
    }
}
