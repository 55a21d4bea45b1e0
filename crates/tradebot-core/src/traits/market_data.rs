//! Market data source trait.

use crate::error::DataError;
use crate::types::{CandleSeries, Timeframe};
use async_trait::async_trait;

/// Supplies candle series per (symbol, timeframe).
///
/// Retrieval, retries and rate limiting live behind this trait.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch up to `limit` most recent candles, oldest first.
    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<CandleSeries, DataError>;

    /// Latest traded price, if known.
    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>, DataError> {
        let series = self.candles(symbol, Timeframe::Minute1, 1).await?;
        Ok(series.last_close())
    }

    /// Get the data source name.
    fn name(&self) -> &str;
}
