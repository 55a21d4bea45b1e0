//! CSV candle source.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;
use tradebot_core::error::DataError;
use tradebot_core::traits::MarketDataSource;
use tradebot_core::types::{Candle, CandleSeries, Timeframe};

use crate::cache::CandleCache;

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "open_time",
        alias = "openTime",
        alias = "start",
        alias = "timestamp",
        alias = "Timestamp",
        alias = "Date",
        alias = "date"
    )]
    time: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

/// Path of the file holding `symbol` candles on `timeframe`:
/// `{dir}/{SYMBOL}_{label}.csv`, e.g. `data/ETHUSDT_15.csv`.
pub fn series_path(dir: &Path, symbol: &str, timeframe: Timeframe) -> PathBuf {
    dir.join(format!("{}_{}.csv", symbol, timeframe.label()))
}

/// Replays candles from one CSV file per symbol and timeframe.
///
/// Files are re-read when their modification time changes, so an external
/// downloader can keep appending while the engine runs.
pub struct CsvDataSource {
    dir: PathBuf,
    cache: Mutex<CandleCache>,
}

impl CsvDataSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(CandleCache::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Forget parsed series so the next request re-reads from disk.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear_all();
    }

    async fn load(&self, symbol: &str, timeframe: Timeframe) -> Result<CandleSeries, DataError> {
        let path = series_path(&self.dir, symbol, timeframe);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::NoDataAvailable {
                    symbol: symbol.to_string(),
                    timeframe: timeframe.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let modified = metadata.modified().ok();

        if let Some(series) = self.cache.lock().await.get(symbol, timeframe, modified) {
            return Ok(series.clone());
        }

        let bytes = tokio::fs::read(&path).await?;
        let series = parse_series(symbol, timeframe, &bytes)?;
        debug!(
            symbol,
            timeframe = %timeframe,
            candles = series.len(),
            path = %path.display(),
            "Loaded candles"
        );

        self.cache.lock().await.put(series.clone(), modified);
        Ok(series)
    }
}

#[async_trait]
impl MarketDataSource for CsvDataSource {
    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<CandleSeries, DataError> {
        let mut series = self.load(symbol, timeframe).await?;
        series.truncate_front(limit);
        Ok(series)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Parse a whole file, oldest candle first.
fn parse_series(
    symbol: &str,
    timeframe: Timeframe,
    bytes: &[u8],
) -> Result<CandleSeries, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut candles = Vec::new();
    for result in reader.deserialize() {
        let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
        let open_time = parse_timestamp(&record.time)?;
        candles.push(Candle::new(
            open_time,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    candles.sort_by_key(|c| c.open_time);
    candles.dedup_by_key(|c| c.open_time);

    if candles.is_empty() {
        return Err(DataError::NoDataAvailable {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
        });
    }
    Ok(CandleSeries::from_candles(symbol, timeframe, candles))
}

/// Milliseconds since the epoch from the formats exchanges and exports use.
fn parse_timestamp(raw: &str) -> Result<i64, DataError> {
    if let Ok(ts) = raw.parse::<i64>() {
        // More than 10 digits is already milliseconds
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Some(dt) = NaiveDate::parse_from_str(raw, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    Err(DataError::ParseError(format!("Could not parse timestamp: {}", raw)))
}
