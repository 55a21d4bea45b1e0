//! Market data and position sources.
//!
//! File-backed implementations of the collaborator traits: candles replayed
//! from per-timeframe CSV files and positions read from exchange-format JSON.

mod cache;
mod csv_source;
mod positions;

pub use cache::CandleCache;
pub use csv_source::{series_path, CsvDataSource};
pub use positions::{ExchangePositionRecord, JsonPositionSource};
