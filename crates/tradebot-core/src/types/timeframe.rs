//! Timeframe definitions using exchange interval labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle interval.
///
/// Serialized with the exchange interval label ("1", "15", "240", "D"),
/// displayed in the human form ("1m", "4h", "1d").
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Timeframe {
    /// 1 minute candles
    #[serde(rename = "1")]
    Minute1,
    /// 3 minute candles
    #[serde(rename = "3")]
    Minute3,
    /// 5 minute candles
    #[serde(rename = "5")]
    Minute5,
    /// 15 minute candles
    #[serde(rename = "15")]
    #[default]
    Minute15,
    /// 30 minute candles
    #[serde(rename = "30")]
    Minute30,
    /// 1 hour candles
    #[serde(rename = "60")]
    Hour1,
    /// 4 hour candles
    #[serde(rename = "240")]
    Hour4,
    /// Daily candles
    #[serde(rename = "D")]
    Daily,
}

impl Timeframe {
    /// Get the duration of the timeframe in seconds.
    pub fn as_secs(&self) -> u64 {
        match self {
            Timeframe::Minute1 => 60,
            Timeframe::Minute3 => 180,
            Timeframe::Minute5 => 300,
            Timeframe::Minute15 => 900,
            Timeframe::Minute30 => 1800,
            Timeframe::Hour1 => 3600,
            Timeframe::Hour4 => 14400,
            Timeframe::Daily => 86400,
        }
    }

    /// Exchange interval label, as used in kline requests and file names.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Minute1 => "1",
            Timeframe::Minute3 => "3",
            Timeframe::Minute5 => "5",
            Timeframe::Minute15 => "15",
            Timeframe::Minute30 => "30",
            Timeframe::Hour1 => "60",
            Timeframe::Hour4 => "240",
            Timeframe::Daily => "D",
        }
    }

    /// Get all supported timeframes, shortest first.
    pub fn all() -> &'static [Timeframe] {
        &[
            Timeframe::Minute1,
            Timeframe::Minute3,
            Timeframe::Minute5,
            Timeframe::Minute15,
            Timeframe::Minute30,
            Timeframe::Hour1,
            Timeframe::Hour4,
            Timeframe::Daily,
        ]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute3 => "3m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Daily => "1d",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "1m" | "1min" => Ok(Timeframe::Minute1),
            "3" | "3m" | "3min" => Ok(Timeframe::Minute3),
            "5" | "5m" | "5min" => Ok(Timeframe::Minute5),
            "15" | "15m" | "15min" => Ok(Timeframe::Minute15),
            "30" | "30m" | "30min" => Ok(Timeframe::Minute30),
            "60" | "1h" | "hour" => Ok(Timeframe::Hour1),
            "240" | "4h" => Ok(Timeframe::Hour4),
            "d" | "1d" | "day" | "daily" => Ok(Timeframe::Daily),
            _ => Err(format!("Invalid timeframe: {}", s)),
        }
    }
}
