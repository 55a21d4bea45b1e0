//! Error types for the signal and risk engine.

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),

    #[error("Risk management error: {0}")]
    Risk(#[from] RiskError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Indicator calculation errors.
///
/// Short series are not an error for reading-level indicators (they yield a
/// neutral reading); `InsufficientData` is reserved for the raw series math.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Market data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for {symbol} {timeframe}")]
    NoDataAvailable { symbol: String, timeframe: String },

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading positions from the exchange.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Malformed position record: {0}")]
    Parse(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Notification delivery errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Signal generation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("No price available for {0}")]
    MissingPrice(String),

    #[error("No {timeframe} series for {symbol}")]
    MissingSeries { symbol: String, timeframe: String },

    #[error("Invalid trade plan: {0}")]
    InvalidPlan(String),
}

/// Position management errors.
#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Invalid position for {symbol}: {reason}")]
    InvalidPosition { symbol: String, reason: String },

    #[error("Symbol is not auto-managed: {0}")]
    NotManaged(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for engine operations.
pub type TradingResult<T> = Result<T, TradingError>;
