//! Core types and traits for the signal and risk engine.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Candle, CandleSeries, Timeframe)
//! - Indicator readings and per-symbol result sets
//! - Trading signals with their trade plans
//! - Exchange positions and position-management events
//! - Collaborator traits for market data, positions and notifications

pub mod types;
pub mod traits;
pub mod error;

pub use error::{TradingError, TradingResult};
pub use types::*;
pub use traits::*;
