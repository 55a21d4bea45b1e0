//! Technical indicators and multi-timeframe aggregation.
//!
//! Two layers:
//! - Series math (SMA, EMA, WMA, RSI, MACD, Bollinger Bands, ATR) over `&[f64]`
//! - Reading calculators that turn a candle series into a BUY/SELL/NEUTRAL
//!   vote with a strength in [0, 1]
//!
//! The closed set of reading calculators is [`IndicatorKind`], built from
//! configuration by [`IndicatorSpec`]. [`IndicatorEngine`] runs every
//! configured indicator over every timeframe of a symbol.

pub mod engine;
pub mod kind;
pub mod momentum;
pub mod moving_average;
pub mod simd;
pub mod volatility;
pub mod volume;

pub use engine::{IndicatorEngine, ResultStore};
pub use kind::{default_indicator_set, IndicatorKind, IndicatorSpec};
pub use momentum::{Macd, MacdIndicator, MacdOutput, Rsi, RsiIndicator};
pub use moving_average::{AverageKind, Ema, MovingAverageIndicator, Sma, Wma};
pub use volatility::{Atr, BandIndicator, BollingerBands, BollingerOutput};
pub use volume::VolumeIndicator;
