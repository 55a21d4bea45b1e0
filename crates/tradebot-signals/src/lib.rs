//! Signal generation.
//!
//! Turns a symbol's multi-timeframe indicator readings into at most one
//! [`TradingSignal`](tradebot_core::types::TradingSignal) per cycle:
//! - Weighted base score from every reading
//! - Chart pattern bonus from the 5-minute series
//! - Correlation factor from the reference symbol's 15-minute readings
//! - Full trade plan once the score clears the minimum

mod correlation;
mod generator;
mod pattern;
mod plan;
mod scorer;

pub use correlation::{CorrelationConfig, CorrelationFactor, MarketRegime};
pub use generator::{GeneratorStats, SignalContext, SignalGenerator};
pub use pattern::{PatternConfig, PatternKind, PatternMatch, PatternRecognizer};
pub use plan::{DurationBand, PlanBuilder, PlanConfig};
pub use scorer::{ScoreBreakdown, ScoringConfig, SignalScorer};
