//! Core data types.

mod candle;
mod events;
mod position;
mod reading;
mod signal;
mod timeframe;

pub use candle::{Candle, CandleSeries, TimeframeSeries};
pub use events::{
    ManagementEvent, PositionUpdate, ProfitSuggestion, ProfitTarget, RiskAlert, RiskAlertKind,
    TargetProgress, TrailingSnapshot,
};
pub use position::{Position, PositionSummary, Side};
pub use reading::{IndicatorReading, IndicatorResultSet, IndicatorSummary, SignalType};
pub use signal::{Direction, EntryZone, ProfitScenarios, TradingSignal};
pub use timeframe::Timeframe;
