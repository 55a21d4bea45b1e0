//! Core traits.

mod exchange;
mod indicator;
mod market_data;
mod notifier;

pub use exchange::PositionSource;
pub use indicator::{Indicator, SeriesIndicator};
pub use market_data::MarketDataSource;
pub use notifier::Notifier;
