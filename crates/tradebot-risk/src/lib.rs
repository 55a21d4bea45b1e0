//! Risk management.
//!
//! Two halves:
//! - Plan-side policy used when a signal is built: position sizing,
//!   leverage and the volatility-scaled stop distance
//! - The position risk state machine for auto-managed positions: trailing
//!   stop, partial-profit suggestions, risk alerts and throttled status
//!   updates, with all per-symbol state held in one [`RiskStateStore`]

mod alerts;
mod manager;
mod partial_profit;
mod position_sizer;
mod state;
mod stop_loss;
mod trailing;

pub use alerts::RiskAlerter;
pub use manager::{ManagementConfig, PositionManager};
pub use partial_profit::ProfitTaker;
pub use position_sizer::{PositionSize, PositionSizer, SizingConfig};
pub use state::{
    load_snapshot, save_snapshot, AutoManagementSettings, ManagementSnapshot, ManagementState,
    RiskStateStore, SettingsMerge, SymbolRiskState,
};
pub use stop_loss::StopPolicy;
pub use trailing::{TrailingStep, TrailingStop, TrailingStopState};
