//! Cycle engine.
//!
//! One cycle fetches candles for every symbol, aggregates indicators, scores
//! each symbol into at most one signal and then walks open positions through
//! the risk state machine. Cross-cycle state lives in [`CycleContext`].

mod context;
mod engine;
mod report;

pub use context::CycleContext;
pub use engine::{Collaborators, CycleEngine, EngineConfig};
pub use report::{CycleReport, CycleStage, SymbolFailure};
