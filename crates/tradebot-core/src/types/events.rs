//! Events emitted by position management.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Position;

/// Kind of risk alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskAlertKind {
    /// Unrealized loss beyond the configured floor
    MaxLoss,
    /// Price jumped between consecutive observations
    RapidPriceMove,
}

impl fmt::Display for RiskAlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskAlertKind::MaxLoss => write!(f, "MAX_LOSS"),
            RiskAlertKind::RapidPriceMove => write!(f, "RAPID_PRICE_MOVE"),
        }
    }
}

/// Take-profit level a partial close refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitTarget {
    First,
    Second,
}

impl fmt::Display for ProfitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitTarget::First => write!(f, "TP1"),
            ProfitTarget::Second => write!(f, "TP2"),
        }
    }
}

/// Progress towards the next profit milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetProgress {
    pub target_price: Decimal,
    /// Milestone distance from entry, in percent
    pub target_pct: Decimal,
    /// 0..=100
    pub progress_pct: Decimal,
}

/// Trailing stop view attached to status updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingSnapshot {
    pub activated: bool,
    pub activation_price: Decimal,
    pub current_stop: Decimal,
    /// True when the stop moved recently
    pub updated: bool,
}

/// Periodic position status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub symbol: String,
    pub current_price: Decimal,
    pub entry_price: Decimal,
    pub pnl: Decimal,
    pub pnl_percentage: Decimal,
    pub next_target: Option<TargetProgress>,
    pub trailing: Option<TrailingSnapshot>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub symbol: String,
    pub kind: RiskAlertKind,
    pub message: String,
    pub position: Position,
    pub timestamp: DateTime<Utc>,
}

/// Suggestion to close part of a position at a take-profit level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitSuggestion {
    pub symbol: String,
    pub target: ProfitTarget,
    pub target_price: Decimal,
    /// Share of the position to close, in percent
    pub close_percentage: u32,
    pub profit_amount: Decimal,
    pub position: Position,
    pub timestamp: DateTime<Utc>,
}

/// Everything position management can report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ManagementEvent {
    TrailingActivated {
        symbol: String,
        price: Decimal,
        stop: Decimal,
        timestamp: DateTime<Utc>,
    },
    Status(PositionUpdate),
    PartialProfit(ProfitSuggestion),
    RiskAlert(RiskAlert),
    Closed {
        symbol: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl ManagementEvent {
    pub fn symbol(&self) -> &str {
        match self {
            ManagementEvent::TrailingActivated { symbol, .. } => symbol,
            ManagementEvent::Status(update) => &update.symbol,
            ManagementEvent::PartialProfit(suggestion) => &suggestion.symbol,
            ManagementEvent::RiskAlert(alert) => &alert.symbol,
            ManagementEvent::Closed { symbol, .. } => symbol,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ManagementEvent::TrailingActivated { .. } => "trailing_activated",
            ManagementEvent::Status(_) => "status",
            ManagementEvent::PartialProfit(_) => "partial_profit",
            ManagementEvent::RiskAlert(_) => "risk_alert",
            ManagementEvent::Closed { .. } => "closed",
        }
    }
}
