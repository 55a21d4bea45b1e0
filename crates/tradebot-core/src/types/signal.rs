//! Trading signals and their trade plans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::Timeframe;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// One tranche of a split entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryZone {
    /// 1-based fill order
    pub order: u8,
    pub price: f64,
    /// Share of the position, all zones sum to 1.0
    pub ratio: f64,
    /// Capital allotted to this tranche
    pub amount: f64,
}

/// Expected profit per take-profit level and loss at the stop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitScenarios {
    pub targets: Vec<f64>,
    pub stop_loss: f64,
}

/// A scored, fully planned trade idea. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub id: Uuid,
    pub symbol: String,
    pub direction: Direction,
    /// Integer score in [0, 100]
    pub score: u8,
    /// score / 100
    pub confidence: f64,
    pub entry_price: f64,
    pub entry_zones: Vec<EntryZone>,
    pub stop_loss: f64,
    /// Nearest target first
    pub take_profits: Vec<f64>,
    pub trailing_stop_activation: f64,
    /// Position value to commit
    pub recommended_size: f64,
    /// Capital lost if the stop is hit at the recommended size
    pub risk_amount: f64,
    pub leverage: u32,
    pub risk_reward_ratio: f64,
    /// Fractional volatility the plan was built with
    pub volatility: f64,
    pub primary_reasons: Vec<String>,
    pub supporting_factors: Vec<String>,
    pub risk_factors: Vec<String>,
    pub pattern: Option<String>,
    pub scenarios: ProfitScenarios,
    pub expected_duration: String,
    pub timeframe: Timeframe,
    pub created_at: DateTime<Utc>,
}

impl TradingSignal {
    /// Sum of entry zone ratios.
    pub fn total_entry_ratio(&self) -> f64 {
        self.entry_zones.iter().map(|z| z.ratio).sum()
    }

    /// Volume-weighted average price if every tranche fills.
    pub fn average_entry_price(&self) -> f64 {
        let total = self.total_entry_ratio();
        if total <= 0.0 {
            return self.entry_price;
        }
        self.entry_zones.iter().map(|z| z.price * z.ratio).sum::<f64>() / total
    }

    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }
}
