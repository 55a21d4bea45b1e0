//! Exchange positions and summaries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Direction;

/// Position side as reported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// +1 for buy, -1 for sell.
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => -Decimal::ONE,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Side::Buy => Direction::Long,
            Side::Sell => Direction::Short,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// An open position. Read from the exchange every cycle; never created or
/// closed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    pub unrealized_pnl: Decimal,
    /// Unrealized P&L relative to position value, in percent
    pub pnl_percentage: Decimal,
    pub leverage: u32,
    pub margin: Decimal,
    /// Set when the symbol has auto-management enabled
    #[serde(default)]
    pub auto_managed: bool,
}

impl Position {
    /// Create a position marked at its entry price.
    pub fn new(symbol: impl Into<String>, side: Side, size: Decimal, entry_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            size,
            entry_price,
            current_price: entry_price,
            unrealized_pnl: Decimal::ZERO,
            pnl_percentage: Decimal::ZERO,
            leverage: 1,
            margin: Decimal::ZERO,
            auto_managed: false,
        }
    }

    pub fn with_leverage(mut self, leverage: u32) -> Self {
        self.leverage = leverage.max(1);
        self
    }

    /// Re-mark the position and recompute P&L against its entry value.
    pub fn update_price(&mut self, price: Decimal) {
        self.current_price = price;
        self.unrealized_pnl = (price - self.entry_price) * self.size * self.side.sign();

        let entry_value = self.entry_price * self.size;
        if entry_value != Decimal::ZERO {
            self.pnl_percentage = self.unrealized_pnl / entry_value * Decimal::ONE_HUNDRED;
        }
    }

    pub fn is_long(&self) -> bool {
        self.side == Side::Buy
    }

    /// Current value of the position.
    pub fn notional(&self) -> Decimal {
        self.size * self.current_price
    }
}

/// Aggregate view over open positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSummary {
    pub count: usize,
    pub auto_managed: usize,
    pub total_pnl: Decimal,
    pub avg_pnl_percentage: Decimal,
    /// Symbol with the largest absolute unrealized P&L
    pub largest: Option<String>,
}

impl PositionSummary {
    pub fn from_positions(positions: &[Position]) -> Self {
        if positions.is_empty() {
            return Self::default();
        }

        let total_pnl: Decimal = positions.iter().map(|p| p.unrealized_pnl).sum();
        let pct_sum: Decimal = positions.iter().map(|p| p.pnl_percentage).sum();
        let largest = positions
            .iter()
            .max_by_key(|p| p.unrealized_pnl.abs())
            .map(|p| p.symbol.clone());

        Self {
            count: positions.len(),
            auto_managed: positions.iter().filter(|p| p.auto_managed).count(),
            total_pnl,
            avg_pnl_percentage: pct_sum / Decimal::from(positions.len()),
            largest,
        }
    }
}
