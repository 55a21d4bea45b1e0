//! Positions read from exchange-format JSON.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tradebot_core::error::ExchangeError;
use tradebot_core::traits::PositionSource;
use tradebot_core::types::{Position, Side};

/// Position record as returned by the exchange's position list endpoint.
///
/// Numeric fields arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExchangePositionRecord {
    pub symbol: String,
    /// "Buy", "Sell", or "None" for an empty slot
    pub side: String,
    pub size: Decimal,
    pub avg_price: Decimal,
    pub mark_price: Decimal,
    pub unrealised_pnl: Decimal,
    pub position_value: Decimal,
    #[serde(rename = "positionIM")]
    pub position_im: Decimal,
    pub leverage: Decimal,
}

impl ExchangePositionRecord {
    /// Convert into a [`Position`]. Empty slots and zero-size records yield
    /// `None`.
    pub fn into_position(self) -> Option<Position> {
        if self.size.is_zero() || self.symbol.is_empty() {
            return None;
        }
        let side = match self.side.as_str() {
            "Buy" => Side::Buy,
            "Sell" => Side::Sell,
            _ => return None,
        };

        let current_price = if self.mark_price > Decimal::ZERO {
            self.mark_price
        } else {
            self.avg_price
        };
        let pnl_percentage = if self.position_value.is_zero() {
            Decimal::ZERO
        } else {
            self.unrealised_pnl / self.position_value * Decimal::ONE_HUNDRED
        };

        Some(Position {
            symbol: self.symbol,
            side,
            size: self.size.abs(),
            entry_price: self.avg_price,
            current_price,
            unrealized_pnl: self.unrealised_pnl,
            pnl_percentage,
            leverage: self.leverage.to_u32().unwrap_or(1).max(1),
            margin: self.position_im,
            auto_managed: false,
        })
    }
}

/// Either a bare array or the exchange's `{"list": [...]}` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum PositionFile {
    List(Vec<ExchangePositionRecord>),
    Envelope { list: Vec<ExchangePositionRecord> },
}

impl PositionFile {
    fn into_records(self) -> Vec<ExchangePositionRecord> {
        match self {
            PositionFile::List(records) | PositionFile::Envelope { list: records } => records,
        }
    }
}

/// Reads open positions from a JSON file kept current by an exchange bridge.
///
/// A missing file means the account is flat.
pub struct JsonPositionSource {
    path: PathBuf,
}

impl JsonPositionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PositionSource for JsonPositionSource {
    async fn open_positions(&self) -> Result<Vec<Position>, ExchangeError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No positions file");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let file: PositionFile =
            serde_json::from_str(&raw).map_err(|e| ExchangeError::Parse(e.to_string()))?;

        let mut positions = Vec::new();
        for record in file.into_records() {
            let symbol = record.symbol.clone();
            match record.into_position() {
                Some(position) if position.entry_price > Decimal::ZERO => positions.push(position),
                Some(_) => warn!(symbol = %symbol, "Skipping position without entry price"),
                None => {}
            }
        }
        Ok(positions)
    }

    fn name(&self) -> &str {
        "json"
    }
}
