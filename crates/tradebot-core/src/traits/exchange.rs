//! Exchange position lookup.

use crate::error::ExchangeError;
use crate::types::Position;
use async_trait::async_trait;

/// Read-only view of the account's open positions.
///
/// The engine never submits or cancels orders.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// All positions with non-zero size.
    async fn open_positions(&self) -> Result<Vec<Position>, ExchangeError>;

    /// Position for a specific symbol, if open.
    async fn position(&self, symbol: &str) -> Result<Option<Position>, ExchangeError> {
        let positions = self.open_positions().await?;
        Ok(positions.into_iter().find(|p| p.symbol == symbol))
    }

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use rust_decimal_macros::dec;

    struct Fixed(Vec<Position>);

    #[async_trait]
    impl PositionSource for Fixed {
        async fn open_positions(&self) -> Result<Vec<Position>, ExchangeError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_position_lookup_by_symbol() {
        let source = Fixed(vec![
            Position::new("ETHUSDT", Side::Buy, dec!(1), dec!(100)),
            Position::new("SOLUSDT", Side::Sell, dec!(3), dec!(20)),
        ]);

        let sol = source.position("SOLUSDT").await.unwrap().unwrap();
        assert_eq!(sol.side, Side::Sell);
        assert!(source.position("XRPUSDT").await.unwrap().is_none());
    }
}
