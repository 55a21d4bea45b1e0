//! Take-profit milestones and partial close suggestions.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tradebot_core::types::{Position, ProfitSuggestion, ProfitTarget, Side};

/// Suggests partial closes once price reaches fixed distances from entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfitTaker {
    /// Distance of the first target from entry, as a fraction
    pub first_target_pct: Decimal,
    pub first_close_pct: u32,
    pub second_target_pct: Decimal,
    pub second_close_pct: u32,
    /// Quiet period before the same suggestion repeats
    pub cooldown_mins: i64,
}

impl Default for ProfitTaker {
    fn default() -> Self {
        Self {
            first_target_pct: dec!(0.04),
            first_close_pct: 50,
            second_target_pct: dec!(0.08),
            second_close_pct: 100,
            cooldown_mins: 10,
        }
    }
}

impl ProfitTaker {
    /// Target prices for a position, first target first.
    pub fn targets(&self, position: &Position) -> [(ProfitTarget, Decimal, u32); 2] {
        let entry = position.entry_price;
        let price_at = |pct: Decimal| match position.side {
            Side::Buy => entry * (Decimal::ONE + pct),
            Side::Sell => entry * (Decimal::ONE - pct),
        };
        [
            (
                ProfitTarget::First,
                price_at(self.first_target_pct),
                self.first_close_pct,
            ),
            (
                ProfitTarget::Second,
                price_at(self.second_target_pct),
                self.second_close_pct,
            ),
        ]
    }

    /// Suggestions for every target the current price has reached.
    ///
    /// `notified` remembers when each (target, percentage) pair last fired
    /// for this position.
    pub fn check(
        &self,
        position: &Position,
        notified: &mut HashMap<String, DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Vec<ProfitSuggestion> {
        let cooldown = Duration::minutes(self.cooldown_mins);
        let price = position.current_price;

        self.targets(position)
            .into_iter()
            .filter(|(_, target_price, _)| match position.side {
                Side::Buy => price >= *target_price,
                Side::Sell => price <= *target_price,
            })
            .filter_map(|(target, target_price, close_pct)| {
                let key = format!("{}_{}", target, close_pct);
                if let Some(at) = notified.get(&key) {
                    if now.signed_duration_since(*at) < cooldown {
                        return None;
                    }
                }
                notified.insert(key, now);

                Some(ProfitSuggestion {
                    symbol: position.symbol.clone(),
                    target,
                    target_price,
                    close_percentage: close_pct,
                    profit_amount: position.unrealized_pnl * Decimal::from(close_pct)
                        / Decimal::ONE_HUNDRED,
                    position: position.clone(),
                    timestamp: now,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(side: Side, price: Decimal) -> Position {
        let mut position = Position::new("ETHUSDT", side, dec!(2), dec!(100));
        position.update_price(price);
        position
    }

    #[test]
    fn test_no_suggestion_below_first_target() {
        let taker = ProfitTaker::default();
        let mut notified = HashMap::new();
        let suggestions = taker.check(&marked(Side::Buy, dec!(103.9)), &mut notified, Utc::now());
        assert!(suggestions.is_empty());
        assert!(notified.is_empty());
    }

    #[test]
    fn test_first_target_suggests_half() {
        let taker = ProfitTaker::default();
        let mut notified = HashMap::new();
        let suggestions = taker.check(&marked(Side::Buy, dec!(105)), &mut notified, Utc::now());

        assert_eq!(suggestions.len(), 1);
        let s = &suggestions[0];
        assert_eq!(s.target, ProfitTarget::First);
        assert_eq!(s.target_price, dec!(104));
        assert_eq!(s.close_percentage, 50);
        // Unrealized 10 on size 2
        assert_eq!(s.profit_amount, dec!(5));
    }

    #[test]
    fn test_both_targets_fire_past_second() {
        let taker = ProfitTaker::default();
        let mut notified = HashMap::new();
        let suggestions = taker.check(&marked(Side::Buy, dec!(109)), &mut notified, Utc::now());

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[1].target, ProfitTarget::Second);
        assert_eq!(suggestions[1].close_percentage, 100);
        assert_eq!(suggestions[1].profit_amount, dec!(18));
    }

    #[test]
    fn test_short_targets_below_entry() {
        let taker = ProfitTaker::default();
        let mut notified = HashMap::new();
        let suggestions = taker.check(&marked(Side::Sell, dec!(95)), &mut notified, Utc::now());

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].target_price, dec!(96));
    }

    #[test]
    fn test_cooldown_suppresses_repeats() {
        let taker = ProfitTaker::default();
        let mut notified = HashMap::new();
        let position = marked(Side::Buy, dec!(105));
        let now = Utc::now();

        assert_eq!(taker.check(&position, &mut notified, now).len(), 1);
        assert!(taker
            .check(&position, &mut notified, now + Duration::minutes(9))
            .is_empty());
        assert_eq!(
            taker
                .check(&position, &mut notified, now + Duration::minutes(10))
                .len(),
            1
        );
    }
}
