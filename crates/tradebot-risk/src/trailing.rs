//! Trailing stop tracking for managed positions.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tradebot_core::types::{Position, Side, TrailingSnapshot};

/// Per-position trailing stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStopState {
    pub side: Side,
    /// Price at which the stop starts to trail
    pub activation_price: Decimal,
    pub current_stop: Decimal,
    pub highest_price: Decimal,
    pub lowest_price: Decimal,
    pub activated: bool,
    /// When the stop last moved
    pub last_update: Option<DateTime<Utc>>,
}

impl TrailingStopState {
    /// Whether the stop moved within `window` of `now`.
    pub fn recently_updated(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.last_update
            .map(|at| now.signed_duration_since(at) <= window)
            .unwrap_or(false)
    }

    pub fn snapshot(&self, now: DateTime<Utc>, window: Duration) -> TrailingSnapshot {
        TrailingSnapshot {
            activated: self.activated,
            activation_price: self.activation_price,
            current_stop: self.current_stop,
            updated: self.recently_updated(now, window),
        }
    }
}

/// Outcome of feeding one price to a trailing stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrailingStep {
    /// The stop activated on this price
    pub activated: bool,
    /// The stop moved on this price
    pub adjusted: bool,
}

/// Trailing stop parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailingStop {
    /// Favourable move from entry that activates trailing, as a fraction
    pub activation_pct: Decimal,
    /// Distance kept between the extreme price and the stop, as a fraction
    pub distance_pct: Decimal,
}

impl Default for TrailingStop {
    fn default() -> Self {
        Self {
            activation_pct: dec!(0.02),
            distance_pct: dec!(0.015),
        }
    }
}

impl TrailingStop {
    pub fn new(activation_pct: Decimal, distance_pct: Decimal) -> Self {
        Self {
            activation_pct,
            distance_pct,
        }
    }

    /// Fresh state for a position, anchored on its entry and marked at its
    /// current price.
    pub fn init(&self, position: &Position) -> TrailingStopState {
        let entry = position.entry_price;
        let (activation_price, current_stop) = match position.side {
            Side::Buy => (
                entry * (Decimal::ONE + self.activation_pct),
                entry * (Decimal::ONE - self.distance_pct),
            ),
            Side::Sell => (
                entry * (Decimal::ONE - self.activation_pct),
                entry * (Decimal::ONE + self.distance_pct),
            ),
        };

        TrailingStopState {
            side: position.side,
            activation_price,
            current_stop,
            highest_price: position.current_price,
            lowest_price: position.current_price,
            activated: false,
            last_update: None,
        }
    }

    /// Mark the state active once `price` reaches the activation level,
    /// leaving the stop where it is. True only on the crossing itself.
    pub fn try_activate(&self, state: &mut TrailingStopState, price: Decimal) -> bool {
        if state.activated {
            return false;
        }
        let reached = match state.side {
            Side::Buy => price >= state.activation_price,
            Side::Sell => price <= state.activation_price,
        };
        state.activated = reached;
        reached
    }

    /// Feed a price. The stop only ever moves in the position's favour.
    pub fn advance(
        &self,
        state: &mut TrailingStopState,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> TrailingStep {
        let mut step = TrailingStep::default();

        if !state.activated {
            if !self.try_activate(state, price) {
                return step;
            }
            step.activated = true;
        }

        match state.side {
            Side::Buy if price > state.highest_price => {
                state.highest_price = price;
                let candidate = price * (Decimal::ONE - self.distance_pct);
                if candidate > state.current_stop {
                    state.current_stop = candidate;
                    state.last_update = Some(now);
                    step.adjusted = true;
                }
            }
            Side::Sell if price < state.lowest_price => {
                state.lowest_price = price;
                let candidate = price * (Decimal::ONE + self.distance_pct);
                if candidate < state.current_stop {
                    state.current_stop = candidate;
                    state.last_update = Some(now);
                    step.adjusted = true;
                }
            }
            _ => {}
        }

        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_at(entry: Decimal) -> Position {
        Position::new("ETHUSDT", Side::Buy, dec!(1), entry)
    }

    #[test]
    fn test_init_long() {
        let state = TrailingStop::default().init(&long_at(dec!(100)));

        assert_eq!(state.activation_price, dec!(102));
        assert_eq!(state.current_stop, dec!(98.5));
        assert_eq!(state.highest_price, dec!(100));
        assert!(!state.activated);
        assert!(state.last_update.is_none());
    }

    #[test]
    fn test_long_trails_upward_only() {
        let trailing = TrailingStop::default();
        let mut state = trailing.init(&long_at(dec!(100)));
        let now = Utc::now();

        let step = trailing.advance(&mut state, dec!(101), now);
        assert_eq!(step, TrailingStep::default());
        assert_eq!(state.current_stop, dec!(98.5));

        let step = trailing.advance(&mut state, dec!(102), now);
        assert!(step.activated && step.adjusted);
        assert_eq!(state.current_stop, dec!(100.47));
        assert_eq!(state.last_update, Some(now));

        let step = trailing.advance(&mut state, dec!(101), now);
        assert!(!step.activated && !step.adjusted);
        assert_eq!(state.current_stop, dec!(100.47));

        let step = trailing.advance(&mut state, dec!(105), now);
        assert!(step.adjusted);
        assert_eq!(state.current_stop, dec!(103.425));
        assert_eq!(state.highest_price, dec!(105));
    }

    #[test]
    fn test_short_trails_downward_only() {
        let trailing = TrailingStop::default();
        let position = Position::new("SOLUSDT", Side::Sell, dec!(1), dec!(100));
        let mut state = trailing.init(&position);
        let now = Utc::now();

        assert_eq!(state.activation_price, dec!(98));
        assert_eq!(state.current_stop, dec!(101.5));

        let step = trailing.advance(&mut state, dec!(98), now);
        assert!(step.activated && step.adjusted);
        assert_eq!(state.current_stop, dec!(99.47));

        let step = trailing.advance(&mut state, dec!(99), now);
        assert!(!step.adjusted);
        assert_eq!(state.current_stop, dec!(99.47));

        trailing.advance(&mut state, dec!(95), now);
        assert_eq!(state.current_stop, dec!(96.425));
    }

    #[test]
    fn test_snapshot_marks_recent_update() {
        let trailing = TrailingStop::default();
        let mut state = trailing.init(&long_at(dec!(100)));
        let now = Utc::now();
        trailing.advance(&mut state, dec!(103), now);

        let window = Duration::minutes(2);
        assert!(state.snapshot(now + Duration::minutes(1), window).updated);
        assert!(!state.snapshot(now + Duration::minutes(3), window).updated);
    }
}
