//! Volatility-scaled initial stops.

use serde::{Deserialize, Serialize};
use tradebot_core::types::Direction;

/// Initial stop distance as a multiple of volatility, bounded on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopPolicy {
    pub volatility_multiplier: f64,
    /// Tightest allowed stop, as a fraction of entry
    pub min_distance: f64,
    /// Widest allowed stop, as a fraction of entry
    pub max_distance: f64,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            volatility_multiplier: 2.5,
            min_distance: 0.02,
            max_distance: 0.08,
        }
    }
}

impl StopPolicy {
    /// Stop distance for a market with the given volatility.
    pub fn distance(&self, volatility: f64) -> f64 {
        (volatility * self.volatility_multiplier).clamp(self.min_distance, self.max_distance)
    }

    /// Stop price below a long entry or above a short one.
    pub fn stop_price(&self, entry: f64, direction: Direction, volatility: f64) -> f64 {
        entry * (1.0 - direction.sign() * self.distance(volatility))
    }

    /// Whether `price` has crossed `stop` against the position.
    pub fn is_triggered(stop: f64, price: f64, direction: Direction) -> bool {
        match direction {
            Direction::Long => price <= stop,
            Direction::Short => price >= stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_bounded() {
        let policy = StopPolicy::default();

        assert!((policy.distance(0.004) - 0.02).abs() < 1e-12);
        assert!((policy.distance(0.02) - 0.05).abs() < 1e-12);
        assert!((policy.distance(0.05) - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_stop_price_by_direction() {
        let policy = StopPolicy::default();

        let stop = policy.stop_price(100.0, Direction::Long, 0.02);
        assert!((stop - 95.0).abs() < 1e-9);

        let stop = policy.stop_price(100.0, Direction::Short, 0.02);
        assert!((stop - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_triggered() {
        assert!(StopPolicy::is_triggered(95.0, 94.0, Direction::Long));
        assert!(StopPolicy::is_triggered(95.0, 95.0, Direction::Long));
        assert!(!StopPolicy::is_triggered(95.0, 96.0, Direction::Long));

        assert!(StopPolicy::is_triggered(105.0, 106.0, Direction::Short));
        assert!(!StopPolicy::is_triggered(105.0, 104.0, Direction::Short));
    }
}
