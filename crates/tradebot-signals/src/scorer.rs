//! Weighted multi-timeframe scoring.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tradebot_core::types::{Direction, IndicatorReading, IndicatorResultSet, SignalType, Timeframe};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub timeframe_weights: BTreeMap<Timeframe, f64>,
    /// Weight of timeframes missing from the table
    pub default_weight: f64,
    /// Lowest final score that produces a signal
    pub min_score: u8,
    /// Net strength one side must exceed to set a direction
    pub direction_noise_floor: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let timeframe_weights = [
            (Timeframe::Minute1, 0.15),
            (Timeframe::Minute3, 0.15),
            (Timeframe::Minute5, 0.20),
            (Timeframe::Minute15, 0.25),
            (Timeframe::Minute30, 0.15),
            (Timeframe::Hour1, 0.10),
        ]
        .into_iter()
        .collect();

        Self {
            timeframe_weights,
            default_weight: 0.1,
            min_score: 70,
            direction_noise_floor: 1.0,
        }
    }
}

/// Every intermediate of one scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Weighted BUY score, normalized by total weight
    pub buy_score: f64,
    pub sell_score: f64,
    pub base_score: f64,
    pub pattern_bonus: f64,
    pub correlation_factor: f64,
    pub final_score: u8,
    /// Raw strength sums used for direction
    pub buy_strength: f64,
    pub sell_strength: f64,
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, Default)]
pub struct SignalScorer {
    config: ScoringConfig,
}

impl SignalScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn weight(&self, timeframe: Timeframe) -> f64 {
        self.config
            .timeframe_weights
            .get(&timeframe)
            .copied()
            .unwrap_or(self.config.default_weight)
    }

    /// Normalized (buy, sell) scores. Neutral readings count toward the
    /// total weight but add to neither side.
    pub fn weighted_scores<'a>(
        &self,
        readings: impl IntoIterator<Item = &'a IndicatorReading>,
    ) -> (f64, f64) {
        let (mut buy, mut sell, mut total) = (0.0, 0.0, 0.0);
        for reading in readings {
            let weight = self.weight(reading.timeframe);
            match reading.signal {
                SignalType::Buy => buy += reading.strength * weight * 100.0,
                SignalType::Sell => sell += reading.strength * weight * 100.0,
                SignalType::Neutral => {}
            }
            total += weight;
        }

        if total > 0.0 {
            (buy / total, sell / total)
        } else {
            (0.0, 0.0)
        }
    }

    /// Side whose raw strength sum beats the other by more than the floor.
    pub fn direction(&self, buy_strength: f64, sell_strength: f64) -> Option<Direction> {
        let floor = self.config.direction_noise_floor;
        if buy_strength - sell_strength > floor {
            Some(Direction::Long)
        } else if sell_strength - buy_strength > floor {
            Some(Direction::Short)
        } else {
            None
        }
    }

    /// Clamp and truncate into the 0..=100 score range.
    pub fn final_score(base: f64, pattern_bonus: f64, correlation_factor: f64) -> u8 {
        let raw = ((base + pattern_bonus) * correlation_factor).trunc();
        if raw.is_finite() {
            raw.clamp(0.0, 100.0) as u8
        } else {
            0
        }
    }

    pub fn score(
        &self,
        set: &IndicatorResultSet,
        pattern_bonus: f64,
        correlation_factor: f64,
    ) -> ScoreBreakdown {
        let (buy_score, sell_score) = self.weighted_scores(set.iter());
        let base_score = buy_score.max(sell_score);

        let (mut buy_strength, mut sell_strength) = (0.0, 0.0);
        for reading in set.iter() {
            match reading.signal {
                SignalType::Buy => buy_strength += reading.strength,
                SignalType::Sell => sell_strength += reading.strength,
                SignalType::Neutral => {}
            }
        }

        ScoreBreakdown {
            buy_score,
            sell_score,
            base_score,
            pattern_bonus,
            correlation_factor,
            final_score: Self::final_score(base_score, pattern_bonus, correlation_factor),
            buy_strength,
            sell_strength,
            direction: self.direction(buy_strength, sell_strength),
        }
    }

    pub fn passes(&self, breakdown: &ScoreBreakdown) -> bool {
        breakdown.final_score >= self.config.min_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(signal: SignalType, strength: f64, timeframe: Timeframe) -> IndicatorReading {
        IndicatorReading::new("TEST", 0.0, signal, strength, timeframe, 0)
    }

    fn set_of(readings: Vec<IndicatorReading>) -> IndicatorResultSet {
        let mut set = IndicatorResultSet::new("ETHUSDT");
        let mut by_tf: BTreeMap<Timeframe, Vec<IndicatorReading>> = BTreeMap::new();
        for r in readings {
            by_tf.entry(r.timeframe).or_default().push(r);
        }
        for (tf, readings) in by_tf {
            set.insert(tf, readings);
        }
        set
    }

    #[test]
    fn test_weighted_scores_normalize_by_all_readings() {
        let scorer = SignalScorer::default();
        let set = set_of(vec![
            reading(SignalType::Buy, 1.0, Timeframe::Minute15),
            reading(SignalType::Neutral, 0.1, Timeframe::Minute15),
            reading(SignalType::Sell, 0.5, Timeframe::Minute5),
        ]);

        let (buy, sell) = scorer.weighted_scores(set.iter());
        // total weight 0.25 + 0.25 + 0.20 = 0.7
        assert!((buy - 25.0 / 0.7).abs() < 1e-9);
        assert!((sell - 10.0 / 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_unlisted_timeframe_uses_default_weight() {
        let scorer = SignalScorer::default();
        assert_eq!(scorer.weight(Timeframe::Hour4), 0.1);
        assert_eq!(scorer.weight(Timeframe::Minute15), 0.25);
    }

    #[test]
    fn test_direction_noise_floor() {
        let scorer = SignalScorer::default();
        assert_eq!(scorer.direction(5.0, 4.3), None);
        assert_eq!(scorer.direction(5.0, 4.0), None);
        assert_eq!(scorer.direction(5.1, 4.0), Some(Direction::Long));
        assert_eq!(scorer.direction(1.0, 3.5), Some(Direction::Short));
    }

    #[test]
    fn test_final_score_clamps_and_truncates() {
        assert_eq!(SignalScorer::final_score(65.9, 0.0, 1.0), 65);
        assert_eq!(SignalScorer::final_score(40.0, 10.0, 2.0), 100);
        assert_eq!(SignalScorer::final_score(30.0, 5.0, 2.0), 70);
        assert_eq!(SignalScorer::final_score(f64::NAN, 0.0, 1.0), 0);
    }

    #[test]
    fn test_threshold_boundary() {
        let scorer = SignalScorer::default();
        let set = set_of(
            (0..4)
                .map(|_| reading(SignalType::Buy, 0.7, Timeframe::Minute1))
                .collect(),
        );

        let at_min = scorer.score(&set, 0.0, 1.0);
        assert_eq!(at_min.final_score, 70);
        assert!(scorer.passes(&at_min));
        assert_eq!(at_min.direction, Some(Direction::Long));

        let below = scorer.score(&set, -1.0, 1.0);
        assert_eq!(below.final_score, 69);
        assert!(!scorer.passes(&below));
    }

    #[test]
    fn test_empty_set_scores_zero() {
        let scorer = SignalScorer::default();
        let breakdown = scorer.score(&IndicatorResultSet::new("ETHUSDT"), 0.0, 1.0);
        assert_eq!(breakdown.final_score, 0);
        assert!(breakdown.direction.is_none());
    }
}
