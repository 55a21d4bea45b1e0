//! Chart pattern recognition on a single timeframe.

use serde::{Deserialize, Serialize};
use std::fmt;
use tradebot_core::types::{CandleSeries, Direction, Timeframe};

/// Recognizer thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Timeframe whose series is inspected
    pub timeframe: Timeframe,
    pub breakout_min_candles: usize,
    /// Candles forming the high/low channel, ending just before the latest
    pub channel_period: usize,
    /// Channel-relative excess beyond which a close counts as a breakout
    pub breakout_threshold: f64,
    pub breakout_strength_scale: f64,
    /// Score points for a full-strength breakout
    pub breakout_bonus: f64,
    /// Projected move past the broken edge, as a share of the channel
    pub target_range_ratio: f64,
    pub reversal_min_candles: usize,
    /// Recent candles searched for a double top or bottom
    pub reversal_window: usize,
    /// Relative gap under which two extremes count as equal
    pub reversal_tolerance: f64,
    pub reversal_strength: f64,
    /// Score points for a full-strength reversal
    pub reversal_bonus: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::Minute5,
            breakout_min_candles: 50,
            channel_period: 20,
            breakout_threshold: 0.002,
            breakout_strength_scale: 50.0,
            breakout_bonus: 15.0,
            target_range_ratio: 0.5,
            reversal_min_candles: 10,
            reversal_window: 5,
            reversal_tolerance: 0.01,
            reversal_strength: 0.7,
            reversal_bonus: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    ResistanceBreakout,
    SupportBreakdown,
    DoubleTop,
    DoubleBottom,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::ResistanceBreakout => write!(f, "RESISTANCE_BREAKOUT"),
            PatternKind::SupportBreakdown => write!(f, "SUPPORT_BREAKDOWN"),
            PatternKind::DoubleTop => write!(f, "DOUBLE_TOP"),
            PatternKind::DoubleBottom => write!(f, "DOUBLE_BOTTOM"),
        }
    }
}

/// A detected pattern and the score bonus it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub kind: PatternKind,
    pub direction: Direction,
    /// 0..=1
    pub strength: f64,
    pub bonus: f64,
    /// Projected price for breakouts
    pub target: Option<f64>,
}

impl PatternMatch {
    pub fn describe(&self) -> String {
        match self.target {
            Some(target) => format!(
                "{} ({}, strength {:.2}, target {:.4})",
                self.kind, self.direction, self.strength, target
            ),
            None => format!("{} ({}, strength {:.2})", self.kind, self.direction, self.strength),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternRecognizer {
    config: PatternConfig,
}

impl PatternRecognizer {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// Breakouts take precedence over reversals.
    pub fn detect(&self, series: &CandleSeries) -> Option<PatternMatch> {
        self.breakout(series).or_else(|| self.reversal(series))
    }

    /// Close beyond the channel of the preceding candles.
    pub fn breakout(&self, series: &CandleSeries) -> Option<PatternMatch> {
        let cfg = &self.config;
        if series.len() < cfg.breakout_min_candles.max(cfg.channel_period + 1) {
            return None;
        }

        let price = series.last_close()?;
        let window = series.last_n(cfg.channel_period + 1);
        let channel = &window[..window.len() - 1];
        let high = channel.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let low = channel.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let range = high - low;
        if !(range > 0.0) {
            return None;
        }

        let above = (price - high) / range;
        let below = (low - price) / range;

        let (kind, direction, excess, target) = if above > cfg.breakout_threshold {
            (
                PatternKind::ResistanceBreakout,
                Direction::Long,
                above,
                high + range * cfg.target_range_ratio,
            )
        } else if below > cfg.breakout_threshold {
            (
                PatternKind::SupportBreakdown,
                Direction::Short,
                below,
                low - range * cfg.target_range_ratio,
            )
        } else {
            return None;
        };

        let strength = (excess * cfg.breakout_strength_scale).min(1.0);
        Some(PatternMatch {
            kind,
            direction,
            strength,
            bonus: strength * cfg.breakout_bonus,
            target: Some(target),
        })
    }

    /// Two nearly equal highs (double top) or lows (double bottom) among
    /// the most recent candles.
    pub fn reversal(&self, series: &CandleSeries) -> Option<PatternMatch> {
        let cfg = &self.config;
        if series.len() < cfg.reversal_min_candles.max(2) || cfg.reversal_window < 2 {
            return None;
        }

        let recent = series.last_n(cfg.reversal_window);

        let mut highs: Vec<f64> = recent.iter().map(|c| c.high).collect();
        highs.sort_by(|a, b| b.total_cmp(a));
        let top_pair_close =
            highs[0] > 0.0 && (highs[0] - highs[1]).abs() / highs[0] < cfg.reversal_tolerance;

        let (kind, direction) = if top_pair_close {
            (PatternKind::DoubleTop, Direction::Short)
        } else {
            let mut lows: Vec<f64> = recent.iter().map(|c| c.low).collect();
            lows.sort_by(|a, b| a.total_cmp(b));
            let bottom_pair_close =
                lows[0] > 0.0 && (lows[0] - lows[1]).abs() / lows[0] < cfg.reversal_tolerance;
            if !bottom_pair_close {
                return None;
            }
            (PatternKind::DoubleBottom, Direction::Long)
        };

        Some(PatternMatch {
            kind,
            direction,
            strength: cfg.reversal_strength,
            bonus: cfg.reversal_strength * cfg.reversal_bonus,
            target: None,
        })
    }
}
