//! Human-readable signal and position messages.

use rust_decimal::Decimal;
use std::fmt::Write;
use tradebot_core::types::{Direction, ManagementEvent, PositionUpdate, TradingSignal};

const RULE: &str = "────────────────────────────────────────";

/// Ten-cell bar for a 0..=100 percentage.
pub fn progress_bar(pct: f64) -> String {
    let filled = (pct.clamp(0.0, 100.0) / 10.0) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Profit (positive) or loss of `amount` entered at `avg_price` and closed
/// at `exit`, with leverage.
fn tranche_pnl(direction: Direction, avg_price: f64, exit: f64, amount: f64, leverage: u32) -> f64 {
    if avg_price <= 0.0 {
        return 0.0;
    }
    let change = (exit - avg_price) / avg_price * direction.sign();
    change * amount * f64::from(leverage)
}

#[derive(Debug, Clone)]
pub struct MessageFormatter {
    /// Account capital used for the percentage-of-capital lines
    capital: f64,
}

impl MessageFormatter {
    pub fn new(capital: f64) -> Self {
        Self { capital }
    }

    pub fn signal(&self, signal: &TradingSignal) -> String {
        let mut s = String::new();
        let pct_from_entry = |price: f64| {
            if signal.entry_price > 0.0 {
                (price - signal.entry_price).abs() / signal.entry_price * 100.0
            } else {
                0.0
            }
        };

        let _ = writeln!(
            s,
            "{} {} signal (score {})",
            signal.symbol, signal.direction, signal.score
        );
        let _ = writeln!(s, "{}", RULE);

        let _ = writeln!(s, "Split entry:");
        let mut total = 0.0;
        for zone in &signal.entry_zones {
            let _ = writeln!(
                s,
                "  #{} {:.4} -> ${:.0} ({:.0}%)",
                zone.order,
                zone.price,
                zone.amount,
                zone.ratio * 100.0
            );
            total += zone.amount;
        }
        let _ = writeln!(s, "  Total ${:.0} at {}x leverage", total, signal.leverage);
        s.push('\n');

        let _ = writeln!(s, "Average entry and outcome:");
        let (mut weighted, mut ratio, mut amount) = (0.0, 0.0, 0.0);
        let first_target = signal.take_profits.first().copied().unwrap_or(signal.entry_price);
        for zone in &signal.entry_zones {
            weighted += zone.price * zone.ratio;
            ratio += zone.ratio;
            amount += zone.amount;
            let avg = if ratio > 0.0 { weighted / ratio } else { zone.price };
            let profit = tranche_pnl(signal.direction, avg, first_target, amount, signal.leverage);
            let loss =
                tranche_pnl(signal.direction, avg, signal.stop_loss, amount, signal.leverage);
            let _ = writeln!(s, "  Through #{}: avg {:.4}", zone.order, avg);
            let _ = writeln!(s, "    at TP1 {:+.0} | at stop {:+.0}", profit, loss);
        }
        s.push('\n');

        let max_profit = signal
            .scenarios
            .targets
            .iter()
            .copied()
            .fold(0.0_f64, f64::max);
        let _ = writeln!(s, "Risk/reward: {:.1}:1", signal.risk_reward_ratio);
        if self.capital > 0.0 {
            let _ = writeln!(
                s,
                "Max profit: {:+.1}% of capital",
                max_profit / self.capital * 100.0
            );
            let _ = writeln!(
                s,
                "Max loss: {:.1}% of capital",
                signal.scenarios.stop_loss / self.capital * 100.0
            );
        }
        s.push('\n');

        let _ = writeln!(s, "Targets:");
        for (i, tp) in signal.take_profits.iter().enumerate() {
            let _ = writeln!(s, "  TP{}: {:.4} (+{:.1}%)", i + 1, tp, pct_from_entry(*tp));
        }
        let _ = writeln!(
            s,
            "  Stop: {:.4} (-{:.1}%)",
            signal.stop_loss,
            pct_from_entry(signal.stop_loss)
        );
        let _ = writeln!(s, "  Trailing from {:.4}", signal.trailing_stop_activation);
        s.push('\n');

        if !signal.primary_reasons.is_empty() || signal.pattern.is_some() {
            let _ = writeln!(s, "Reasons:");
            for reason in &signal.primary_reasons {
                let _ = writeln!(s, "  - {}", reason);
            }
            if let Some(pattern) = &signal.pattern {
                let _ = writeln!(s, "  - {}", pattern);
            }
        }
        if !signal.supporting_factors.is_empty() {
            let _ = writeln!(s, "  Supporting: {}", signal.supporting_factors.join(", "));
        }
        if !signal.risk_factors.is_empty() {
            let _ = writeln!(s, "  Against: {}", signal.risk_factors.join(", "));
        }

        let _ = writeln!(s, "Expected: {}", signal.expected_duration);
        let _ = write!(s, "At: {}", signal.created_at.format("%H:%M:%S"));
        s
    }

    pub fn position_update(&self, update: &PositionUpdate) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "{} position", update.symbol);
        let _ = writeln!(s, "{}", RULE);
        let _ = writeln!(s, "Price: {:.4}", update.current_price);
        let _ = writeln!(s, "Entry: {:.4}", update.entry_price);
        let _ = writeln!(
            s,
            "P&L: {:.2} ({}{:.2}%)",
            update.pnl,
            if update.pnl_percentage >= Decimal::ZERO { "+" } else { "" },
            update.pnl_percentage
        );

        if let Some(target) = &update.next_target {
            let progress: f64 = target.progress_pct.try_into().unwrap_or(0.0);
            let _ = writeln!(s, "Next target: {:.4} ({}%)", target.target_price, target.target_pct);
            let _ = writeln!(s, "Progress: {} {:.1}%", progress_bar(progress), progress);
        }

        if let Some(trailing) = &update.trailing {
            if trailing.activated {
                let _ = writeln!(s, "Trailing stop: {:.4}", trailing.current_stop);
                if trailing.updated {
                    let _ = writeln!(s, "Trailing stop tightened");
                }
            } else {
                let _ = writeln!(s, "Trailing activates at {:.4}", trailing.activation_price);
            }
        }

        let _ = write!(s, "At: {}", update.timestamp.format("%H:%M:%S"));
        s
    }

    pub fn event(&self, event: &ManagementEvent) -> String {
        match event {
            ManagementEvent::TrailingActivated { symbol, price, stop, .. } => {
                format!("{} trailing stop active at {:.4}, stop {:.4}", symbol, price, stop)
            }
            ManagementEvent::Status(update) => self.position_update(update),
            ManagementEvent::PartialProfit(suggestion) => format!(
                "{} reached {} at {:.4}: close {}% for about {:.2}",
                suggestion.symbol,
                suggestion.target,
                suggestion.target_price,
                suggestion.close_percentage,
                suggestion.profit_amount
            ),
            ManagementEvent::RiskAlert(alert) => format!(
                "{} risk alert [{}]: {} (P&L {:.2}%)",
                alert.symbol, alert.kind, alert.message, alert.position.pnl_percentage
            ),
            ManagementEvent::Closed { symbol, reason, .. } => {
                format!("{} auto-management ended: {}", symbol, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tradebot_core::types::{
        EntryZone, ProfitScenarios, TargetProgress, Timeframe, TrailingSnapshot,
    };
    use uuid::Uuid;

    fn long_signal() -> TradingSignal {
        TradingSignal {
            id: Uuid::new_v4(),
            symbol: "ETHUSDT".to_string(),
            direction: Direction::Long,
            score: 80,
            confidence: 0.8,
            entry_price: 100.0,
            entry_zones: vec![
                EntryZone { order: 1, price: 99.5, ratio: 0.3, amount: 180.0 },
                EntryZone { order: 2, price: 99.0, ratio: 0.3, amount: 180.0 },
                EntryZone { order: 3, price: 97.5, ratio: 0.4, amount: 240.0 },
            ],
            stop_loss: 95.0,
            take_profits: vec![104.0, 108.0],
            trailing_stop_activation: 102.0,
            recommended_size: 480.0,
            risk_amount: 24.0,
            leverage: 8,
            risk_reward_ratio: 0.8,
            volatility: 0.02,
            primary_reasons: vec!["RSI_14 oversold (15m)".to_string()],
            supporting_factors: vec!["SMA_21".to_string()],
            risk_factors: Vec::new(),
            pattern: None,
            scenarios: ProfitScenarios { targets: vec![19.2, 38.4], stop_loss: -24.0 },
            expected_duration: "1-4 hours".to_string(),
            timeframe: Timeframe::Minute5,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), "░░░░░░░░░░");
        assert_eq!(progress_bar(45.0), "████░░░░░░");
        assert_eq!(progress_bar(150.0), "██████████");
    }

    #[test]
    fn test_tranche_pnl_is_direction_aware() {
        assert!((tranche_pnl(Direction::Long, 100.0, 104.0, 100.0, 10) - 40.0).abs() < 1e-9);
        assert!((tranche_pnl(Direction::Short, 100.0, 104.0, 100.0, 10) + 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_signal_message() {
        let text = MessageFormatter::new(3000.0).signal(&long_signal());
        assert!(text.starts_with("ETHUSDT LONG signal (score 80)"));
        assert!(text.contains("#1 99.5000 -> $180 (30%)"));
        assert!(text.contains("Total $600 at 8x leverage"));
        // 180 at 99.5 to 104 with 8x
        assert!(text.contains("at TP1 +65"));
        assert!(text.contains("Risk/reward: 0.8:1"));
        assert!(text.contains("Max profit: +1.3% of capital"));
        assert!(text.contains("Max loss: -0.8% of capital"));
        assert!(text.contains("TP2: 108.0000 (+8.0%)"));
        assert!(text.contains("Stop: 95.0000 (-5.0%)"));
    }

    #[test]
    fn test_position_update_message() {
        let update = PositionUpdate {
            symbol: "ETHUSDT".to_string(),
            current_price: dec!(103),
            entry_price: dec!(100),
            pnl: dec!(3),
            pnl_percentage: dec!(3),
            next_target: Some(TargetProgress {
                target_price: dec!(105),
                target_pct: dec!(5),
                progress_pct: dec!(60),
            }),
            trailing: Some(TrailingSnapshot {
                activated: true,
                activation_price: dec!(102),
                current_stop: dec!(101.455),
                updated: true,
            }),
            timestamp: Utc::now(),
        };

        let text = MessageFormatter::new(3000.0).position_update(&update);
        assert!(text.contains("P&L: 3.00 (+3.00%)"));
        assert!(text.contains("Progress: ██████░░░░ 60.0%"));
        assert!(text.contains("Trailing stop: 101.4550"));
        assert!(text.contains("Trailing stop tightened"));
    }
}
