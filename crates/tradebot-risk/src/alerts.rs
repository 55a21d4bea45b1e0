//! Loss and volatility alerts for managed positions.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tradebot_core::types::{Position, RiskAlert, RiskAlertKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAlerter {
    /// P&L percentage at or below which a loss alert fires
    pub max_loss_pct: Decimal,
    /// Fractional move between observations that counts as rapid
    pub rapid_move_pct: Decimal,
    /// Observations kept per symbol
    pub history_len: usize,
    /// Minimum gap between alerts of the same kind. None alerts every pass.
    pub alert_cooldown_mins: Option<i64>,
}

impl Default for RiskAlerter {
    fn default() -> Self {
        Self {
            max_loss_pct: dec!(-10),
            rapid_move_pct: dec!(0.05),
            history_len: 5,
            alert_cooldown_mins: None,
        }
    }
}

impl RiskAlerter {
    /// Evaluate a position, then record its price in `history`.
    pub fn check(
        &self,
        position: &Position,
        history: &mut VecDeque<Decimal>,
        last_alerts: &mut HashMap<String, DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Vec<RiskAlert> {
        let mut alerts = Vec::new();

        if position.pnl_percentage <= self.max_loss_pct {
            alerts.push(self.alert(
                position,
                RiskAlertKind::MaxLoss,
                format!("Unrealized loss reached {:.1}%", position.pnl_percentage),
                now,
            ));
        }

        if let Some(&previous) = history.back() {
            if !previous.is_zero() {
                let change = (position.current_price - previous).abs() / previous;
                if change > self.rapid_move_pct {
                    alerts.push(self.alert(
                        position,
                        RiskAlertKind::RapidPriceMove,
                        format!(
                            "Price moved {:.1}% since the last check",
                            change * Decimal::ONE_HUNDRED
                        ),
                        now,
                    ));
                }
            }
        }

        history.push_back(position.current_price);
        while history.len() > self.history_len {
            history.pop_front();
        }

        alerts.retain(|alert| self.passes_cooldown(alert.kind, last_alerts, now));
        alerts
    }

    fn passes_cooldown(
        &self,
        kind: RiskAlertKind,
        last_alerts: &mut HashMap<String, DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(mins) = self.alert_cooldown_mins else {
            return true;
        };
        let key = kind.to_string();
        if let Some(at) = last_alerts.get(&key) {
            if now.signed_duration_since(*at) < Duration::minutes(mins) {
                return false;
            }
        }
        last_alerts.insert(key, now);
        true
    }

    fn alert(
        &self,
        position: &Position,
        kind: RiskAlertKind,
        message: String,
        now: DateTime<Utc>,
    ) -> RiskAlert {
        RiskAlert {
            symbol: position.symbol.clone(),
            kind,
            message,
            position: position.clone(),
            timestamp: now,
        }
    }
}
