//! Position manager: drives the per-symbol risk state machine once per cycle.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tradebot_core::error::RiskError;
use tradebot_core::types::{ManagementEvent, Position, PositionUpdate, TargetProgress};

use crate::alerts::RiskAlerter;
use crate::partial_profit::ProfitTaker;
use crate::state::{AutoManagementSettings, RiskStateStore, SymbolRiskState};
use crate::trailing::{TrailingStep, TrailingStop};

/// Tunables for auto-managed positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagementConfig {
    pub trailing: TrailingStop,
    pub partial_profits: ProfitTaker,
    pub alerts: RiskAlerter,
    /// Minimum gap between status pushes for one symbol
    pub status_interval_mins: i64,
    /// |P&L %| levels that make a status push worthwhile
    pub status_thresholds: Vec<Decimal>,
    /// A stop adjustment this recent also triggers a status push
    pub trailing_recent_mins: i64,
    /// Profit milestones reported in status updates, percent from entry
    pub milestones: Vec<Decimal>,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            trailing: TrailingStop::default(),
            partial_profits: ProfitTaker::default(),
            alerts: RiskAlerter::default(),
            status_interval_mins: 5,
            status_thresholds: vec![dec!(5), dec!(10), dec!(20)],
            trailing_recent_mins: 2,
            milestones: vec![dec!(5), dec!(10)],
        }
    }
}

/// Applies trailing stops, profit suggestions, risk alerts and status
/// throttling to positions whose symbols have management enabled.
///
/// Holds configuration only; all per-symbol state lives in the
/// [`RiskStateStore`] passed to each call.
#[derive(Debug, Clone, Default)]
pub struct PositionManager {
    config: ManagementConfig,
}

impl PositionManager {
    pub fn new(config: ManagementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ManagementConfig {
        &self.config
    }

    /// Enable management for a symbol. With a position at hand and trailing
    /// on, the trailing stop is initialized immediately.
    pub fn enable<'a>(
        &self,
        store: &'a mut RiskStateStore,
        symbol: &str,
        settings: AutoManagementSettings,
        position: Option<&Position>,
        now: DateTime<Utc>,
    ) -> &'a mut SymbolRiskState {
        let state = store.enable(symbol, settings, now);
        if state.settings.trailing_stop {
            if let Some(position) = position {
                let trailing = self.config.trailing.init(position);
                info!(
                    symbol,
                    activation = %trailing.activation_price,
                    stop = %trailing.current_stop,
                    "Trailing stop initialized"
                );
                state.trailing = Some(trailing);
            }
        }
        info!(symbol, "Auto-management enabled");
        state
    }

    /// Disable management for one symbol.
    pub fn disable(
        &self,
        store: &mut RiskStateStore,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Option<ManagementEvent> {
        self.close(store, symbol, "management disabled", now)
    }

    /// Disable management for every managed symbol.
    pub fn emergency_disable_all(
        &self,
        store: &mut RiskStateStore,
        now: DateTime<Utc>,
    ) -> Vec<ManagementEvent> {
        let events: Vec<ManagementEvent> = store
            .managed_symbols()
            .iter()
            .filter_map(|symbol| self.close(store, symbol, "emergency stop", now))
            .collect();
        warn!(count = events.len(), "Emergency stop: auto-management disabled");
        events
    }

    /// Close management for managed symbols that no longer have a position.
    pub fn reconcile(
        &self,
        store: &mut RiskStateStore,
        positions: &[Position],
        now: DateTime<Utc>,
    ) -> Vec<ManagementEvent> {
        store
            .managed_symbols()
            .iter()
            .filter(|symbol| !positions.iter().any(|p| &p.symbol == *symbol))
            .filter_map(|symbol| self.close(store, symbol, "position closed", now))
            .collect()
    }

    /// Flag positions whose symbols are under management.
    pub fn mark_managed(&self, store: &RiskStateStore, positions: &mut [Position]) {
        for position in positions {
            position.auto_managed = store.is_managed(&position.symbol);
        }
    }

    /// One management pass over a position. Unmanaged symbols yield nothing.
    ///
    /// Order: trailing stop, partial profits, risk alerts, then status.
    pub fn manage(
        &self,
        store: &mut RiskStateStore,
        position: &Position,
        now: DateTime<Utc>,
    ) -> Result<Vec<ManagementEvent>, RiskError> {
        let symbol = position.symbol.as_str();
        let Some(state) = store.get_mut(symbol).filter(|s| s.settings.enabled) else {
            return Ok(Vec::new());
        };

        if position.entry_price <= Decimal::ZERO || position.current_price <= Decimal::ZERO {
            return Err(RiskError::InvalidPosition {
                symbol: symbol.to_string(),
                reason: format!(
                    "entry {} and mark {} must be positive",
                    position.entry_price, position.current_price
                ),
            });
        }

        let mut events = Vec::new();

        if state.settings.trailing_stop {
            self.update_trailing(state, position, now, &mut events);
        }

        if state.settings.partial_profits {
            let suggestions =
                self.config
                    .partial_profits
                    .check(position, &mut state.profit_notices, now);
            for suggestion in suggestions {
                info!(
                    symbol,
                    target = %suggestion.target,
                    close_pct = suggestion.close_percentage,
                    "Partial profit target reached"
                );
                events.push(ManagementEvent::PartialProfit(suggestion));
            }
        }

        if state.settings.risk_management {
            let alerts = self.config.alerts.check(
                position,
                &mut state.price_history,
                &mut state.alert_times,
                now,
            );
            for alert in alerts {
                warn!(symbol, kind = %alert.kind, message = %alert.message, "Risk alert");
                events.push(ManagementEvent::RiskAlert(alert));
            }
        }

        if let Some(update) = self.status_if_needed(state, position, now) {
            events.push(ManagementEvent::Status(update));
        }

        Ok(events)
    }

    fn update_trailing(
        &self,
        state: &mut SymbolRiskState,
        position: &Position,
        now: DateTime<Utc>,
        events: &mut Vec<ManagementEvent>,
    ) {
        let symbol = position.symbol.as_str();
        if state.trailing.is_none() {
            let trailing = self.config.trailing.init(position);
            debug!(
                symbol,
                activation = %trailing.activation_price,
                "Trailing stop initialized on first pass"
            );
            state.trailing = Some(trailing);
            return;
        }
        let Some(trailing) = state.trailing.as_mut() else {
            return;
        };

        // Without stop adjustment the stop stays at its initial level and
        // only the activation is reported.
        let step = if state.settings.stop_loss_adjustment {
            self.config
                .trailing
                .advance(trailing, position.current_price, now)
        } else {
            TrailingStep {
                activated: self
                    .config
                    .trailing
                    .try_activate(trailing, position.current_price),
                adjusted: false,
            }
        };

        if step.activated {
            info!(symbol, price = %position.current_price, "Trailing stop activated");
            events.push(ManagementEvent::TrailingActivated {
                symbol: symbol.to_string(),
                price: position.current_price,
                stop: trailing.current_stop,
                timestamp: now,
            });
        }
        if step.adjusted {
            info!(symbol, stop = %trailing.current_stop, "Trailing stop adjusted");
        }
    }

    fn status_if_needed(
        &self,
        state: &mut SymbolRiskState,
        position: &Position,
        now: DateTime<Utc>,
    ) -> Option<PositionUpdate> {
        if let Some(at) = state.last_status {
            if now.signed_duration_since(at) < Duration::minutes(self.config.status_interval_mins) {
                return None;
            }
        }

        let recent = Duration::minutes(self.config.trailing_recent_mins);
        let pnl = position.pnl_percentage.abs();
        let on_ladder = self.config.status_thresholds.iter().any(|t| pnl >= *t);
        let trailing_moved = state
            .trailing
            .as_ref()
            .is_some_and(|t| t.recently_updated(now, recent));

        if !on_ladder && !trailing_moved {
            return None;
        }

        state.last_status = Some(now);
        Some(self.position_update(state, position, now))
    }

    /// Status view of a position, regardless of throttling.
    pub fn position_update(
        &self,
        state: &SymbolRiskState,
        position: &Position,
        now: DateTime<Utc>,
    ) -> PositionUpdate {
        let recent = Duration::minutes(self.config.trailing_recent_mins);
        PositionUpdate {
            symbol: position.symbol.clone(),
            current_price: position.current_price,
            entry_price: position.entry_price,
            pnl: position.unrealized_pnl,
            pnl_percentage: position.pnl_percentage,
            next_target: self.next_target(position),
            trailing: state.trailing.as_ref().map(|t| t.snapshot(now, recent)),
            timestamp: now,
        }
    }

    /// First profit milestone not yet reached, with progress measured from
    /// the previous milestone (or entry). None past the last milestone.
    pub fn next_target(&self, position: &Position) -> Option<TargetProgress> {
        let entry = position.entry_price;
        let price = position.current_price;
        let sign = position.side.sign();
        let mut previous = entry;

        for pct in &self.config.milestones {
            let target = entry * (Decimal::ONE + sign * *pct / Decimal::ONE_HUNDRED);
            if (target - price) * sign > Decimal::ZERO {
                let span = (target - previous) * sign;
                let progress = if span.is_zero() {
                    Decimal::ZERO
                } else {
                    (price - previous) * sign / span * Decimal::ONE_HUNDRED
                };
                return Some(TargetProgress {
                    target_price: target,
                    target_pct: *pct,
                    progress_pct: progress.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
                });
            }
            previous = target;
        }
        None
    }

    fn close(
        &self,
        store: &mut RiskStateStore,
        symbol: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Option<ManagementEvent> {
        if !store.close(symbol) {
            return None;
        }
        info!(symbol, reason, "Auto-management closed");
        Some(ManagementEvent::Closed {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
            timestamp: now,
        })
    }
}
