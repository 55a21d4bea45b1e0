//! Per-symbol management state and its on-disk snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::path::Path;
use tradebot_core::error::RiskError;

use crate::trailing::TrailingStopState;

/// Which management features run for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoManagementSettings {
    pub enabled: bool,
    pub trailing_stop: bool,
    pub partial_profits: bool,
    pub stop_loss_adjustment: bool,
    pub risk_management: bool,
    pub activated_at: Option<DateTime<Utc>>,
}

impl Default for AutoManagementSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            trailing_stop: true,
            partial_profits: true,
            stop_loss_adjustment: true,
            risk_management: true,
            activated_at: None,
        }
    }
}

/// Lifecycle of a symbol under management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagementState {
    /// Management was never enabled
    Unmanaged,
    /// Managed, trailing stop not yet activated
    Inactive,
    /// Managed with an activated trailing stop
    Active,
    /// Management was disabled or the position disappeared
    Closed,
}

impl fmt::Display for ManagementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagementState::Unmanaged => write!(f, "UNMANAGED"),
            ManagementState::Inactive => write!(f, "MANAGED_INACTIVE"),
            ManagementState::Active => write!(f, "MANAGED_ACTIVE"),
            ManagementState::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Everything the manager remembers about one symbol.
#[derive(Debug, Clone, Default)]
pub struct SymbolRiskState {
    pub settings: AutoManagementSettings,
    pub trailing: Option<TrailingStopState>,
    /// Recent marks for rapid-move detection
    pub price_history: VecDeque<Decimal>,
    /// Last partial-profit suggestion per (target, percentage)
    pub profit_notices: HashMap<String, DateTime<Utc>>,
    /// Last risk alert per kind
    pub alert_times: HashMap<String, DateTime<Utc>>,
    /// Last status push
    pub last_status: Option<DateTime<Utc>>,
}

impl SymbolRiskState {
    pub fn new(settings: AutoManagementSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn lifecycle(&self) -> ManagementState {
        if !self.settings.enabled {
            ManagementState::Closed
        } else if self.trailing.as_ref().is_some_and(|t| t.activated) {
            ManagementState::Active
        } else {
            ManagementState::Inactive
        }
    }

    /// Drop trailing state and history, keeping the disabled settings.
    fn close(&mut self) {
        self.settings.enabled = false;
        self.trailing = None;
        self.price_history.clear();
        self.profit_notices.clear();
        self.alert_times.clear();
        self.last_status = None;
    }
}

/// Management state for every symbol, owned by the cycle context.
#[derive(Debug, Clone, Default)]
pub struct RiskStateStore {
    symbols: HashMap<String, SymbolRiskState>,
}

impl RiskStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start managing `symbol`, replacing any earlier state.
    pub fn enable(
        &mut self,
        symbol: &str,
        mut settings: AutoManagementSettings,
        now: DateTime<Utc>,
    ) -> &mut SymbolRiskState {
        settings.enabled = true;
        settings.activated_at = Some(now);
        let slot = self.symbols.entry(symbol.to_string()).or_default();
        *slot = SymbolRiskState::new(settings);
        slot
    }

    /// Close management for `symbol`. Returns false when it was not active.
    pub fn close(&mut self, symbol: &str) -> bool {
        match self.symbols.get_mut(symbol) {
            Some(state) if state.settings.enabled => {
                state.close();
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolRiskState> {
        self.symbols.get(symbol)
    }

    pub fn get_mut(&mut self, symbol: &str) -> Option<&mut SymbolRiskState> {
        self.symbols.get_mut(symbol)
    }

    pub fn lifecycle(&self, symbol: &str) -> ManagementState {
        self.symbols
            .get(symbol)
            .map(SymbolRiskState::lifecycle)
            .unwrap_or(ManagementState::Unmanaged)
    }

    pub fn is_managed(&self, symbol: &str) -> bool {
        self.symbols
            .get(symbol)
            .is_some_and(|s| s.settings.enabled)
    }

    /// Symbols with management enabled, sorted.
    pub fn managed_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .symbols
            .iter()
            .filter(|(_, s)| s.settings.enabled)
            .map(|(symbol, _)| symbol.clone())
            .collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Settings and trailing stops of every known symbol.
    pub fn snapshot(&self, now: DateTime<Utc>) -> ManagementSnapshot {
        let settings = self
            .symbols
            .iter()
            .map(|(symbol, s)| (symbol.clone(), s.settings.clone()))
            .collect();
        let trailing = self
            .symbols
            .iter()
            .filter_map(|(symbol, s)| s.trailing.clone().map(|t| (symbol.clone(), t)))
            .collect();

        ManagementSnapshot {
            saved_at: now,
            settings,
            trailing,
        }
    }

    /// Rebuild a store from a snapshot. History and cooldowns start empty.
    pub fn restore(snapshot: ManagementSnapshot) -> Self {
        let ManagementSnapshot {
            settings,
            mut trailing,
            ..
        } = snapshot;

        let symbols = settings
            .into_iter()
            .map(|(symbol, settings)| {
                let mut state = SymbolRiskState::new(settings);
                state.trailing = trailing.remove(&symbol);
                (symbol, state)
            })
            .collect();

        Self { symbols }
    }

    /// Adopt settings another process wrote to the snapshot. Only symbols
    /// whose settings differ from `since` (the snapshot last read or
    /// written here) and from the live settings are touched, so live
    /// transitions such as reconciliation are not undone. Symbols missing
    /// from the snapshot are left alone.
    pub fn merge(
        &mut self,
        snapshot: &ManagementSnapshot,
        since: Option<&ManagementSnapshot>,
    ) -> SettingsMerge {
        let mut merge = SettingsMerge::default();

        for (symbol, settings) in &snapshot.settings {
            if since.and_then(|base| base.settings.get(symbol)) == Some(settings) {
                continue;
            }
            let current = self.symbols.get(symbol).map(|s| &s.settings);
            if current == Some(settings) {
                continue;
            }

            if settings.enabled {
                let mut state = SymbolRiskState::new(settings.clone());
                state.trailing = snapshot.trailing.get(symbol).cloned();
                self.symbols.insert(symbol.clone(), state);
                merge.enabled.push(symbol.clone());
            } else {
                if self.close(symbol) {
                    merge.disabled.push(symbol.clone());
                }
                self.symbols.entry(symbol.clone()).or_default().settings = settings.clone();
            }
        }

        merge
    }
}

/// Symbols whose settings changed when merging a snapshot written elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsMerge {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
}

impl SettingsMerge {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty() && self.disabled.is_empty()
    }
}

/// Serializable view of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagementSnapshot {
    pub saved_at: DateTime<Utc>,
    pub settings: BTreeMap<String, AutoManagementSettings>,
    #[serde(default)]
    pub trailing: BTreeMap<String, TrailingStopState>,
}

/// Write a snapshot as pretty JSON, creating parent directories.
pub fn save_snapshot(path: &Path, snapshot: &ManagementSnapshot) -> Result<(), RiskError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json =
        serde_json::to_string_pretty(snapshot).map_err(|e| RiskError::Snapshot(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a snapshot. A missing file is not an error.
pub fn load_snapshot(path: &Path) -> Result<Option<ManagementSnapshot>, RiskError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let snapshot =
        serde_json::from_str(&content).map_err(|e| RiskError::Snapshot(e.to_string()))?;
    Ok(Some(snapshot))
}
