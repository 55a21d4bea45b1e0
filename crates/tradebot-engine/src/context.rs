//! State carried from one cycle to the next.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};
use tradebot_core::error::RiskError;
use tradebot_indicators::ResultStore;
use tradebot_risk::{
    load_snapshot, save_snapshot, ManagementSnapshot, RiskStateStore, SettingsMerge,
};

/// Everything that outlives a single cycle, owned by the host loop.
#[derive(Debug, Default)]
pub struct CycleContext {
    /// Latest indicator results per symbol
    pub results: ResultStore,
    /// When each symbol last produced a signal
    pub last_signal_at: HashMap<String, DateTime<Utc>>,
    /// Auto-management settings and per-symbol risk state
    pub risk: RiskStateStore,
    /// Completed cycles
    pub cycles: u64,
    /// Snapshot as last read from or written to disk
    snapshot_seen: Option<ManagementSnapshot>,
}

impl CycleContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context seeded from a settings snapshot. A missing snapshot starts
    /// with nothing managed.
    pub fn from_snapshot(path: &Path) -> Result<Self, RiskError> {
        let mut ctx = Self::new();
        if let Some(snapshot) = load_snapshot(path)? {
            ctx.snapshot_seen = Some(snapshot.clone());
            ctx.risk = RiskStateStore::restore(snapshot);
            info!(
                path = %path.display(),
                managed = ctx.risk.managed_symbols().len(),
                "Restored auto-management settings"
            );
        }
        Ok(ctx)
    }

    /// Best-effort snapshot write; failures are logged only.
    pub fn save_snapshot(&mut self, path: &Path, now: DateTime<Utc>) -> bool {
        let snapshot = self.risk.snapshot(now);
        match save_snapshot(path, &snapshot) {
            Ok(()) => {
                info!(path = %path.display(), "Saved auto-management settings");
                self.snapshot_seen = Some(snapshot);
                true
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to save auto-management settings"
                );
                false
            }
        }
    }

    /// Pick up settings changed in the snapshot file by another process,
    /// such as `tradebot manage`. A missing file changes nothing.
    pub fn sync_snapshot(&mut self, path: &Path) -> Result<SettingsMerge, RiskError> {
        let Some(snapshot) = load_snapshot(path)? else {
            return Ok(SettingsMerge::default());
        };
        if self.snapshot_seen.as_ref() == Some(&snapshot) {
            return Ok(SettingsMerge::default());
        }
        let merge = self.risk.merge(&snapshot, self.snapshot_seen.as_ref());
        self.snapshot_seen = Some(snapshot);
        if !merge.is_empty() {
            info!(
                path = %path.display(),
                enabled = ?merge.enabled,
                disabled = ?merge.disabled,
                "Adopted auto-management changes from snapshot"
            );
        }
        Ok(merge)
    }

    /// True while `symbol` is inside its minimum re-fire interval.
    pub fn recently_signalled(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
        interval: Duration,
    ) -> bool {
        self.last_signal_at
            .get(symbol)
            .is_some_and(|at| now - *at < interval)
    }

    pub fn record_signal(&mut self, symbol: &str, now: DateTime<Utc>) {
        self.last_signal_at.insert(symbol.to_string(), now);
    }
}
