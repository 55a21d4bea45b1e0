//! Auto-management settings command.
//!
//! Edits the management snapshot on disk. A running engine merges the
//! changes at the start of its next cycle.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use tracing::warn;
use tradebot_config::AppConfig;
use tradebot_core::traits::PositionSource;
use tradebot_data::JsonPositionSource;
use tradebot_monitor::MessageFormatter;
use tradebot_risk::{
    load_snapshot, save_snapshot, AutoManagementSettings, PositionManager, RiskStateStore,
};

use crate::cli::{EnableArgs, ManageAction, ManageArgs};

fn load_store(path: &Path) -> Result<RiskStateStore> {
    let snapshot = load_snapshot(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    Ok(snapshot.map(RiskStateStore::restore).unwrap_or_default())
}

fn save_store(path: &Path, store: &RiskStateStore) -> Result<()> {
    save_snapshot(path, &store.snapshot(Utc::now()))
        .with_context(|| format!("Failed to write snapshot {}", path.display()))
}

pub async fn run(args: ManageArgs, config: AppConfig) -> Result<()> {
    let path = config
        .trading
        .snapshot_path
        .clone()
        .context("trading.snapshot_path must be set to manage positions")?;
    let manager = PositionManager::new(config.management.clone());
    let formatter = MessageFormatter::new(config.sizing.capital);
    let mut store = load_store(&path)?;
    let now = Utc::now();

    match args.action {
        ManageAction::Enable(enable) => {
            let symbol = enable.symbol.to_uppercase();
            let source = JsonPositionSource::new(config.app.positions_file.clone());
            let position = match source.position(&symbol).await {
                Ok(position) => position,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Position lookup failed");
                    None
                }
            };
            if position.is_none() {
                println!(
                    "{}: no open position; the engine releases it next cycle unless one opens",
                    symbol
                );
            }

            let state =
                manager.enable(&mut store, &symbol, settings(&enable), position.as_ref(), now);
            if let Some(trailing) = &state.trailing {
                println!(
                    "{}: trailing activates at {}, stop {}",
                    symbol, trailing.activation_price, trailing.current_stop
                );
            }
            save_store(&path, &store)?;
            println!("{}: auto-management enabled", symbol);
        }
        ManageAction::Disable { symbol } => {
            let symbol = symbol.to_uppercase();
            match manager.disable(&mut store, &symbol, now) {
                Some(event) => {
                    save_store(&path, &store)?;
                    println!("{}", formatter.event(&event));
                }
                None => println!("{}: not under management", symbol),
            }
        }
        ManageAction::DisableAll => {
            let events = manager.emergency_disable_all(&mut store, now);
            save_store(&path, &store)?;
            for event in &events {
                println!("{}", formatter.event(event));
            }
            println!("{} symbol(s) released", events.len());
        }
        ManageAction::List => {
            let symbols = store.managed_symbols();
            if symbols.is_empty() {
                println!("No symbols under management");
            }
            for symbol in symbols {
                let Some(state) = store.get(&symbol) else {
                    continue;
                };
                let trailing = match &state.trailing {
                    Some(t) if t.activated => format!("stop {}", t.current_stop),
                    Some(t) => format!("activates at {}", t.activation_price),
                    None => "not initialized".to_string(),
                };
                println!(
                    "{:<12} {:<17} trailing {}",
                    symbol,
                    state.lifecycle().to_string(),
                    trailing
                );
            }
        }
    }

    Ok(())
}

fn settings(args: &EnableArgs) -> AutoManagementSettings {
    AutoManagementSettings {
        trailing_stop: !args.no_trailing,
        partial_profits: !args.no_partial_profits,
        stop_loss_adjustment: !args.no_stop_adjustment,
        risk_management: !args.no_risk_alerts,
        ..AutoManagementSettings::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_flags_map_to_settings() {
        let args = EnableArgs {
            symbol: "ethusdt".to_string(),
            no_trailing: true,
            no_partial_profits: false,
            no_stop_adjustment: false,
            no_risk_alerts: true,
        };
        let s = settings(&args);
        assert!(s.enabled);
        assert!(!s.trailing_stop);
        assert!(s.partial_profits);
        assert!(!s.risk_management);
    }

    #[test]
    fn test_store_survives_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("tradebot-cli-{}", std::process::id()))
            .join("management.json");
        let _ = std::fs::remove_file(&path);
        let mut store = load_store(&path).unwrap();
        assert!(store.is_empty());

        let manager = PositionManager::new(Default::default());
        let settings = AutoManagementSettings::default();
        manager.enable(&mut store, "ETHUSDT", settings, None, Utc::now());
        save_store(&path, &store).unwrap();

        let reloaded = load_store(&path).unwrap();
        assert_eq!(reloaded.managed_symbols(), vec!["ETHUSDT".to_string()]);
    }
}
