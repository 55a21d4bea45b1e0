//! Multi-timeframe aggregation.

use std::collections::HashMap;
use tracing::{debug, warn};
use tradebot_core::error::IndicatorError;
use tradebot_core::traits::Indicator;
use tradebot_core::types::{
    CandleSeries, IndicatorReading, IndicatorResultSet, Timeframe, TimeframeSeries,
};

use crate::kind::{IndicatorKind, IndicatorSpec};

/// Runs every configured indicator over every timeframe of a symbol.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    indicators: Vec<IndicatorKind>,
}

impl IndicatorEngine {
    pub fn new(indicators: Vec<IndicatorKind>) -> Self {
        Self { indicators }
    }

    /// Build from configuration, rejecting invalid parameters up front.
    pub fn from_specs(specs: &[IndicatorSpec]) -> Result<Self, IndicatorError> {
        let indicators = specs
            .iter()
            .map(IndicatorKind::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(indicators))
    }

    pub fn indicators(&self) -> &[IndicatorKind] {
        &self.indicators
    }

    /// Longest lookback any configured indicator needs.
    pub fn max_history(&self) -> usize {
        self.indicators
            .iter()
            .map(|i| i.min_history())
            .max()
            .unwrap_or(0)
    }

    /// Readings for one timeframe. A failing indicator is logged and left out.
    pub fn calculate_timeframe(
        &self,
        series: &CandleSeries,
        timeframe: Timeframe,
    ) -> Vec<IndicatorReading> {
        self.indicators
            .iter()
            .filter_map(|indicator| match indicator.calculate(series, timeframe) {
                Ok(reading) => Some(reading),
                Err(e) => {
                    warn!(
                        symbol = %series.symbol,
                        timeframe = %timeframe,
                        indicator = indicator.name(),
                        error = %e,
                        "Indicator calculation failed"
                    );
                    None
                }
            })
            .collect()
    }

    /// Fresh result set for a symbol from all of its series.
    pub fn calculate_symbol(&self, symbol: &str, data: &TimeframeSeries) -> IndicatorResultSet {
        let mut set = IndicatorResultSet::new(symbol);
        for (&timeframe, series) in data {
            let readings = self.calculate_timeframe(series, timeframe);
            debug!(
                symbol,
                timeframe = %timeframe,
                candles = series.len(),
                readings = readings.len(),
                "Indicators calculated"
            );
            set.insert(timeframe, readings);
        }
        set
    }

    /// Recompute a symbol and replace its entry in `store` wholesale.
    pub fn refresh<'a>(
        &self,
        store: &'a mut ResultStore,
        symbol: &str,
        data: &TimeframeSeries,
    ) -> &'a IndicatorResultSet {
        let set = self.calculate_symbol(symbol, data);
        store.replace(set)
    }
}

/// Latest result set per symbol.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    sets: HashMap<String, IndicatorResultSet>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a set, dropping whatever was held for its symbol.
    pub fn replace(&mut self, set: IndicatorResultSet) -> &IndicatorResultSet {
        let symbol = set.symbol.clone();
        self.sets.insert(symbol.clone(), set);
        &self.sets[&symbol]
    }

    pub fn get(&self, symbol: &str) -> Option<&IndicatorResultSet> {
        self.sets.get(symbol)
    }

    /// Readings of one symbol and timeframe, empty when unknown.
    pub fn readings(&self, symbol: &str, timeframe: Timeframe) -> &[IndicatorReading] {
        self.sets
            .get(symbol)
            .map(|s| s.timeframe(timeframe))
            .unwrap_or(&[])
    }

    pub fn remove(&mut self, symbol: &str) -> Option<IndicatorResultSet> {
        self.sets.remove(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
