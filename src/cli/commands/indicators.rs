//! Indicator snapshot command.

use anyhow::{anyhow, bail, Result};
use tracing::warn;
use tradebot_config::AppConfig;
use tradebot_core::traits::MarketDataSource;
use tradebot_core::types::{Timeframe, TimeframeSeries};
use tradebot_data::CsvDataSource;

use super::indicator_engine;
use crate::cli::{IndicatorsArgs, OutputFormat};

pub async fn run(args: IndicatorsArgs, config: AppConfig) -> Result<()> {
    let timeframes: Vec<Timeframe> = if args.timeframes.is_empty() {
        config.trading.timeframes.clone()
    } else {
        args.timeframes
            .iter()
            .map(|s| s.parse::<Timeframe>().map_err(|e| anyhow!(e)))
            .collect::<Result<_>>()?
    };

    let symbol = args.symbol.to_uppercase();
    let source = CsvDataSource::new(config.app.data_dir.clone());
    let mut data = TimeframeSeries::new();
    for timeframe in timeframes {
        match source
            .candles(&symbol, timeframe, config.trading.candle_limit)
            .await
        {
            Ok(series) => {
                data.insert(timeframe, series);
            }
            Err(e) => warn!(symbol = %symbol, timeframe = %timeframe, error = %e, "No candles"),
        }
    }
    if data.is_empty() {
        bail!(
            "No candle data for {} under {}",
            symbol,
            config.app.data_dir.display()
        );
    }

    let engine = indicator_engine(&config)?;
    let results = engine.calculate_symbol(&symbol, &data);

    if let OutputFormat::Json = args.output {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("{} indicators", symbol);
    for timeframe in results.timeframes() {
        let summary = results.summary(timeframe);
        println!();
        println!(
            "[{}] {} | buy {} (avg {:.2}) | sell {} (avg {:.2}) | neutral {}",
            timeframe,
            summary.bias,
            summary.buy,
            summary.avg_buy_strength,
            summary.sell,
            summary.avg_sell_strength,
            summary.neutral
        );
        for reading in results.timeframe(timeframe) {
            println!(
                "  {:<16} {:>14.4}  {:<7} {:.2}",
                reading.name,
                reading.value,
                reading.signal.to_string(),
                reading.strength
            );
        }
    }

    Ok(())
}
