//! Benchmarks for indicator calculations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tradebot_core::traits::SeriesIndicator;
use tradebot_core::types::{Candle, CandleSeries, Timeframe, TimeframeSeries};
use tradebot_indicators::{default_indicator_set, simd, BollingerBands, IndicatorEngine, Rsi};

fn generate_closes(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn generate_series(timeframe: Timeframe, size: usize) -> CandleSeries {
    CandleSeries::from_candles(
        "BTCUSDT",
        timeframe,
        generate_closes(size).into_iter().enumerate().map(|(i, c)| {
            Candle::new(i as i64 * 60_000, c, c + 0.5, c - 0.5, c, 1000.0 + (i % 11) as f64 * 10.0)
        }),
    )
}

fn benchmark_rsi(c: &mut Criterion) {
    let mut group = c.benchmark_group("RSI");

    for size in [200, 1000, 10000].iter() {
        let data = generate_closes(*size);
        group.bench_with_input(BenchmarkId::new("wilder", size), &data, |b, data| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_bands(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bollinger");

    for size in [200, 1000, 10000].iter() {
        let data = generate_closes(*size);

        group.bench_with_input(BenchmarkId::new("bands", size), &data, |b, data| {
            let bands = BollingerBands::new();
            b.iter(|| bands.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("std_dev_simd", size), &data, |b, data| {
            b.iter(|| simd::std_dev_simd(black_box(data), black_box(20)))
        });
    }

    group.finish();
}

fn benchmark_symbol_aggregation(c: &mut Criterion) {
    let engine = IndicatorEngine::from_specs(&default_indicator_set()).expect("valid defaults");
    let data: TimeframeSeries = [
        Timeframe::Minute1,
        Timeframe::Minute3,
        Timeframe::Minute5,
        Timeframe::Minute15,
        Timeframe::Minute30,
        Timeframe::Hour1,
    ]
    .into_iter()
    .map(|tf| (tf, generate_series(tf, 200)))
    .collect();

    c.bench_function("aggregate_symbol_6_timeframes", |b| {
        b.iter(|| engine.calculate_symbol(black_box("BTCUSDT"), black_box(&data)))
    });
}

criterion_group!(
    benches,
    benchmark_rsi,
    benchmark_bands,
    benchmark_symbol_aggregation
);
criterion_main!(benches);
