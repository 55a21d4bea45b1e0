//! SIMD helpers for window statistics.
//!
//! These use the `wide` crate for portable SIMD. They back the band,
//! volume and channel calculations, which all reduce fixed windows.

use wide::f64x4;

/// Sum of a slice, four lanes at a time.
pub fn sum_simd(data: &[f64]) -> f64 {
    let chunks = data.chunks_exact(4);
    let remainder = chunks.remainder();

    let mut acc = f64x4::splat(0.0);
    for chunk in chunks {
        acc += f64x4::new([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    acc.reduce_add() + remainder.iter().sum::<f64>()
}

/// Mean of a slice, 0.0 when empty.
pub fn mean_simd(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    sum_simd(data) / data.len() as f64
}

/// Rolling population standard deviation.
pub fn std_dev_simd(data: &[f64], period: usize) -> Vec<f64> {
    if data.len() < period || period < 2 {
        return vec![];
    }

    let period_f64 = period as f64;
    let mut result = Vec::with_capacity(data.len() - period + 1);

    for window in data.windows(period) {
        let mean = sum_simd(window) / period_f64;
        let mean_vec = f64x4::splat(mean);

        let chunks = window.chunks_exact(4);
        let remainder = chunks.remainder();
        let mut sum_sq = 0.0;

        for chunk in chunks {
            let diff = f64x4::new([chunk[0], chunk[1], chunk[2], chunk[3]]) - mean_vec;
            sum_sq += (diff * diff).reduce_add();
        }
        for &value in remainder {
            let diff = value - mean;
            sum_sq += diff * diff;
        }

        result.push((sum_sq / period_f64).sqrt());
    }

    result
}

/// Maximum and minimum of a slice, `None` when empty.
pub fn max_min_simd(data: &[f64]) -> Option<(f64, f64)> {
    if data.is_empty() {
        return None;
    }

    let chunks = data.chunks_exact(4);
    let remainder = chunks.remainder();

    let mut max_vec = f64x4::splat(f64::NEG_INFINITY);
    let mut min_vec = f64x4::splat(f64::INFINITY);
    for chunk in chunks {
        let values = f64x4::new([chunk[0], chunk[1], chunk[2], chunk[3]]);
        max_vec = max_vec.max(values);
        min_vec = min_vec.min(values);
    }

    let mut max = max_vec.to_array().iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut min = min_vec.to_array().iter().copied().fold(f64::INFINITY, f64::min);
    for &value in remainder {
        max = max.max(value);
        min = min.min(value);
    }

    Some((max, min))
}
