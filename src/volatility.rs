//! Volatility indicators
//!
//! Indicators that measure the degree of price variation over time.

use crate::common::{has_enough_data, nan_vec, rolling, sample_std};
use crate::moving_averages::sma;

/// Standard Deviation
///
/// Sample standard deviation (n - 1) over a rolling window, so a window of
/// one bar is undefined.
pub fn std_dev(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    if !has_enough_data(n, period) {
        return nan_vec(n);
    }

    rolling(values, period, sample_std)
}

/// Lower Bollinger Band
///
/// Formula: SMA - std_mult * StdDev
///
/// Returns `(middle, lower)` so callers comparing against both bands share
/// one SMA pass.
pub fn bollinger_lower(closes: &[f64], period: usize, std_mult: f64) -> (Vec<f64>, Vec<f64>) {
    let n = closes.len();
    if !has_enough_data(n, period) {
        return (nan_vec(n), nan_vec(n));
    }

    let middle = sma(closes, period);
    let std = std_dev(closes, period);

    let lower = middle
        .iter()
        .zip(&std)
        .map(|(&m, &s)| {
            if m.is_nan() || s.is_nan() {
                f64::NAN
            } else {
                m - std_mult * s
            }
        })
        .collect();

    (middle, lower)
}
