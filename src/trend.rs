//! Trend / channel indicators

use crate::common::{max, min, rolling};

/// Highest value over the trailing `period` bars (upper Donchian channel)
pub fn highest(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, max)
}

/// Lowest value over the trailing `period` bars (lower Donchian channel)
pub fn lowest(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, min)
}
