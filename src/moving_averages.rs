//! Moving Average Indicators

use crate::common::{has_enough_data, nan_vec};

/// Simple Moving Average (SMA)
///
/// The arithmetic mean of the last `period` values.
///
/// # Formula
/// SMA = (P1 + P2 + ... + Pn) / n
///
/// # Arguments
/// * `values` - Price or indicator values
/// * `period` - Number of periods to average
///
/// # Returns
/// Vector of same length as input, with NaN for first `period - 1` values
///
/// # Example
/// ```
/// use quant_backtest::sma;
/// let prices = vec![2.0, 4.0, 6.0, 8.0, 10.0];
/// let result = sma(&prices, 3);
/// assert_eq!(result[2], 4.0);  // (2+4+6)/3
/// assert_eq!(result[4], 8.0);  // (6+8+10)/3
/// ```
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    if !has_enough_data(n, period) {
        return nan_vec(n);
    }

    let mut result = nan_vec(n);

    // Calculate first SMA
    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = sum / period as f64;

    // Rolling calculation - add new, subtract old
    for i in period..n {
        sum = sum + values[i] - values[i - period];
        result[i] = sum / period as f64;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_warmup() {
        let result = sma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_eq!(result[2], 2.0);
        assert_eq!(result[3], 3.0);
    }

    #[test]
    fn test_sma_period_one_is_identity() {
        let values = vec![5.0, 7.0, 9.0];
        assert_eq!(sma(&values, 1), values);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let result = sma(&[1.0, 2.0], 5);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|v| v.is_nan()));
        assert!(sma(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
    }
}
