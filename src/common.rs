//! Common numeric helpers shared by the indicator, strategy and metrics modules
//!
//! Undefined values are represented as NaN inside the numeric pipeline and
//! only converted to `None` when they leave it.

/// Initialize a result vector with NaN values
#[inline]
pub fn nan_vec(len: usize) -> Vec<f64> {
    vec![f64::NAN; len]
}

/// Check if we have enough data for the given period
#[inline]
pub fn has_enough_data(len: usize, period: usize) -> bool {
    len >= period && period > 0
}

/// Calculate the sum of a slice
#[inline]
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Calculate the mean of a slice
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    sum(values) / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator)
///
/// NaN for fewer than two observations.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Find the maximum value in a slice
#[inline]
pub fn max(values: &[f64]) -> f64 {
    values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

/// Find the minimum value in a slice
#[inline]
pub fn min(values: &[f64]) -> f64 {
    values.iter().cloned().fold(f64::INFINITY, f64::min)
}

/// Compute rolling window operation
/// Returns vector of same length with NaN for insufficient lookback
pub fn rolling<F>(values: &[f64], period: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = values.len();
    if !has_enough_data(n, period) {
        return nan_vec(n);
    }

    let mut result = nan_vec(n);
    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        result[i] = f(window);
    }
    result
}

/// Lag a series by one bar; the first element becomes NaN
pub fn shift(values: &[f64]) -> Vec<f64> {
    let mut result = nan_vec(values.len());
    if values.len() > 1 {
        result[1..].copy_from_slice(&values[..values.len() - 1]);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_vec() {
        let v = nan_vec(5);
        assert_eq!(v.len(), 5);
        assert!(v.iter().all(|x| x.is_nan()));
    }

    #[test]
    fn test_sum() {
        assert_eq!(sum(&[1.0, 2.0, 3.0]), 6.0);
        assert_eq!(sum(&[]), 0.0);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[2.0, 4.0, 6.0]), 4.0);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_sample_std() {
        // variance = ((2-4)^2 + 0 + (6-4)^2) / 2 = 4
        assert_eq!(sample_std(&[2.0, 4.0, 6.0]), 2.0);
        assert_eq!(sample_std(&[5.0, 5.0, 5.0]), 0.0);
        assert!(sample_std(&[1.0]).is_nan());
        assert!(sample_std(&[]).is_nan());
    }

    #[test]
    fn test_max_min() {
        let v = vec![3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(max(&v), 5.0);
        assert_eq!(min(&v), 1.0);
    }

    #[test]
    fn test_rolling() {
        let v = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = rolling(&v, 3, |w| mean(w));
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_eq!(result[2], 2.0);
        assert_eq!(result[3], 3.0);
        assert_eq!(result[4], 4.0);
    }

    #[test]
    fn test_rolling_short_input() {
        let result = rolling(&[1.0, 2.0], 3, |w| mean(w));
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|x| x.is_nan()));
    }

    #[test]
    fn test_shift() {
        let shifted = shift(&[1.0, 2.0, 3.0]);
        assert!(shifted[0].is_nan());
        assert_eq!(&shifted[1..], &[1.0, 2.0]);
        assert!(shift(&[]).is_empty());
    }
}
