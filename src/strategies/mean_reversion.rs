//! Mean reversion against the lower Bollinger band
//!
//! Every bar with a defined SMA gets an explicit signal: Long when the close
//! is below `SMA - std_k * std`, Flat otherwise, and Flat whenever the close is
//! above the SMA (checked last, so the exit wins). Warmup bars carry no signal
//! and are held forward from Flat.

use serde::Deserialize;
use tracing::debug;

use super::{parse_params, require_window, SignalGenerator, StrategyKind, StrategyParams};
use crate::backtest::types::{PositionSeries, PriceSeries, Signal};
use crate::error::{BacktestError, Result};
use crate::volatility::bollinger_lower;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Params {
    #[serde(default = "default_window")]
    window: usize,
    #[serde(default = "default_std_k")]
    std_k: f64,
}

fn default_window() -> usize {
    MeanReversion::DEFAULT_WINDOW
}

fn default_std_k() -> f64 {
    MeanReversion::DEFAULT_STD_K
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanReversion {
    window: usize,
    std_k: f64,
}

impl MeanReversion {
    pub const DEFAULT_WINDOW: usize = 20;
    pub const DEFAULT_STD_K: f64 = 2.0;

    pub fn new(window: usize, std_k: f64) -> Result<Self> {
        require_window(StrategyKind::MeanReversion, "window", window)?;
        if !std_k.is_finite() {
            return Err(BacktestError::config("mean_reversion: std_k must be finite"));
        }
        debug!(window, std_k, "mean_reversion configured");
        Ok(Self { window, std_k })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self> {
        let p: Params = parse_params(StrategyKind::MeanReversion, params)?;
        Self::new(p.window, p.std_k)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn std_k(&self) -> f64 {
        self.std_k
    }
}

impl SignalGenerator for MeanReversion {
    fn generate(&self, series: &PriceSeries) -> PositionSeries {
        let closes = series.closes();
        let (middle, lower) = bollinger_lower(&closes, self.window, self.std_k);

        let signals: Vec<Option<Signal>> = closes
            .iter()
            .zip(middle.iter().zip(&lower))
            .map(|(&close, (&sma, &lower))| {
                if sma.is_nan() {
                    return None;
                }
                let mut signal = Signal::Flat;
                if close < lower {
                    signal = Signal::Long;
                }
                if close > sma {
                    signal = Signal::Flat;
                }
                Some(signal)
            })
            .collect();

        PositionSeries::held_forward(&signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::types::PriceBar;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar {
                timestamp: start + Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 0.0,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn test_flat_series_never_long() {
        let strategy = MeanReversion::new(3, 2.0).unwrap();
        let positions = strategy.generate(&series(&[100.0; 10]));
        assert_eq!(positions.len(), 10);
        assert!(positions.signals().iter().all(|s| *s == Signal::Flat));
    }

    #[test]
    fn test_enters_below_lower_band() {
        // window 3, k = 0.5: bar 3 window [10, 10, 7] -> sma 9, std ~1.732, lower ~8.13
        let strategy = MeanReversion::new(3, 0.5).unwrap();
        let positions = strategy.generate(&series(&[10.0, 10.0, 10.0, 7.0, 12.0]));
        assert_eq!(
            positions.signals(),
            &[Signal::Flat, Signal::Flat, Signal::Flat, Signal::Long, Signal::Flat]
        );
    }

    #[test]
    fn test_long_only_on_band_breach_bars() {
        // bar 4 closes between the band (~7.72) and the SMA (~8.47): explicitly Flat
        let strategy = MeanReversion::new(3, 0.5).unwrap();
        let positions = strategy.generate(&series(&[10.0, 10.0, 10.0, 7.0, 8.4]));
        assert_eq!(positions.signals()[3], Signal::Long);
        assert_eq!(positions.signals()[4], Signal::Flat);
    }

    #[test]
    fn test_exit_wins_when_both_conditions_hold() {
        // negative k puts the band above the SMA, so bars 3 and 4 close both
        // below the band and above the SMA
        // bar 3: sma ~10.33, band ~11.49; bar 4: sma 11, band 13; bar 5: sma ~10.67, band ~13.72
        let strategy = MeanReversion::new(3, -2.0).unwrap();
        let positions = strategy.generate(&series(&[10.0, 10.0, 10.0, 11.0, 12.0, 9.0]));
        assert_eq!(
            positions.signals(),
            &[Signal::Flat, Signal::Flat, Signal::Flat, Signal::Flat, Signal::Flat, Signal::Long]
        );
    }

    #[test]
    fn test_params() {
        let params = json!({"window": 5});
        let strategy = MeanReversion::from_params(params.as_object().unwrap()).unwrap();
        assert_eq!(strategy.window(), 5);
        assert_eq!(strategy.std_k(), 2.0);

        assert!(MeanReversion::new(0, 2.0).unwrap_err().is_config_error());
        assert!(MeanReversion::new(5, f64::NAN).is_err());
    }
}
