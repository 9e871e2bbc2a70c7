//! Channel breakout
//!
//! Compares each close with the high/low channel as it stood on the previous
//! bar, so a bar's own extreme never triggers its own breakout.

use serde::Deserialize;
use tracing::debug;

use super::{parse_params, require_window, SignalGenerator, StrategyKind, StrategyParams};
use crate::backtest::types::{PositionSeries, PriceSeries, Signal};
use crate::common::shift;
use crate::error::Result;
use crate::trend::{highest, lowest};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Params {
    #[serde(default = "default_window")]
    window: usize,
}

fn default_window() -> usize {
    Breakout::DEFAULT_WINDOW
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakout {
    window: usize,
}

impl Breakout {
    pub const DEFAULT_WINDOW: usize = 20;

    pub fn new(window: usize) -> Result<Self> {
        require_window(StrategyKind::Breakout, "window", window)?;
        debug!(window, "breakout configured");
        Ok(Self { window })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self> {
        let p: Params = parse_params(StrategyKind::Breakout, params)?;
        Self::new(p.window)
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl SignalGenerator for Breakout {
    fn generate(&self, series: &PriceSeries) -> PositionSeries {
        let closes = series.closes();
        let prior_high = shift(&highest(&series.highs(), self.window));
        let prior_low = shift(&lowest(&series.lows(), self.window));

        let signals: Vec<Option<Signal>> = closes
            .iter()
            .zip(prior_high.iter().zip(&prior_low))
            .map(|(&close, (&high, &low))| {
                if high.is_nan() && low.is_nan() {
                    return None;
                }
                let mut signal = Signal::Flat;
                if close > high {
                    signal = Signal::Long;
                }
                if close < low {
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

    /// Bars as (high, low, close)
    fn series(bars: &[(f64, f64, f64)]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = bars
            .iter()
            .enumerate()
            .map(|(i, &(high, low, close))| PriceBar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high,
                low,
                close,
                volume: 0.0,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn test_breakout_uses_prior_channel() {
        let strategy = Breakout::new(2).unwrap();
        let positions = strategy.generate(&series(&[
            (11.0, 9.0, 10.0),
            (12.0, 10.0, 11.0),
            // prior 2-bar high = 12
            (13.0, 11.0, 12.5),
            // prior high = 13, close inside channel
            (13.0, 11.5, 12.0),
            // prior low = 11, close below
            (11.0, 9.0, 10.0),
        ]));
        assert_eq!(
            positions.signals(),
            &[Signal::Flat, Signal::Flat, Signal::Long, Signal::Flat, Signal::Flat]
        );
    }

    #[test]
    fn test_own_extreme_does_not_trigger() {
        // the close equals the bar's own high but not the prior channel high
        let strategy = Breakout::new(1).unwrap();
        let positions = strategy.generate(&series(&[(10.0, 9.0, 9.5), (10.0, 9.0, 10.0)]));
        assert_eq!(positions.signals(), &[Signal::Flat, Signal::Flat]);
    }

    #[test]
    fn test_params() {
        let params = json!({"window": 55});
        assert_eq!(Breakout::from_params(params.as_object().unwrap()).unwrap().window(), 55);
        assert!(Breakout::new(0).unwrap_err().is_config_error());
        let params = json!({"window": -3});
        assert!(Breakout::from_params(params.as_object().unwrap()).is_err());
    }
}
