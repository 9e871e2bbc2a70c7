//! Moving-average crossover
//!
//! Long while the fast SMA is above the slow SMA, Short while below, Flat when
//! they are equal or either is still warming up. The position follows the
//! signal bar by bar.

use serde::Deserialize;
use tracing::debug;

use super::{parse_params, require_window, SignalGenerator, StrategyKind, StrategyParams};
use crate::backtest::types::{PositionSeries, PriceSeries, Signal};
use crate::error::{BacktestError, Result};
use crate::moving_averages::sma;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Params {
    #[serde(default = "default_fast")]
    fast: usize,
    #[serde(default = "default_slow")]
    slow: usize,
}

fn default_fast() -> usize {
    MaCrossover::DEFAULT_FAST
}

fn default_slow() -> usize {
    MaCrossover::DEFAULT_SLOW
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaCrossover {
    fast: usize,
    slow: usize,
}

impl MaCrossover {
    pub const DEFAULT_FAST: usize = 20;
    pub const DEFAULT_SLOW: usize = 50;

    pub fn new(fast: usize, slow: usize) -> Result<Self> {
        require_window(StrategyKind::MaCrossover, "fast", fast)?;
        if fast >= slow {
            return Err(BacktestError::config(format!(
                "fast period must be less than slow period (fast={}, slow={})",
                fast, slow
            )));
        }
        debug!(fast, slow, "ma_crossover configured");
        Ok(Self { fast, slow })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self> {
        let p: Params = parse_params(StrategyKind::MaCrossover, params)?;
        Self::new(p.fast, p.slow)
    }

    pub fn fast(&self) -> usize {
        self.fast
    }

    pub fn slow(&self) -> usize {
        self.slow
    }
}

impl SignalGenerator for MaCrossover {
    fn generate(&self, series: &PriceSeries) -> PositionSeries {
        let closes = series.closes();
        let fast = sma(&closes, self.fast);
        let slow = sma(&closes, self.slow);

        fast.iter()
            .zip(&slow)
            .map(|(f, s)| {
                // NaN compares false both ways, so warmup bars stay Flat
                if f > s {
                    Signal::Long
                } else if f < s {
                    Signal::Short
                } else {
                    Signal::Flat
                }
            })
            .collect::<Vec<_>>()
            .into()
    }
}
