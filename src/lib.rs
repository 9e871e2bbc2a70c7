//! # Quant Backtest
//!
//! Single-asset, vectorized backtesting of rule-based trading strategies.
//!
//! ## Pipeline
//! - a [`strategies::Strategy`] turns a [`PriceSeries`] into one position per bar
//! - [`backtest::run`] applies the positions with a one-bar lag and compounds equity
//! - [`calculate_metrics`] annualizes the strategy returns
//! - [`extract_trades`] rebuilds the trade ledger from position changes
//!
//! [`run_backtest`] chains all four and returns a JSON-ready report.
//!
//! ## Example
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use quant_backtest::{run_backtest, BacktestSpec, PriceBar, PriceSeries, StrategyKind};
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let bars = (0..60)
//!     .map(|i| {
//!         let close = 100.0 + (i as f64 * 0.3).sin() * 10.0;
//!         PriceBar { timestamp: start + Duration::days(i), open: close, high: close + 1.0, low: close - 1.0, close, volume: 1_000.0 }
//!     })
//!     .collect();
//! let series = PriceSeries::new(bars).unwrap();
//!
//! let report = run_backtest(&series, &BacktestSpec::new(StrategyKind::Breakout)).unwrap();
//! assert_eq!(report.equity.len(), 60);
//! assert_eq!(report.equity[0], 10_000.0);
//! ```

pub mod backtest;
pub mod common;
pub mod config;
pub mod data;
pub mod error;
pub mod moving_averages;
pub mod strategies;
pub mod trend;
pub mod volatility;

use serde::Deserialize;

// Re-export commonly used items at crate root
pub use backtest::{
    calculate_metrics, calculate_metrics_with_rf, extract_trades, run_backtest, BacktestReport,
    BacktestResult, BacktestSpec, Frequency, Metrics, PositionSeries, PriceBar, PriceSeries, Signal,
    Trade, TradeSide,
};
pub use error::{BacktestError, Result};
pub use moving_averages::sma;
pub use strategies::{SignalGenerator, Strategy, StrategyKind, StrategyParams};
pub use trend::{highest, lowest};
pub use volatility::{bollinger_lower, std_dev};

/// Self-contained backtest job: the bars plus what to run on them
#[derive(Debug, Deserialize)]
pub struct BacktestJob {
    pub bars: Vec<PriceBar>,
    #[serde(flatten)]
    pub spec: BacktestSpec,
}

/// Run a [`BacktestJob`] given as JSON and return the report as JSON
///
/// Malformed JSON is a configuration error; bars that do not form a valid
/// series are a data error.
pub fn run_backtest_json(request: &str) -> Result<String> {
    let job: BacktestJob = serde_json::from_str(request)?;
    let series = PriceSeries::new(job.bars)?;
    let report = run_backtest(&series, &job.spec)?;
    Ok(serde_json::to_string(&report)?)
}

#[cfg(feature = "wasm")]
mod wasm {
    use wasm_bindgen::prelude::*;

    /// WASM entry point for browser/Node.js use
    #[wasm_bindgen(js_name = runBacktest)]
    pub fn run_backtest(request: &str) -> Result<String, JsValue> {
        super::run_backtest_json(request).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
