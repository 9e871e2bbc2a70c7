// src/backtest/runner.rs
// Runs the full pipeline: strategy -> engine -> metrics + trade ledger

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backtest::engine;
use crate::backtest::metrics::{calculate_metrics, Frequency};
use crate::backtest::trades::extract_trades;
use crate::backtest::types::{Metrics, PriceSeries, Trade};
use crate::error::Result;
use crate::strategies::{SignalGenerator, Strategy, StrategyKind, StrategyParams};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

fn default_initial_capital() -> f64 {
    DEFAULT_INITIAL_CAPITAL
}

fn default_frequency() -> String {
    "D".to_string()
}

/// What to run: strategy, its raw parameters, starting capital and the
/// frequency tag used to annualize metrics
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BacktestSpec {
    pub strategy: StrategyKind,
    #[serde(default)]
    pub params: StrategyParams,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default = "default_frequency")]
    pub frequency: String,
}

impl BacktestSpec {
    pub fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            params: StrategyParams::new(),
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            frequency: default_frequency(),
        }
    }
}

/// Presentation payload: per-bar series plus metrics and the trade ledger
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub equity: Vec<f64>,
    pub labels: Vec<String>,
    pub price: Vec<f64>,
    pub signals: Vec<i8>,
    pub metrics: Metrics,
    pub trades: Vec<Trade>,
}

/// Build the strategy from `spec`, then backtest it over `series`.
///
/// Parameters are validated before any price data is touched.
pub fn run_backtest(series: &PriceSeries, spec: &BacktestSpec) -> Result<BacktestReport> {
    let strategy = Strategy::from_params(spec.strategy, &spec.params)?;
    let positions = strategy.generate(series);
    let result = engine::run(series, &positions, spec.initial_capital)?;

    let metrics = calculate_metrics(&result.strategy_returns, Frequency::from_tag(&spec.frequency));
    let trades = extract_trades(&positions, series);

    debug!(
        strategy = %spec.strategy,
        bars = series.len(),
        trades = trades.len(),
        "backtest report built"
    );

    Ok(BacktestReport {
        labels: result
            .timestamps
            .iter()
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            .collect(),
        signals: positions.signals().iter().map(|&s| i8::from(s)).collect(),
        equity: result.equity,
        price: result.close,
        metrics,
        trades,
    })
}
