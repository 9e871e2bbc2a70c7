// src/backtest/engine.rs
// Converts a position series into per-bar returns and an equity curve

use tracing::debug;

use crate::backtest::types::{BacktestResult, PositionSeries, PriceSeries};
use crate::error::{BacktestError, Result};

/// Run a close-to-close backtest of `position` over `price`.
///
/// The position held at the end of bar t-1 earns the return realized over
/// (t-1, t], so a position derived from bar t's close never touches bar t's
/// return. Equity starts at `initial_capital` on the first bar.
pub fn run(price: &PriceSeries, position: &PositionSeries, initial_capital: f64) -> Result<BacktestResult> {
    if position.len() != price.len() {
        return Err(BacktestError::config(format!(
            "strategy must produce a position for every bar: got {} positions for {} bars",
            position.len(),
            price.len()
        )));
    }
    if !initial_capital.is_finite() {
        return Err(BacktestError::config("initial capital must be finite"));
    }

    let close = price.closes();
    let pos = position.values();
    let n = close.len();

    let mut raw_returns = vec![0.0; n];
    let mut strategy_returns = vec![0.0; n];
    let mut equity = vec![initial_capital; n];

    let mut growth = 1.0;
    for t in 1..n {
        raw_returns[t] = close[t] / close[t - 1] - 1.0;
        strategy_returns[t] = pos[t - 1] * raw_returns[t];
        growth *= 1.0 + strategy_returns[t];
        equity[t] = initial_capital * growth;
    }

    debug!(
        bars = n,
        initial_capital,
        final_equity = equity.last().copied().unwrap_or(initial_capital),
        "backtest run complete"
    );

    Ok(BacktestResult {
        timestamps: price.timestamps(),
        close,
        position: pos,
        raw_returns,
        strategy_returns,
        equity,
        position_delta: position.deltas(),
    })
}
