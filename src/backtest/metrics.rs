// src/backtest/metrics.rs
// Performance metrics calculation

use std::str::FromStr;

use crate::backtest::types::Metrics;
use crate::common::{mean, sample_std};

/// Sampling frequency of a return series, used to annualize statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    #[default]
    Daily,
    Hourly,
    Monthly,
}

impl Frequency {
    /// Parse a frequency tag ("D", "H"/"1H", "M"/"1M"), case-insensitive.
    /// Unrecognized tags fall back to daily.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "H" | "1H" => Frequency::Hourly,
            "M" | "1M" => Frequency::Monthly,
            _ => Frequency::Daily,
        }
    }

    /// Return periods per year
    pub fn periods_per_year(self) -> f64 {
        match self {
            Frequency::Daily => 252.0,
            // 6.5 trading hours per session
            Frequency::Hourly => 252.0 * 6.5,
            Frequency::Monthly => 12.0,
        }
    }
}

impl FromStr for Frequency {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Frequency::from_tag(s))
    }
}

/// Calculate all metrics from per-bar strategy returns (risk-free rate 0)
pub fn calculate_metrics(returns: &[f64], freq: Frequency) -> Metrics {
    calculate_metrics_with_rf(returns, freq, 0.0)
}

/// Calculate all metrics against an annual risk-free rate.
///
/// Every field is `None` when the statistic is not computable for this series.
pub fn calculate_metrics_with_rf(returns: &[f64], freq: Frequency, risk_free: f64) -> Metrics {
    let equity = equity_curve(returns);

    Metrics {
        sharpe: finite(sharpe_ratio(returns, freq, risk_free)),
        sortino: finite(sortino_ratio(returns, freq, risk_free)),
        max_drawdown: finite(max_drawdown(&equity)),
        cagr: finite(cagr(&equity, freq)),
        volatility: finite(volatility(returns, freq)),
        win_rate: finite(win_rate(returns)),
        profit_factor: finite(profit_factor(returns)),
    }
}

/// Convert to a JSON-safe number: NaN and infinities become `None`
#[inline]
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Compounded growth of one unit of capital
fn equity_curve(returns: &[f64]) -> Vec<f64> {
    let mut growth = 1.0;
    returns
        .iter()
        .map(|r| {
            growth *= 1.0 + r;
            growth
        })
        .collect()
}

fn excess_returns(returns: &[f64], freq: Frequency, risk_free: f64) -> Vec<f64> {
    let per_period_rf = risk_free / freq.periods_per_year();
    returns.iter().map(|r| r - per_period_rf).collect()
}

/// Annualized Sharpe ratio
fn sharpe_ratio(returns: &[f64], freq: Frequency, risk_free: f64) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }
    let excess = excess_returns(returns, freq, risk_free);
    let std = sample_std(&excess);
    if std == 0.0 {
        return f64::NAN;
    }
    freq.periods_per_year().sqrt() * mean(&excess) / std
}

/// Annualized Sortino ratio (downside = excess returns below zero)
fn sortino_ratio(returns: &[f64], freq: Frequency, risk_free: f64) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }
    let excess = excess_returns(returns, freq, risk_free);
    let downside: Vec<f64> = excess.iter().copied().filter(|&r| r < 0.0).collect();
    let downside_std = sample_std(&downside);
    if downside_std == 0.0 {
        return f64::NAN;
    }
    freq.periods_per_year().sqrt() * mean(&excess) / downside_std
}

/// Calculate maximum drawdown
fn max_drawdown(equity: &[f64]) -> f64 {
    if equity.is_empty() {
        return f64::NAN;
    }

    let mut peak = equity[0];
    let mut max_dd: f64 = 0.0;

    for &value in equity {
        if value > peak {
            peak = value;
        }
        let dd = value / peak - 1.0;
        if dd < max_dd {
            max_dd = dd;
        }
    }

    max_dd
}

/// Compound annual growth rate between the first and last equity points
fn cagr(equity: &[f64], freq: Frequency) -> f64 {
    let n = equity.len();
    if n <= 1 {
        return f64::NAN;
    }
    let years = n as f64 / freq.periods_per_year();
    if years <= 0.0 {
        return f64::NAN;
    }
    (equity[n - 1] / equity[0]).powf(1.0 / years) - 1.0
}

/// Calculate annualized volatility
fn volatility(returns: &[f64], freq: Frequency) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }
    sample_std(returns) * freq.periods_per_year().sqrt()
}

/// Share of winning bars among bars with a nonzero return
fn win_rate(returns: &[f64]) -> f64 {
    let wins = returns.iter().filter(|&&r| r > 0.0).count();
    let active = returns.iter().filter(|&&r| r != 0.0).count();
    if active == 0 {
        return f64::NAN;
    }
    wins as f64 / active as f64
}

/// Gross gains over gross losses; undefined rather than infinite without losses
fn profit_factor(returns: &[f64]) -> f64 {
    let gains: f64 = returns.iter().filter(|&&r| r > 0.0).sum();
    let losses: f64 = -returns.iter().filter(|&&r| r < 0.0).sum::<f64>();
    if losses == 0.0 {
        return f64::NAN;
    }
    gains / losses
}
