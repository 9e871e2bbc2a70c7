// src/backtest/types.rs
// Core types for the backtest pipeline, shaped for the JSON boundary

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BacktestError, Result};

// ============================================================================
// Price Data
// ============================================================================

/// One timestamped OHLCV observation
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    fn validate(&self) -> Result<()> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(BacktestError::data(format!(
                "non-finite value in bar at {}",
                self.timestamp.to_rfc3339()
            )));
        }
        if [self.open, self.high, self.low, self.close].iter().any(|&v| v <= 0.0) {
            return Err(BacktestError::data(format!(
                "non-positive price in bar at {}",
                self.timestamp.to_rfc3339()
            )));
        }
        if self.high < self.low {
            return Err(BacktestError::data(format!(
                "high {} below low {} at {}",
                self.high,
                self.low,
                self.timestamp.to_rfc3339()
            )));
        }
        Ok(())
    }
}

/// Chronological, non-empty sequence of bars with strictly increasing timestamps.
///
/// The invariant is checked once at construction (and on deserialization), so
/// the strategies, engine and trade extractor never re-check shape.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Vec<PriceBar>", into = "Vec<PriceBar>")]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(BacktestError::data("price series is empty"));
        }
        for bar in &bars {
            bar.validate()?;
        }
        if let Some(pair) = bars.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(BacktestError::data(format!(
                "timestamps must be strictly increasing: {} follows {}",
                pair[1].timestamp.to_rfc3339(),
                pair[0].timestamp.to_rfc3339()
            )));
        }
        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn first(&self) -> &PriceBar {
        &self.bars[0]
    }

    pub fn last(&self) -> &PriceBar {
        &self.bars[self.bars.len() - 1]
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// Restrict to bars whose calendar date lies in `[start, end]` (inclusive).
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        let bars: Vec<PriceBar> = self
            .bars
            .iter()
            .filter(|b| {
                let day = b.timestamp.date_naive();
                day >= start && day <= end
            })
            .copied()
            .collect();
        if bars.is_empty() {
            return Err(BacktestError::data(format!("no bars between {} and {}", start, end)));
        }
        Ok(PriceSeries { bars })
    }
}

impl TryFrom<Vec<PriceBar>> for PriceSeries {
    type Error = BacktestError;

    fn try_from(bars: Vec<PriceBar>) -> Result<Self> {
        PriceSeries::new(bars)
    }
}

impl From<PriceSeries> for Vec<PriceBar> {
    fn from(series: PriceSeries) -> Self {
        series.bars
    }
}

// ============================================================================
// Signals & Positions
// ============================================================================

/// Directional signal for one bar; serialized as -1 / 0 / 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Signal {
    Short = -1,
    #[default]
    Flat = 0,
    Long = 1,
}

impl Signal {
    pub fn value(self) -> f64 {
        i8::from(self) as f64
    }
}

impl From<Signal> for i8 {
    fn from(signal: Signal) -> Self {
        signal as i8
    }
}

impl TryFrom<i8> for Signal {
    type Error = String;

    fn try_from(value: i8) -> std::result::Result<Self, Self::Error> {
        match value {
            -1 => Ok(Signal::Short),
            0 => Ok(Signal::Flat),
            1 => Ok(Signal::Long),
            other => Err(format!("invalid signal value {}", other)),
        }
    }
}

/// Per-bar positions aligned to the price series they were derived from
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PositionSeries(Vec<Signal>);

impl PositionSeries {
    pub fn new(signals: Vec<Signal>) -> Self {
        Self(signals)
    }

    /// Carry the last assigned signal forward over unassigned bars.
    /// Leading unassigned bars are Flat.
    pub fn held_forward(signals: &[Option<Signal>]) -> Self {
        let mut last = Signal::Flat;
        let held = signals
            .iter()
            .map(|s| {
                if let Some(s) = s {
                    last = *s;
                }
                last
            })
            .collect();
        Self(held)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn signals(&self) -> &[Signal] {
        &self.0
    }

    pub fn values(&self) -> Vec<f64> {
        self.0.iter().map(|s| s.value()).collect()
    }

    /// position[t] - position[t-1], with the first bar measured from flat
    pub fn deltas(&self) -> Vec<f64> {
        let values = self.values();
        let mut prev = 0.0;
        values
            .iter()
            .map(|&v| {
                let delta = v - prev;
                prev = v;
                delta
            })
            .collect()
    }
}

impl From<Vec<Signal>> for PositionSeries {
    fn from(signals: Vec<Signal>) -> Self {
        Self(signals)
    }
}

// ============================================================================
// Engine Output
// ============================================================================

/// Per-bar output of the backtest engine; every vector has one entry per bar
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub timestamps: Vec<DateTime<Utc>>,
    pub close: Vec<f64>,
    pub position: Vec<f64>,
    pub raw_returns: Vec<f64>,
    pub strategy_returns: Vec<f64>,
    pub equity: Vec<f64>,
    pub position_delta: Vec<f64>,
}

impl BacktestResult {
    pub fn len(&self) -> usize {
        self.equity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equity.is_empty()
    }

    pub fn final_equity(&self) -> Option<f64> {
        self.equity.last().copied()
    }
}

// ============================================================================
// Trades
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Long,
    Short,
}

/// One ledger entry. Exit fields stay `None` while the trade is open.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    #[serde(rename = "entry_date")]
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    #[serde(rename = "exit_date")]
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_price: Option<f64>,
    #[serde(rename = "return")]
    pub realized_return: Option<f64>,
    #[serde(rename = "type")]
    pub side: TradeSide,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.exit_time.is_some()
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// Scalar performance statistics; `None` marks a value that is not computable
/// and serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Metrics {
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub cagr: Option<f64>,
    pub volatility: Option<f64>,
    pub win_rate: Option<f64>,
    pub profit_factor: Option<f64>,
}
