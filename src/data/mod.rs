//! Price data retrieval
//!
//! Everything that touches the file system lives here so the backtest
//! pipeline itself stays pure. Providers hand over a validated
//! [`PriceSeries`] restricted to the requested dates or fail with a data error.

pub mod cache;
pub mod local;
pub mod parquet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::backtest::types::PriceSeries;
use crate::error::{BacktestError, Result};

pub use cache::{CachedProvider, ParquetCache};
pub use local::{list_tickers, LocalParquetProvider};

fn default_source() -> String {
    "local".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

/// Which bars to load; the dates are inclusive calendar days
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PriceRequest {
    pub ticker: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_interval")]
    pub interval: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PriceRequest {
    pub fn new(ticker: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            source: default_source(),
            interval: default_interval(),
            start,
            end,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(BacktestError::data("ticker is empty"));
        }
        if self.end < self.start {
            return Err(BacktestError::data(format!(
                "period end {} is before start {}",
                self.end, self.start
            )));
        }
        Ok(())
    }
}

/// Source of historical bars
pub trait PriceProvider: Send + Sync {
    fn load(&self, request: &PriceRequest) -> Result<PriceSeries>;
}
