//! Local bar store: one `<TICKER>.parquet` file per ticker in a directory

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::parquet::read_bars;
use super::{PriceProvider, PriceRequest};
use crate::backtest::types::PriceSeries;
use crate::error::{BacktestError, Result};

#[derive(Debug, Clone)]
pub struct LocalParquetProvider {
    dir: PathBuf,
}

impl LocalParquetProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.parquet", ticker))
    }
}

impl PriceProvider for LocalParquetProvider {
    fn load(&self, request: &PriceRequest) -> Result<PriceSeries> {
        request.validate()?;
        let path = self.path_for(&request.ticker);
        if !path.exists() {
            return Err(BacktestError::data(format!("no data for {}", request.ticker)));
        }
        let series = read_bars(&path)?.between(request.start, request.end)?;
        debug!(ticker = %request.ticker, bars = series.len(), "loaded local bars");
        Ok(series)
    }
}

/// Tickers available in `dir`, sorted
pub fn list_tickers(dir: &Path) -> Result<Vec<String>> {
    let mut tickers: Vec<String> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let path = e.path();
            if path.extension().map_or(false, |ext| ext == "parquet") {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.to_string())
            } else {
                None
            }
        })
        .collect();

    tickers.sort();
    Ok(tickers)
}
