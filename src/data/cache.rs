//! On-disk parquet cache in front of any [`PriceProvider`]
//!
//! A cache entry holds whatever the inner provider returned for one exact
//! request. Cache failures are logged and treated as misses; they never fail
//! the load itself.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::parquet::{read_bars, write_bars};
use super::{PriceProvider, PriceRequest};
use crate::backtest::types::PriceSeries;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ParquetCache {
    dir: PathBuf,
}

impl ParquetCache {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{source}_{TICKER}_{start}_{end}_{interval}.parquet`
    pub fn path_for(&self, request: &PriceRequest) -> PathBuf {
        let ticker = request.ticker.replace('/', "_").to_uppercase();
        self.dir.join(format!(
            "{}_{}_{}_{}_{}.parquet",
            request.source, ticker, request.start, request.end, request.interval
        ))
    }

    pub fn get(&self, request: &PriceRequest) -> Option<PriceSeries> {
        let path = self.path_for(request);
        if !path.exists() {
            return None;
        }
        match read_bars(&path) {
            Ok(series) => Some(series),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable cache entry");
                None
            }
        }
    }

    pub fn put(&self, request: &PriceRequest, series: &PriceSeries) {
        let path = self.path_for(request);
        if let Err(e) = write_bars(&path, series) {
            warn!(path = %path.display(), error = %e, "failed to write cache entry");
        }
    }
}

/// Serves repeated requests from the cache, loading from `inner` on a miss
#[derive(Debug, Clone)]
pub struct CachedProvider<P> {
    inner: P,
    cache: ParquetCache,
}

impl<P: PriceProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: ParquetCache) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn cache(&self) -> &ParquetCache {
        &self.cache
    }
}

impl<P: PriceProvider> PriceProvider for CachedProvider<P> {
    fn load(&self, request: &PriceRequest) -> Result<PriceSeries> {
        request.validate()?;
        if let Some(cached) = self.cache.get(request) {
            debug!(ticker = %request.ticker, "cache hit");
            return cached.between(request.start, request.end);
        }

        debug!(ticker = %request.ticker, "cache miss");
        let series = self.inner.load(request)?;
        self.cache.put(request, &series);
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::types::PriceBar;
    use crate::error::BacktestError;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl PriceProvider for CountingProvider {
        fn load(&self, request: &PriceRequest) -> Result<PriceSeries> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.ticker == "FAIL" {
                return Err(BacktestError::data("no data for FAIL"));
            }
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let bars = (0..5)
                .map(|i| PriceBar {
                    timestamp: start + Duration::days(i),
                    open: 1.0,
                    high: 2.0,
                    low: 0.5,
                    close: 1.0 + i as f64,
                    volume: 0.0,
                })
                .collect();
            PriceSeries::new(bars)
        }
    }

    fn request(ticker: &str) -> PriceRequest {
        PriceRequest::new(
            ticker,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        )
    }

    #[test]
    fn test_cache_file_name() {
        let dir = tempdir().unwrap();
        let cache = ParquetCache::new(dir.path()).unwrap();
        let mut req = request("btc/usd");
        req.source = "crypto".to_string();
        let name = cache.path_for(&req).file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, "crypto_BTC_USD_2024-01-01_2024-01-05_1d.parquet");
    }

    #[test]
    fn test_second_load_hits_cache() {
        let dir = tempdir().unwrap();
        let cache = ParquetCache::new(dir.path()).unwrap();
        let provider = CachedProvider::new(CountingProvider { calls: AtomicUsize::new(0) }, cache);

        let first = provider.load(&request("SPY")).unwrap();
        let second = provider.load(&request("SPY")).unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let dir = tempdir().unwrap();
        let cache = ParquetCache::new(dir.path()).unwrap();
        let provider = CachedProvider::new(CountingProvider { calls: AtomicUsize::new(0) }, cache);

        assert!(provider.load(&request("FAIL")).is_err());
        assert!(provider.load(&request("FAIL")).is_err());
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 2);
        assert!(!provider.cache().path_for(&request("FAIL")).exists());
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = tempdir().unwrap();
        let cache = ParquetCache::new(dir.path()).unwrap();
        fs::write(cache.path_for(&request("SPY")), b"not parquet").unwrap();
        assert!(cache.get(&request("SPY")).is_none());

        let provider = CachedProvider::new(CountingProvider { calls: AtomicUsize::new(0) }, cache);
        assert_eq!(provider.load(&request("SPY")).unwrap().len(), 5);
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 1);
    }
}
