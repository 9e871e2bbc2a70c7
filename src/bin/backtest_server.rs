//! Backtest server
//!
//! Loads bars from the local parquet store (through the parquet cache) and
//! runs single-strategy backtests over them.
//!
//! Run: PARQUET_DIR=data/parquet cargo run --release --bin backtest_server

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use quant_backtest::backtest::{run_backtest, BacktestReport, BacktestSpec};
use quant_backtest::config::ServerConfig;
use quant_backtest::data::{list_tickers, CachedProvider, LocalParquetProvider, ParquetCache, PriceProvider, PriceRequest};
use quant_backtest::strategies::{catalog, StrategyInfo};
use quant_backtest::BacktestError;

// ============================================================================
// State
// ============================================================================

struct AppState {
    provider: CachedProvider<LocalParquetProvider>,
    parquet_dir: PathBuf,
}

type ApiError = (StatusCode, String);

fn bad_request(e: BacktestError) -> ApiError {
    error!(category = e.category(), "{}", e);
    (StatusCode::BAD_REQUEST, e.to_string())
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

fn default_source() -> String {
    "local".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

#[derive(Deserialize)]
struct RunRequest {
    ticker: String,
    period: Period,
    #[serde(default = "default_source")]
    source: String,
    #[serde(default = "default_interval")]
    interval: String,
    #[serde(flatten)]
    spec: BacktestSpec,
}

impl RunRequest {
    fn price_request(&self) -> PriceRequest {
        PriceRequest {
            ticker: self.ticker.clone(),
            source: self.source.clone(),
            interval: self.interval.clone(),
            start: self.period.start,
            end: self.period.end,
        }
    }
}

#[derive(Serialize)]
struct LoadResponse {
    ticker: String,
    source: String,
    interval: String,
    rows: usize,
    start: String,
    end: String,
}

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ============================================================================
// Handlers
// ============================================================================

async fn strategies() -> Json<Vec<StrategyInfo>> {
    Json(catalog())
}

async fn run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunRequest>,
) -> Result<Json<BacktestReport>, ApiError> {
    let start = Instant::now();
    let series = state.provider.load(&req.price_request()).map_err(bad_request)?;
    let report = run_backtest(&series, &req.spec).map_err(bad_request)?;

    info!(
        ticker = %req.ticker,
        strategy = %req.spec.strategy,
        bars = series.len(),
        trades = report.trades.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "backtest completed"
    );
    Ok(Json(report))
}

async fn tickers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    list_tickers(&state.parquet_dir).map(Json).map_err(bad_request)
}

async fn load(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PriceRequest>,
) -> Result<Json<LoadResponse>, ApiError> {
    let series = state.provider.load(&req).map_err(bad_request)?;
    Ok(Json(LoadResponse {
        rows: series.len(),
        start: iso(series.first().timestamp),
        end: iso(series.last().timestamp),
        ticker: req.ticker,
        source: req.source,
        interval: req.interval,
    }))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quant_backtest=info,backtest_server=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let cache = ParquetCache::new(&config.cache_dir)?;
    let state = Arc::new(AppState {
        provider: CachedProvider::new(LocalParquetProvider::new(&config.parquet_dir), cache),
        parquet_dir: config.parquet_dir.clone(),
    });

    info!(parquet_dir = %config.parquet_dir.display(), cache_dir = %config.cache_dir.display(), "data dirs");

    let app = Router::new()
        .route("/backtest/strategies", get(strategies))
        .route("/backtest/run", post(run))
        .route("/data/tickers", get(tickers))
        .route("/data/load", post(load))
        .layer(CorsLayer::permissive())
        .with_state(state);

    info!("backtest server on http://{}", config.bind_addr);
    info!("  GET  /backtest/strategies - strategy catalog");
    info!("  POST /backtest/run        - run one strategy on one ticker");
    info!("  GET  /data/tickers        - list local tickers");
    info!("  POST /data/load           - load bars and report their span");

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
