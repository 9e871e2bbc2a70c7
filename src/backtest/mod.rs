// src/backtest/mod.rs
// Backtest pipeline: engine, metrics, trade ledger and the runner tying them together

pub mod types;
pub mod engine;
pub mod metrics;
pub mod trades;
pub mod runner;

// Re-export main types and functions
pub use types::*;
pub use engine::run;
pub use metrics::{calculate_metrics, calculate_metrics_with_rf, Frequency};
pub use trades::extract_trades;
pub use runner::{run_backtest, BacktestReport, BacktestSpec, DEFAULT_INITIAL_CAPITAL};
