//! Error types shared by the pipeline and its collaborators.

use thiserror::Error;

/// Errors raised while configuring or running a backtest.
///
/// Metrics that cannot be computed are not errors; they come back as `None`.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// Invalid strategy parameters, or a strategy that produced no usable positions
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Empty, missing or malformed price data
    #[error("data error: {0}")]
    Data(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BacktestError {
    pub fn config(msg: impl Into<String>) -> Self {
        BacktestError::Configuration(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        BacktestError::Data(msg.into())
    }

    /// Returns true if this is a parameter/configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, BacktestError::Configuration(_))
    }

    /// Error category for the API boundary: `config`, `data` or `io`.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            BacktestError::Configuration(_) | BacktestError::Json(_) => "config",
            BacktestError::Data(_) => "data",
            BacktestError::Io(_) | BacktestError::Parquet(_) | BacktestError::Arrow(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, BacktestError>;
