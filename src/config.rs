//! Server configuration from the environment
//!
//! | variable     | default          |
//! |--------------|------------------|
//! | `PARQUET_DIR`| `data/parquet`   |
//! | `CACHE_DIR`  | `data/cache`     |
//! | `BIND_ADDR`  | `127.0.0.1:3030` |

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{BacktestError, Result};

pub const DEFAULT_PARQUET_DIR: &str = "data/parquet";
pub const DEFAULT_CACHE_DIR: &str = "data/cache";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3030";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub parquet_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to the defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parquet_dir = lookup("PARQUET_DIR").unwrap_or_else(|| DEFAULT_PARQUET_DIR.to_string());
        let cache_dir = lookup("CACHE_DIR").unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string());
        let bind = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let bind_addr = bind
            .parse()
            .map_err(|e| BacktestError::config(format!("invalid BIND_ADDR {:?}: {}", bind, e)))?;

        Ok(Self {
            parquet_dir: PathBuf::from(parquet_dir),
            cache_dir: PathBuf::from(cache_dir),
            bind_addr,
        })
    }
}
