//! Strategy signal generators
//!
//! Each strategy turns a [`PriceSeries`] into a [`PositionSeries`] of the same
//! length. Parameters arrive as an open JSON map and are validated when the
//! strategy is built, before any price data is read.

pub mod breakout;
pub mod ma_crossover;
pub mod mean_reversion;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backtest::types::{PositionSeries, PriceSeries};
use crate::error::{BacktestError, Result};

pub use breakout::Breakout;
pub use ma_crossover::MaCrossover;
pub use mean_reversion::MeanReversion;

/// Raw strategy parameters as received at the boundary
pub type StrategyParams = serde_json::Map<String, Value>;

/// Produces one position per bar from a price series
pub trait SignalGenerator {
    fn generate(&self, series: &PriceSeries) -> PositionSeries;
}

/// Strategy names accepted at the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    MaCrossover,
    MeanReversion,
    Breakout,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::MaCrossover,
        StrategyKind::MeanReversion,
        StrategyKind::Breakout,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::MaCrossover => "ma_crossover",
            StrategyKind::MeanReversion => "mean_reversion",
            StrategyKind::Breakout => "breakout",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| BacktestError::config(format!("unknown strategy: {}", s)))
    }
}

/// A configured strategy, one variant per supported kind
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    MaCrossover(MaCrossover),
    MeanReversion(MeanReversion),
    Breakout(Breakout),
}

impl Strategy {
    /// Validate `params` for `kind` and build the strategy
    pub fn from_params(kind: StrategyKind, params: &StrategyParams) -> Result<Self> {
        Ok(match kind {
            StrategyKind::MaCrossover => Strategy::MaCrossover(MaCrossover::from_params(params)?),
            StrategyKind::MeanReversion => Strategy::MeanReversion(MeanReversion::from_params(params)?),
            StrategyKind::Breakout => Strategy::Breakout(Breakout::from_params(params)?),
        })
    }

    /// Look up a strategy by its boundary name, e.g. `"ma_crossover"`
    pub fn from_name(name: &str, params: &StrategyParams) -> Result<Self> {
        Self::from_params(name.parse()?, params)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::MaCrossover(_) => StrategyKind::MaCrossover,
            Strategy::MeanReversion(_) => StrategyKind::MeanReversion,
            Strategy::Breakout(_) => StrategyKind::Breakout,
        }
    }
}

impl SignalGenerator for Strategy {
    fn generate(&self, series: &PriceSeries) -> PositionSeries {
        match self {
            Strategy::MaCrossover(s) => s.generate(series),
            Strategy::MeanReversion(s) => s.generate(series),
            Strategy::Breakout(s) => s.generate(series),
        }
    }
}

/// Deserialize a parameter map into a strategy's typed parameters.
/// Unknown keys and wrong types are configuration errors.
pub(crate) fn parse_params<T: DeserializeOwned>(kind: StrategyKind, params: &StrategyParams) -> Result<T> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| BacktestError::config(format!("invalid parameters for {}: {}", kind, e)))
}

pub(crate) fn require_window(kind: StrategyKind, name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(BacktestError::config(format!("{}: {} must be at least 1", kind, name)));
    }
    Ok(())
}

// ============================================================================
// Catalog
// ============================================================================

/// Description of a strategy for discovery endpoints
#[derive(Debug, Clone, Serialize)]
pub struct StrategyInfo {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub params: BTreeMap<&'static str, &'static str>,
}

/// All available strategies with their tunable parameters
pub fn catalog() -> Vec<StrategyInfo> {
    StrategyKind::ALL
        .into_iter()
        .map(|kind| match kind {
            StrategyKind::MaCrossover => StrategyInfo {
                name: kind.name(),
                label: "MA Crossover",
                description: "Moving average crossover. Long while the fast MA is above the slow MA, short while it is below.",
                params: BTreeMap::from([
                    ("fast", "length of the fast moving average in bars"),
                    ("slow", "length of the slow moving average in bars"),
                ]),
            },
            StrategyKind::MeanReversion => StrategyInfo {
                name: kind.name(),
                label: "Mean Reversion",
                description: "Buy when price drops below SMA - k*std, exit once it is back above the SMA.",
                params: BTreeMap::from([
                    ("window", "window in bars for the SMA and standard deviation"),
                    ("std_k", "how many standard deviations below the SMA price must fall"),
                ]),
            },
            StrategyKind::Breakout => StrategyInfo {
                name: kind.name(),
                label: "Breakout",
                description: "Range breakout. Enter when price exceeds the prior N-bar high, exit below the prior N-bar low.",
                params: BTreeMap::from([("window", "window in bars for the high/low channel")]),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> StrategyParams {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!("breakout".parse::<StrategyKind>().unwrap(), StrategyKind::Breakout);
        let err = "momentum".parse::<StrategyKind>().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_kind_serde_names_match() {
        for kind in StrategyKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.name());
        }
    }

    #[test]
    fn test_from_name_uses_defaults() {
        let strategy = Strategy::from_name("ma_crossover", &StrategyParams::new()).unwrap();
        assert_eq!(strategy, Strategy::MaCrossover(MaCrossover::new(20, 50).unwrap()));
        assert_eq!(strategy.kind(), StrategyKind::MaCrossover);
    }

    #[test]
    fn test_unknown_param_rejected() {
        let err = Strategy::from_name("breakout", &params(json!({"window": 10, "lookback": 5}))).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("breakout"));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let err = Strategy::from_name("mean_reversion", &params(json!({"window": "twenty"}))).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_catalog_covers_all_kinds() {
        let names: Vec<_> = catalog().iter().map(|info| info.name).collect();
        assert_eq!(names, vec!["ma_crossover", "mean_reversion", "breakout"]);
        assert!(catalog()[1].params.contains_key("std_k"));
    }
}
