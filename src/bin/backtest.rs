//! Backtest CLI
//!
//! Usage: backtest <bars.parquet> <strategy> [params-json] [initial-capital]
//!
//! Prints the JSON report to stdout.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use quant_backtest::backtest::{run_backtest, BacktestSpec};
use quant_backtest::data::parquet::read_bars;
use quant_backtest::strategies::{StrategyKind, StrategyParams};
use quant_backtest::{BacktestError, Result};

const USAGE: &str = "Usage: backtest <bars.parquet> <strategy> [params-json] [initial-capital]";

fn parse_spec(args: &[String]) -> Result<BacktestSpec> {
    let kind: StrategyKind = args[2].parse()?;
    let mut spec = BacktestSpec::new(kind);

    if let Some(raw) = args.get(3) {
        spec.params = serde_json::from_str::<StrategyParams>(raw)
            .map_err(|e| BacktestError::config(format!("params must be a JSON object: {}", e)))?;
    }
    if let Some(raw) = args.get(4) {
        spec.initial_capital = raw
            .parse()
            .map_err(|_| BacktestError::config(format!("invalid initial capital: {}", raw)))?;
    }
    Ok(spec)
}

fn run(args: &[String]) -> Result<String> {
    let path = PathBuf::from(&args[1]);
    let spec = parse_spec(args)?;

    let start = Instant::now();
    let series = read_bars(&path)?;
    let report = run_backtest(&series, &spec)?;
    let elapsed = start.elapsed();

    eprintln!("───────────────────────────────");
    eprintln!("Strategy:  {}", spec.strategy);
    eprintln!("Bars:      {}", series.len());
    eprintln!("Trades:    {}", report.trades.len());
    eprintln!("Time:      {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    eprintln!("───────────────────────────────");

    Ok(serde_json::to_string_pretty(&report)?)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }

    match run(&args) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} error: {}", e.category(), e);
            ExitCode::FAILURE
        }
    }
}
