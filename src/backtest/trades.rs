// src/backtest/trades.rs
// Trade ledger extraction from position changes

use crate::backtest::types::{PositionSeries, PriceSeries, Trade, TradeSide};

/// Walk the bars in order and turn position changes into closed trades.
///
/// Single open slot, long/flat semantics:
/// - a position increase opens a Long trade at the bar's close, replacing any
///   trade already open (the replaced trade is dropped, not closed)
/// - a position decrease closes the open trade at the bar's close
/// - a decrease with nothing open does nothing
///
/// Returns are always `exit / entry - 1`, whatever the position sign, and a
/// trade still open on the last bar is not reported.
pub fn extract_trades(position: &PositionSeries, price: &PriceSeries) -> Vec<Trade> {
    let mut trades = Vec::new();
    let mut open: Option<Trade> = None;

    for (delta, bar) in position.deltas().into_iter().zip(price.bars()) {
        if delta > 0.0 {
            open = Some(Trade {
                entry_time: bar.timestamp,
                entry_price: bar.close,
                exit_time: None,
                exit_price: None,
                realized_return: None,
                side: TradeSide::Long,
            });
        } else if delta < 0.0 {
            if let Some(mut trade) = open.take() {
                trade.exit_time = Some(bar.timestamp);
                trade.exit_price = Some(bar.close);
                trade.realized_return = Some(bar.close / trade.entry_price - 1.0);
                trades.push(trade);
            }
        }
    }

    trades
}
