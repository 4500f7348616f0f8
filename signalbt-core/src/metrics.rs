//! Performance metrics: pure functions over the finished ledger and prices.
//!
//! Every metric is a pure function: final balance, trade list and/or the bar
//! sequence in, scalar out. Percentages are simple returns times 100;
//! annualization uses a 365-day year regardless of the bar timeframe.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, TradeRecord};

/// Days per year used for annualization.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Flat record of named metrics for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub strategy_profit_pct: f64,
    pub strategy_profit_usd: f64,
    pub hold_profit_pct: f64,
    pub hold_profit_usd: f64,
    pub annual_return: f64,
    pub trades: usize,
    pub winning_trades: usize,
    pub win_rate: f64,
    pub days_in_test: i64,
    pub total_commission: f64,
}

impl Report {
    /// Compute all metrics for a finished run.
    ///
    /// `bars` must be non-empty (the engine validates this before simulating).
    pub fn compute(
        bars: &[Bar],
        trades: &[TradeRecord],
        initial_balance: f64,
        final_balance: f64,
        total_commission: f64,
    ) -> Self {
        let (first_close, last_close) = match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => (first.close, last.close),
            _ => (0.0, 0.0),
        };
        let days = days_in_test(bars);
        let winning_trades = winning_trades(trades);

        Self {
            initial_balance,
            final_balance,
            strategy_profit_pct: strategy_profit_pct(initial_balance, final_balance),
            strategy_profit_usd: final_balance - initial_balance,
            hold_profit_pct: hold_profit_pct(first_close, last_close),
            hold_profit_usd: hold_profit_usd(initial_balance, first_close, last_close),
            annual_return: annual_return(initial_balance, final_balance, days),
            trades: trades.len(),
            winning_trades,
            win_rate: win_rate(winning_trades, trades.len()),
            days_in_test: days,
            total_commission,
        }
    }

    pub fn beats_hold(&self) -> bool {
        self.strategy_profit_usd > self.hold_profit_usd
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Strategy return in percent: (final - initial) / initial * 100.
pub fn strategy_profit_pct(initial_balance: f64, final_balance: f64) -> f64 {
    if initial_balance <= 0.0 {
        return 0.0;
    }
    (final_balance - initial_balance) / initial_balance * 100.0
}

/// Buy-and-hold return in percent from the first to the last close.
pub fn hold_profit_pct(first_close: f64, last_close: f64) -> f64 {
    if first_close <= 0.0 {
        return 0.0;
    }
    (last_close - first_close) / first_close * 100.0
}

/// Buy-and-hold profit in account currency: no commission, no timing logic.
pub fn hold_profit_usd(initial_balance: f64, first_close: f64, last_close: f64) -> f64 {
    if first_close <= 0.0 {
        return 0.0;
    }
    initial_balance * (last_close / first_close) - initial_balance
}

/// Whole days between the first and the last bar.
pub fn days_in_test(bars: &[Bar]) -> i64 {
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_days(),
        _ => 0,
    }
}

/// Total return compounded to a 365-day year, in percent.
///
/// Zero when no whole day elapsed. A wiped-out account (final ≤ 0) reports -100.
pub fn annual_return(initial_balance: f64, final_balance: f64, days_in_test: i64) -> f64 {
    if days_in_test <= 0 || initial_balance <= 0.0 {
        return 0.0;
    }
    let growth = final_balance / initial_balance;
    if growth <= 0.0 {
        return -100.0;
    }
    (growth.powf(DAYS_PER_YEAR / days_in_test as f64) - 1.0) * 100.0
}

/// Winning trades over all trades, in percent. Zero when there are no trades.
pub fn win_rate(winning_trades: usize, trade_count: usize) -> f64 {
    if trade_count == 0 {
        return 0.0;
    }
    winning_trades as f64 / trade_count as f64 * 100.0
}

pub fn winning_trades(trades: &[TradeRecord]) -> usize {
    trades.iter().filter(|t| t.is_winner()).count()
}
