//! Bar-by-bar loop: the heart of the backtesting engine.
//!
//! Bar 0 only establishes baselines. For every later bar `t`:
//! 1. Signal exit: under `OnNextSignal`, a newer non-zero signal on bar `t - 1`
//!    closes the open position at bar `t`'s close.
//! 2. Carry-over exit: under `SameBarClose`, a position filled at an earlier
//!    bar's close is closed at bar `t`'s close.
//! 3. Entry: when flat, the signal selected by `EntryTiming` may open a position.
//! 4. Same-bar exit: under `SameBarClose`, a position filled at bar `t`'s open is
//!    closed at bar `t`'s close.
//! 5. Record the running balance.

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{validate_bars, Bar, BarError, Fill, FillPoint, Position, TradeRecord};
use crate::metrics::Report;

use super::config::{ConfigError, EngineConfig, ExitTiming};
use super::state::EngineState;

/// Rejections raised before the first bar is simulated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid bar data: {0}")]
    Bars(#[from] BarError),
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub report: Report,
    pub trades: Vec<TradeRecord>,
    pub fills: Vec<Fill>,
    /// Balance after each bar, index-aligned with the input bars.
    pub balance_curve: Vec<f64>,
    /// Position still open after the last bar (never set with `liquidate_at_end`).
    pub open_position: Option<Position>,
    pub skipped_entries: usize,
}

/// Run a backtest over an ordered bar sequence.
///
/// Validates `config` and `bars` up front; after that the pass cannot fail.
pub fn run_backtest(bars: &[Bar], config: &EngineConfig) -> Result<RunResult, BacktestError> {
    config.validate()?;
    validate_bars(bars)?;

    let mut state = EngineState::new(config.initial_balance);
    let mut balance_curve = Vec::with_capacity(bars.len());
    balance_curve.push(state.account.balance);

    for t in 1..bars.len() {
        step(&mut state, bars, t, config);
        balance_curve.push(state.account.balance);
    }

    if config.liquidate_at_end && state.position.is_some() {
        let last = bars.len() - 1;
        state.close_at(bars, last, config.commission_rate);
        if let Some(balance) = balance_curve.last_mut() {
            *balance = state.account.balance;
        }
    }

    let report = Report::compute(
        bars,
        &state.trades,
        config.initial_balance,
        state.account.balance,
        state.account.total_commission,
    );

    info!(
        "backtest finished: {} bars, {} trades ({} winning), final balance {:.2}",
        bars.len(),
        report.trades,
        report.winning_trades,
        report.final_balance
    );

    Ok(RunResult {
        report,
        trades: state.trades,
        fills: state.fills,
        balance_curve,
        open_position: state.position,
        skipped_entries: state.skipped_entries,
    })
}

/// Process bar `t` (t ≥ 1).
fn step(state: &mut EngineState, bars: &[Bar], t: usize, config: &EngineConfig) {
    let rate = config.commission_rate;

    // ─── Phase 1: signal exit ───
    if config.exit_timing == ExitTiming::OnNextSignal
        && bars[t - 1].has_signal()
        && state
            .position
            .as_ref()
            .is_some_and(|p| p.signal_bar < t - 1)
    {
        state.close_at(bars, t, rate);
    }

    // ─── Phase 2: carry-over exit ───
    if config.exit_timing == ExitTiming::SameBarClose
        && state.position.as_ref().is_some_and(|p| p.entry_bar < t)
    {
        state.close_at(bars, t, rate);
    }

    // ─── Phase 3: entry ───
    if state.is_flat() {
        state.try_enter(bars, t, config);
    }

    // ─── Phase 4: same-bar exit ───
    if config.exit_timing == ExitTiming::SameBarClose
        && state
            .position
            .as_ref()
            .is_some_and(|p| p.entry_bar == t && p.entry_fill == FillPoint::Open)
    {
        state.close_at(bars, t, rate);
    }
}
