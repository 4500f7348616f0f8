//! Run artifacts: result JSON, trade ledger CSV, and the text summary.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use signalbt_core::domain::{PositionSide, TradeRecord};

use crate::runner::BacktestResult;
use crate::sweep::SweepResults;

pub const RESULT_FILE: &str = "result.json";
pub const TRADES_FILE: &str = "trades.csv";
pub const SUMMARY_FILE: &str = "summary.txt";

#[derive(Serialize)]
struct TradeRow<'a> {
    side: &'a str,
    entry_bar: usize,
    entry_time: String,
    entry_price: f64,
    exit_bar: usize,
    exit_time: String,
    exit_price: f64,
    size: f64,
    gross_pnl: f64,
    commission: f64,
    pnl: f64,
    return_pct: f64,
    bars_held: usize,
    win: bool,
}

impl<'a> From<&'a TradeRecord> for TradeRow<'a> {
    fn from(trade: &'a TradeRecord) -> Self {
        Self {
            side: match trade.side {
                PositionSide::Long => "long",
                PositionSide::Short => "short",
            },
            entry_bar: trade.entry_bar,
            entry_time: trade.entry_timestamp.to_rfc3339(),
            entry_price: trade.entry_price,
            exit_bar: trade.exit_bar,
            exit_time: trade.exit_timestamp.to_rfc3339(),
            exit_price: trade.exit_price,
            size: trade.size,
            gross_pnl: trade.gross_pnl,
            commission: trade.commission_paid,
            pnl: trade.pnl,
            return_pct: trade.return_pct(),
            bars_held: trade.bars_held,
            win: trade.is_win,
        }
    }
}

pub fn write_trades_csv(path: &Path, trades: &[TradeRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create trades CSV {}", path.display()))?;
    for trade in trades {
        writer
            .serialize(TradeRow::from(trade))
            .context("Failed to write trade row")?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush trades CSV {}", path.display()))?;
    Ok(())
}

pub fn write_result_json(path: &Path, result: &BacktestResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write result JSON {}", path.display()))?;
    Ok(())
}

pub fn read_result_json(path: &Path) -> Result<BacktestResult> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read result JSON {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse result JSON {}", path.display()))
}

/// Write `result.json`, `trades.csv` and `summary.txt` into `dir`, creating it
/// if needed. Returns the written paths.
pub fn save_artifacts(dir: &Path, result: &BacktestResult) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let result_path = dir.join(RESULT_FILE);
    write_result_json(&result_path, result)?;

    let trades_path = dir.join(TRADES_FILE);
    write_trades_csv(&trades_path, &result.trades)?;

    let summary_path = dir.join(SUMMARY_FILE);
    fs::write(&summary_path, format_summary(result))
        .with_context(|| format!("Failed to write summary {}", summary_path.display()))?;

    Ok(vec![result_path, trades_path, summary_path])
}

/// Human-readable run summary.
pub fn format_summary(result: &BacktestResult) -> String {
    let r = &result.report;
    let mut out = String::new();

    out.push_str("=== Results ===\n");
    out.push_str(&format!(
        "Period: {} - {} ({} days)\n",
        result.start.format("%Y-%m-%d"),
        result.end.format("%Y-%m-%d"),
        r.days_in_test
    ));
    out.push_str(&format!(
        "Timeframe: {}\n",
        result.timeframe.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!("Symbol: {}\n", result.symbol));

    out.push_str("\n=== Strategy ===\n");
    out.push_str(&format!("Initial balance: {}\n", usd(r.initial_balance)));
    out.push_str(&format!("Final balance: {}\n", usd(r.final_balance)));
    out.push_str(&format!(
        "Profit: {} ({:.2}%)\n",
        usd(r.strategy_profit_usd),
        r.strategy_profit_pct
    ));
    out.push_str(&format!("APR: {:.2}%\n", r.annual_return));
    out.push_str(&format!("Trades: {}\n", r.trades));
    out.push_str(&format!("Win Rate: {:.2}%\n", r.win_rate));
    out.push_str(&format!("Commission: {}\n", usd(r.total_commission)));
    if let Some(position) = &result.open_position {
        let side = if position.is_long() { "long" } else { "short" };
        out.push_str(&format!(
            "Open position: {} {:.6} @ {}\n",
            side,
            position.quantity(),
            usd(position.entry_price)
        ));
    }

    out.push_str("\n=== Buy & Hold ===\n");
    out.push_str(&format!(
        "Hold profit: {} ({:.2}%)\n",
        usd(r.hold_profit_usd),
        r.hold_profit_pct
    ));
    out.push_str(&format!("Initial cost: {}\n", usd(result.first_close)));
    out.push_str(&format!("Final cost: {}\n", usd(result.last_close)));
    out.push_str(&format!(
        "Beats hold: {}\n",
        if r.beats_hold() { "yes" } else { "no" }
    ));

    out
}

/// Ranked sweep table, best final balance first.
pub fn format_leaderboard(results: &SweepResults, top: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>4}  {:>10}  {:>7}  {:<15} {:<15} {:<10} {:>16} {:>9} {:>7} {:>8}\n",
        "rank",
        "commission",
        "sizing",
        "entry",
        "exit",
        "direction",
        "final balance",
        "profit%",
        "trades",
        "win%"
    ));
    for (rank, result) in results.top_n(top).into_iter().enumerate() {
        let engine = &result.engine;
        let r = &result.report;
        out.push_str(&format!(
            "{:>4}  {:>10.4}  {:>7.2}  {:<15} {:<15} {:<10} {:>16} {:>9.2} {:>7} {:>8.2}\n",
            rank + 1,
            engine.commission_rate,
            engine.position_sizing,
            label(&engine.entry_timing),
            label(&engine.exit_timing),
            label(&engine.direction_mode),
            usd(r.final_balance),
            r.strategy_profit_pct,
            r.trades,
            r.win_rate
        ));
    }
    out
}

/// The snake_case name an enum serializes to.
fn label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

/// `$12,345.67`, with a leading minus for losses.
fn usd(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}
