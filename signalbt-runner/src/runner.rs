//! Single backtest runner: bars + RunConfig → BacktestResult.

use std::borrow::Cow;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use signalbt_core::domain::{Bar, Fill, Position, TradeRecord};
use signalbt_core::engine::{run_backtest, BacktestError, EngineConfig};
use signalbt_core::metrics::Report;
use thiserror::Error;

use crate::config::{RunConfig, RunConfigError, RunId};
use crate::data_loader::{load_bars_csv, window_bars, LoadError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] RunConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("backtest rejected: {0}")]
    Backtest(#[from] BacktestError),
}

/// Current schema version for BacktestResult serialization.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol: String,
    pub timeframe: Option<String>,
    /// Timestamp of the first simulated bar.
    pub start: DateTime<Utc>,
    /// Timestamp of the last simulated bar.
    pub end: DateTime<Utc>,
    pub bar_count: usize,
    pub first_close: f64,
    pub last_close: f64,
    pub engine: EngineConfig,
    pub report: Report,
    pub trades: Vec<TradeRecord>,
    pub fills: Vec<Fill>,
    pub balance_curve: Vec<f64>,
    pub open_position: Option<Position>,
    #[serde(default)]
    pub skipped_entries: usize,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn final_balance(&self) -> f64 {
        self.report.final_balance
    }
}

/// Load a bar file and run one backtest over it.
pub fn run_single_backtest(config: &RunConfig, bars_path: &Path) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let bars = load_bars_csv(bars_path)?;
    run_backtest_from_bars(config, &bars)
}

/// Run one backtest over bars already in memory, applying the config window.
pub fn run_backtest_from_bars(config: &RunConfig, bars: &[Bar]) -> Result<BacktestResult, RunError> {
    config.validate()?;

    let bars: Cow<'_, [Bar]> = if config.has_window() {
        Cow::Owned(window_bars(bars, config.start, config.end))
    } else {
        Cow::Borrowed(bars)
    };

    let result = run_backtest(&bars, &config.engine)?;

    // run_backtest rejects empty input, so both ends exist here.
    let (first, last) = match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(BacktestError::Bars(signalbt_core::BarError::Empty).into()),
    };

    let run_id = config.run_id();
    info!(
        "run {} on {}: {} bars, final balance {:.2}",
        &run_id[..12],
        config.symbol,
        bars.len(),
        result.report.final_balance
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        symbol: config.symbol.clone(),
        timeframe: config.timeframe.clone(),
        start: first.timestamp,
        end: last.timestamp,
        bar_count: bars.len(),
        first_close: first.close,
        last_close: last.close,
        engine: config.engine.clone(),
        report: result.report,
        trades: result.trades,
        fills: result.fills,
        balance_curve: result.balance_curve,
        open_position: result.open_position,
        skipped_entries: result.skipped_entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use signalbt_core::engine::{DirectionMode, EntryTiming, ExitTiming};
    use signalbt_core::BarError;

    fn bars(rows: &[(f64, f64, i8)]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, &(open, close, signal))| Bar {
                timestamp: start + Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1_000.0,
                signal,
            })
            .collect()
    }

    fn config() -> RunConfig {
        RunConfig::new(
            "TEST",
            EngineConfig::new(
                10_000.0,
                0.001,
                1.0,
                DirectionMode::LongOnly,
                EntryTiming::SameBarOpen,
                ExitTiming::SameBarClose,
            ),
        )
    }

    #[test]
    fn result_carries_run_metadata() {
        let data = bars(&[(99.0, 100.0, 0), (100.0, 101.0, 1), (101.0, 102.0, 0)]);
        let result = run_backtest_from_bars(&config(), &data).unwrap();

        assert_eq!(result.schema_version, SCHEMA_VERSION);
        assert_eq!(result.run_id, config().run_id());
        assert_eq!(result.bar_count, 3);
        assert_eq!(result.start, data[0].timestamp);
        assert_eq!(result.end, data[2].timestamp);
        assert_eq!(result.first_close, 100.0);
        assert_eq!(result.last_close, 102.0);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.balance_curve.len(), 3);
    }

    #[test]
    fn window_restricts_simulated_bars() {
        let data = bars(&[
            (99.0, 100.0, 0),
            (100.0, 101.0, 1),
            (101.0, 102.0, 0),
            (102.0, 103.0, 1),
        ]);
        let mut cfg = config();
        cfg.start = NaiveDate::from_ymd_opt(2024, 1, 3);
        let result = run_backtest_from_bars(&cfg, &data).unwrap();

        assert_eq!(result.bar_count, 2);
        assert_eq!(result.first_close, 102.0);
        // Only bar 3's signal is inside the window and tradable.
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].entry_price, 102.0);
    }

    #[test]
    fn empty_window_is_rejected() {
        let data = bars(&[(99.0, 100.0, 0), (100.0, 101.0, 1)]);
        let mut cfg = config();
        cfg.start = NaiveDate::from_ymd_opt(2030, 1, 1);
        let err = run_backtest_from_bars(&cfg, &data).unwrap_err();
        assert!(matches!(
            err,
            RunError::Backtest(BacktestError::Bars(BarError::Empty))
        ));
    }

    #[test]
    fn invalid_config_fails_before_simulation() {
        let data = bars(&[(99.0, 100.0, 0)]);
        let mut cfg = config();
        cfg.engine.commission_rate = -0.1;
        assert!(matches!(
            run_backtest_from_bars(&cfg, &data),
            Err(RunError::Config(RunConfigError::Engine(_)))
        ));
    }

    #[test]
    fn result_json_roundtrip() {
        let data = bars(&[(99.0, 100.0, 0), (100.0, 101.0, 1), (101.0, 102.0, 0)]);
        let result = run_backtest_from_bars(&config(), &data).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: BacktestResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.run_id, result.run_id);
        assert_eq!(back.report, result.report);
        assert_eq!(back.trades, result.trades);
    }
}
