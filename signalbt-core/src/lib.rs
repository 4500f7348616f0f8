//! signalbt core: domain types, bar validation, backtest engine, metrics.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, positions, fills, trades, account)
//! - Input validation for signal-annotated bar sequences
//! - The Flat/Open state machine driven bar-by-bar
//! - The metrics calculator producing the run `Report`

pub mod domain;
pub mod engine;
pub mod metrics;

pub use domain::{Bar, BarError, PositionSide, TradeRecord};
pub use engine::{
    run_backtest, BacktestError, ConfigError, DirectionMode, EngineConfig, EntryTiming,
    ExitTiming, RunResult,
};
pub use metrics::Report;
