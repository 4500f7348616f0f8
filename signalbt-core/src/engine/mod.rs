//! Backtesting engine: single forward pass over a signal-annotated bar sequence.
//!
//! The engine owns its account, position, ledger and fill tape; bars are
//! read-only. One run is strictly sequential. Independent runs (parameter
//! sweeps) each build their own state.

pub mod config;
pub mod loop_runner;
pub mod state;

pub use config::{ConfigError, DirectionMode, EngineConfig, EntryTiming, ExitTiming};
pub use loop_runner::{run_backtest, BacktestError, RunResult};
pub use state::{EngineState, EntryOutcome, SkipReason};
