//! signalbt runner: configuration, data loading, orchestration, export.
//!
//! This crate builds on `signalbt-core` to provide:
//! - TOML run configuration with deterministic run ids
//! - CSV bar loading, date windowing, and synthetic bar generation
//! - Single-backtest runner producing a serializable `BacktestResult`
//! - Parameter sweeps (serial or rayon-parallel)
//! - Artifact export (result JSON, trade ledger CSV, text summary)

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sweep;

pub use config::{RunConfig, RunConfigError, RunId};
pub use data_loader::{
    generate_synthetic_bars, load_bars_csv, read_bars, window_bars, write_bars_csv, LoadError,
};
pub use export::{format_leaderboard, format_summary, save_artifacts};
pub use runner::{run_backtest_from_bars, run_single_backtest, BacktestResult, RunError};
pub use sweep::{ParamGrid, ParamSweep, SweepResults};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
        assert_send::<ParamSweep>();
        assert_sync::<ParamSweep>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }
}
