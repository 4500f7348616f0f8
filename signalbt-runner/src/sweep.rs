//! Parameter sweeps over engine settings for a fixed bar series.

use std::collections::HashMap;

use log::info;
use rayon::prelude::*;
use signalbt_core::domain::Bar;
use signalbt_core::engine::{DirectionMode, EntryTiming, ExitTiming};

use crate::config::RunConfig;
use crate::runner::{run_backtest_from_bars, BacktestResult, RunError};

/// Parameter grid specification.
///
/// Every axis is crossed with every other; an axis left at a single value
/// keeps the base config's setting fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub commission_rates: Vec<f64>,
    pub position_sizings: Vec<f64>,
    pub entry_timings: Vec<EntryTiming>,
    pub exit_timings: Vec<ExitTiming>,
    pub direction_modes: Vec<DirectionMode>,
}

impl ParamGrid {
    /// A one-point grid that reproduces `base` exactly.
    pub fn from_base(base: &RunConfig) -> Self {
        let engine = &base.engine;
        Self {
            commission_rates: vec![engine.commission_rate],
            position_sizings: vec![engine.position_sizing],
            entry_timings: vec![engine.entry_timing],
            exit_timings: vec![engine.exit_timing],
            direction_modes: vec![engine.direction_mode],
        }
    }

    /// Every entry/exit timing combination at the base config's other settings.
    pub fn all_timings(base: &RunConfig) -> Self {
        Self {
            entry_timings: vec![
                EntryTiming::SameBarOpen,
                EntryTiming::SameBarClose,
                EntryTiming::NextBarOpen,
            ],
            exit_timings: vec![ExitTiming::SameBarClose, ExitTiming::OnNextSignal],
            ..Self::from_base(base)
        }
    }

    /// Returns the total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.commission_rates.len()
            * self.position_sizings.len()
            * self.entry_timings.len()
            * self.exit_timings.len()
            * self.direction_modes.len()
    }

    /// Generates all configurations in the grid, in a fixed order.
    pub fn generate_configs(&self, base: &RunConfig) -> Vec<RunConfig> {
        let mut configs = Vec::with_capacity(self.size());

        for &rate in &self.commission_rates {
            for &sizing in &self.position_sizings {
                for &entry in &self.entry_timings {
                    for &exit in &self.exit_timings {
                        for &direction in &self.direction_modes {
                            let mut config = base.clone();
                            config.engine.commission_rate = rate;
                            config.engine.position_sizing = sizing;
                            config.engine.entry_timing = entry;
                            config.engine.exit_timing = exit;
                            config.engine.direction_mode = direction;
                            configs.push(config);
                        }
                    }
                }
            }
        }

        configs
    }
}

/// Parameter sweep executor.
///
/// Runs backtests for all configurations in a grid, optionally in parallel.
/// Results come back in grid order either way.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Executes a sweep over `grid`, every run sharing the same `bars`.
    ///
    /// Every generated config is validated before any backtest starts, so a
    /// bad grid value fails fast instead of after partial work.
    pub fn sweep(
        &self,
        grid: &ParamGrid,
        base: &RunConfig,
        bars: &[Bar],
    ) -> Result<SweepResults, RunError> {
        let configs = grid.generate_configs(base);
        for config in &configs {
            config.validate()?;
        }
        info!(
            "sweeping {} configs over {} bars ({})",
            configs.len(),
            bars.len(),
            if self.parallel { "parallel" } else { "serial" }
        );

        let results: Vec<BacktestResult> = if self.parallel {
            configs
                .par_iter()
                .map(|config| run_backtest_from_bars(config, bars))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            configs
                .iter()
                .map(|config| run_backtest_from_bars(config, bars))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(SweepResults::new(results))
    }
}

/// Results from a parameter sweep.
#[derive(Debug)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(results: Vec<BacktestResult>) -> Self {
        let by_run_id = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();

        Self {
            results,
            by_run_id,
        }
    }

    /// Returns all results in grid order.
    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Gets a result by RunId.
    pub fn get(&self, run_id: &str) -> Option<&BacktestResult> {
        self.by_run_id.get(run_id).map(|&i| &self.results[i])
    }

    /// Returns results sorted by final balance (descending). Ties keep grid order.
    pub fn sorted_by_final_balance(&self) -> Vec<&BacktestResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| {
            b.final_balance()
                .partial_cmp(&a.final_balance())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    /// Returns the top N results by final balance.
    pub fn top_n(&self, n: usize) -> Vec<&BacktestResult> {
        self.sorted_by_final_balance().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&BacktestResult> {
        self.sorted_by_final_balance().into_iter().next()
    }
}
