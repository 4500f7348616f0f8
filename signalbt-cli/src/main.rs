//! signalbt CLI: run, sweep, and synthetic-data commands.
//!
//! Commands:
//! - `run`: backtest one bar file with one TOML config
//! - `sweep`: backtest one bar file across a grid of engine settings
//! - `synthetic`: write a deterministic random-walk bar file with signals

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use log::info;
use signalbt_core::engine::{DirectionMode, EntryTiming, ExitTiming};
use signalbt_runner::data_loader::{generate_synthetic_bars, load_bars_csv, write_bars_csv};
use signalbt_runner::export::{format_leaderboard, format_summary, save_artifacts};
use signalbt_runner::runner::run_single_backtest;
use signalbt_runner::sweep::{ParamGrid, ParamSweep};
use signalbt_runner::RunConfig;

#[derive(Parser)]
#[command(
    name = "signalbt",
    about = "signalbt: backtest pre-computed trading signals over OHLCV bars"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single backtest and print the summary.
    Run {
        /// Bar CSV: timestamp,open,high,low,close,volume,signal.
        #[arg(long)]
        bars: PathBuf,

        /// Path to a TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// Write result.json, trades.csv and summary.txt here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Sweep engine settings over one bar file and print a leaderboard.
    Sweep {
        #[arg(long)]
        bars: PathBuf,

        /// Base TOML run config; grid axes override its engine settings.
        #[arg(long)]
        config: PathBuf,

        /// Commission rates to test, comma separated (e.g. 0,0.001,0.002).
        #[arg(long, value_delimiter = ',', required = true)]
        commission_rates: Vec<f64>,

        /// Position sizings to test, comma separated (e.g. 0.25,0.5,1).
        #[arg(long, value_delimiter = ',', required = true)]
        sizings: Vec<f64>,

        /// Entry timings: same_bar_open, same_bar_close, next_bar_open. Defaults to the config's.
        #[arg(long, value_delimiter = ',')]
        entry_timings: Vec<EntryTiming>,

        /// Exit timings: same_bar_close, on_next_signal. Defaults to the config's.
        #[arg(long, value_delimiter = ',')]
        exit_timings: Vec<ExitTiming>,

        /// Direction modes: long_only, long_short. Defaults to the config's.
        #[arg(long, value_delimiter = ',')]
        direction_modes: Vec<DirectionMode>,

        /// Run on the current thread only.
        #[arg(long, default_value_t = false)]
        serial: bool,

        /// Number of leaderboard rows to print.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Write a synthetic bar file for demos and smoke tests.
    Synthetic {
        /// Symbol name; also seeds the generator when --seed is absent.
        #[arg(long)]
        symbol: String,

        /// Number of bars to generate.
        #[arg(long)]
        bars: usize,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,

        #[arg(long)]
        seed: Option<u64>,

        /// First bar date (YYYY-MM-DD).
        #[arg(long, default_value = "2020-01-01")]
        start: String,

        /// Hours between bars.
        #[arg(long, default_value_t = 24)]
        step_hours: i64,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            bars,
            config,
            output_dir,
        } => run_cmd(bars, config, output_dir),
        Commands::Sweep {
            bars,
            config,
            commission_rates,
            sizings,
            entry_timings,
            exit_timings,
            direction_modes,
            serial,
            top,
        } => {
            let base = RunConfig::from_file(&config)
                .with_context(|| format!("Failed to load config {}", config.display()))?;
            let defaults = ParamGrid::from_base(&base);
            let grid = ParamGrid {
                commission_rates,
                position_sizings: sizings,
                entry_timings: or_default(entry_timings, defaults.entry_timings),
                exit_timings: or_default(exit_timings, defaults.exit_timings),
                direction_modes: or_default(direction_modes, defaults.direction_modes),
            };
            sweep_cmd(bars, base, grid, serial, top)
        }
        Commands::Synthetic {
            symbol,
            bars,
            out,
            seed,
            start,
            step_hours,
        } => synthetic_cmd(&symbol, bars, out, seed, &start, step_hours),
    }
}

fn or_default<T>(given: Vec<T>, default: Vec<T>) -> Vec<T> {
    if given.is_empty() {
        default
    } else {
        given
    }
}

fn run_cmd(bars: PathBuf, config: PathBuf, output_dir: Option<PathBuf>) -> Result<()> {
    let run_config = RunConfig::from_file(&config)
        .with_context(|| format!("Failed to load config {}", config.display()))?;
    let result = run_single_backtest(&run_config, &bars)?;

    print!("{}", format_summary(&result));

    if let Some(dir) = output_dir {
        let written = save_artifacts(&dir, &result)?;
        info!("wrote {} artifacts", written.len());
        println!("\nArtifacts saved to: {}", dir.display());
    }

    Ok(())
}

fn sweep_cmd(bars: PathBuf, base: RunConfig, grid: ParamGrid, serial: bool, top: usize) -> Result<()> {
    let bar_data = load_bars_csv(&bars)?;
    let results = ParamSweep::new()
        .with_parallelism(!serial)
        .sweep(&grid, &base, &bar_data)?;

    println!(
        "{} configs over {} ({})\n",
        results.len(),
        base.symbol,
        bars.display()
    );
    print!("{}", format_leaderboard(&results, top));
    Ok(())
}

fn synthetic_cmd(
    symbol: &str,
    count: usize,
    out: PathBuf,
    seed: Option<u64>,
    start: &str,
    step_hours: i64,
) -> Result<()> {
    let start_date = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("Invalid --start date '{start}'"))?;
    let start_time = Utc.from_utc_datetime(&start_date.and_time(chrono::NaiveTime::MIN));
    anyhow::ensure!(step_hours > 0, "--step-hours must be positive");

    let bars = generate_synthetic_bars(
        symbol,
        count,
        start_time,
        chrono::Duration::hours(step_hours),
        seed,
    );
    write_bars_csv(&out, &bars)?;
    println!("Wrote {} synthetic bars to {}", bars.len(), out.display());
    Ok(())
}
