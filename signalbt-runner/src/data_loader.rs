//! Bar loading: CSV parsing, date windowing, and synthetic fallback data.
//!
//! Bar files are plain CSV with a header row:
//! `timestamp,open,high,low,close,volume,signal`. Structural validation
//! (positive prices, monotonic timestamps, signal range) is left to the
//! engine; this module only turns text into [`Bar`] values.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use signalbt_core::domain::Bar;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("open bar file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed bar CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: unrecognized timestamp '{value}'")]
    Timestamp { line: usize, value: String },
    #[error("line {line}: signal {value} is not an integer")]
    Signal { line: usize, value: f64 },
}

#[derive(Debug, Deserialize, Serialize)]
struct BarRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    signal: f64,
}

/// Load a bar file from disk.
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_bars(file)?;
    info!("loaded {} bars from {}", bars.len(), path.display());
    Ok(bars)
}

/// Parse bars from any CSV source. Row order is preserved.
pub fn read_bars<R: Read>(source: R) -> Result<Vec<Bar>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut bars = Vec::new();
    for (i, row) in reader.deserialize::<BarRow>().enumerate() {
        let row = row?;
        // header is line 1
        let line = i + 2;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
            line,
            value: row.timestamp.clone(),
        })?;
        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            signal: parse_signal(row.signal, line)?,
        });
    }
    Ok(bars)
}

/// Signals arrive as floats when the producer wrote e.g. `1.0`; anything
/// integral is narrowed, out-of-range integers are caught by bar validation.
fn parse_signal(value: f64, line: usize) -> Result<i8, LoadError> {
    if value.fract() != 0.0 || value < f64::from(i8::MIN) || value > f64::from(i8::MAX) {
        return Err(LoadError::Signal { line, value });
    }
    Ok(value as i8)
}

/// Accepts epoch milliseconds, RFC 3339, `YYYY-MM-DD HH:MM:SS` and
/// `YYYY-MM-DD`. Naive forms are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(millis) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Keep bars whose UTC calendar day falls in `[start, end]`. Either bound may
/// be open.
pub fn window_bars(bars: &[Bar], start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<Bar> {
    let windowed: Vec<Bar> = bars
        .iter()
        .filter(|bar| {
            let day = bar.timestamp.date_naive();
            start.map_or(true, |s| day >= s) && end.map_or(true, |e| day <= e)
        })
        .cloned()
        .collect();

    if windowed.is_empty() && !bars.is_empty() {
        warn!(
            "window {:?}..={:?} leaves no bars out of {} loaded",
            start,
            end,
            bars.len()
        );
    }
    windowed
}

/// Write bars in the same CSV layout [`load_bars_csv`] reads.
pub fn write_bars_csv(path: &Path, bars: &[Bar]) -> Result<(), LoadError> {
    let file = File::create(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);
    for bar in bars {
        writer.serialize(BarRow {
            timestamp: bar.timestamp.to_rfc3339(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            signal: f64::from(bar.signal),
        })?;
    }
    writer.flush().map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Generate a random-walk bar series with a sprinkled signal column.
///
/// Deterministic: with no explicit seed the RNG is seeded from the symbol
/// name, so the same symbol always yields the same series.
pub fn generate_synthetic_bars(
    symbol: &str,
    count: usize,
    start: DateTime<Utc>,
    step: Duration,
    seed: Option<u64>,
) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_seed(*blake3::hash(symbol.as_bytes()).as_bytes()),
    };

    let mut bars = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    let mut timestamp = start;

    for _ in 0..count {
        let gap: f64 = rng.gen_range(-0.005..0.005);
        let open = price * (1.0 + gap);
        let close = open * (1.0 + rng.gen_range(-0.03..0.03));
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000.0..5_000_000.0);
        let roll: f64 = rng.gen();
        let signal = if roll < 0.10 {
            1
        } else if roll < 0.15 {
            -1
        } else {
            0
        };

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            signal,
        });

        price = close;
        timestamp += step;
    }

    bars
}
