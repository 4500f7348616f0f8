//! Bar: the fundamental market data unit, annotated with a trade signal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::position::PositionSide;

/// OHLCV bar for a single interval, carrying the upstream pipeline's signal.
///
/// `signal` is an integer in {-1, 0, 1}: short / none / long intent. The engine
/// reads bars but never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub signal: i8,
}

impl Bar {
    /// The side this bar's signal asks for, if any.
    pub fn signal_side(&self) -> Option<PositionSide> {
        match self.signal {
            1 => Some(PositionSide::Long),
            -1 => Some(PositionSide::Short),
            _ => None,
        }
    }

    pub fn has_signal(&self) -> bool {
        self.signal != 0
    }

    /// Check a single bar in isolation (prices, volume, signal range).
    pub fn check(&self, index: usize) -> Result<(), BarError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BarError::NonPositivePrice {
                    index,
                    field,
                    value,
                });
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(BarError::InvalidVolume {
                index,
                value: self.volume,
            });
        }
        if !(-1..=1).contains(&self.signal) {
            return Err(BarError::SignalOutOfRange {
                index,
                signal: self.signal,
            });
        }
        Ok(())
    }
}

/// Input contract violations, reported once before a simulation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar sequence is empty")]
    Empty,

    #[error("bar {index}: {field} must be a positive finite price, got {value}")]
    NonPositivePrice {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("bar {index}: volume must be non-negative and finite, got {value}")]
    InvalidVolume { index: usize, value: f64 },

    #[error("bar {index}: signal must be -1, 0 or 1, got {signal}")]
    SignalOutOfRange { index: usize, signal: i8 },

    #[error("bar {index}: timestamp {timestamp} is not after previous bar's {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },
}

/// Validate a whole bar sequence: every bar must be sane and timestamps must
/// be strictly increasing. Stops at the first violation.
pub fn validate_bars(bars: &[Bar]) -> Result<(), BarError> {
    if bars.is_empty() {
        return Err(BarError::Empty);
    }
    for (index, bar) in bars.iter().enumerate() {
        bar.check(index)?;
        if index > 0 {
            let previous = bars[index - 1].timestamp;
            if bar.timestamp <= previous {
                return Err(BarError::NonMonotonicTimestamp {
                    index,
                    timestamp: bar.timestamp,
                    previous,
                });
            }
        }
    }
    Ok(())
}
