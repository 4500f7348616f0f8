//! Engine configuration: account funding, commission, sizing and timing policy.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which signal directions may open a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionMode {
    /// `+1` opens a long; `-1` never opens anything.
    LongOnly,
    /// `+1` opens a long, `-1` opens a short.
    LongShort,
}

/// Which price fills an entry once a signal is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryTiming {
    /// Signal on bar `t`, fill at bar `t`'s open.
    SameBarOpen,
    /// Signal on bar `t`, fill at bar `t`'s close.
    SameBarClose,
    /// Signal on bar `t - 1`, fill at bar `t`'s open.
    NextBarOpen,
}

/// When an open position is closed. Exits always fill at a bar's close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitTiming {
    /// Single-bar holding period: close at the first bar close after the entry fill.
    SameBarClose,
    /// Hold until a newer non-zero signal appears on the previous bar, then
    /// close at the current bar's close before evaluating a new entry.
    OnNextSignal,
}

/// Configuration for a single backtest run.
///
/// Every field is explicit. Call [`EngineConfig::validate`] (the engine does)
/// before simulating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_balance: f64,
    /// Fraction of notional charged on every fill, entry and exit separately.
    pub commission_rate: f64,
    /// Fraction of the current balance committed to a new position, in (0, 1].
    pub position_sizing: f64,
    pub direction_mode: DirectionMode,
    pub entry_timing: EntryTiming,
    pub exit_timing: ExitTiming,
    /// Close a position still open after the last bar at that bar's close.
    pub liquidate_at_end: bool,
}

impl EngineConfig {
    pub fn new(
        initial_balance: f64,
        commission_rate: f64,
        position_sizing: f64,
        direction_mode: DirectionMode,
        entry_timing: EntryTiming,
        exit_timing: ExitTiming,
    ) -> Self {
        Self {
            initial_balance,
            commission_rate,
            position_sizing,
            direction_mode,
            entry_timing,
            exit_timing,
            liquidate_at_end: false,
        }
    }

    pub fn with_liquidate_at_end(mut self, liquidate: bool) -> Self {
        self.liquidate_at_end = liquidate;
        self
    }

    /// Reject contract violations before any bar is processed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_balance.is_finite() || self.initial_balance <= 0.0 {
            return Err(ConfigError::InitialBalance(self.initial_balance));
        }
        if !self.commission_rate.is_finite() || self.commission_rate < 0.0 {
            return Err(ConfigError::CommissionRate(self.commission_rate));
        }
        if !self.position_sizing.is_finite()
            || self.position_sizing <= 0.0
            || self.position_sizing > 1.0
        {
            return Err(ConfigError::PositionSizing(self.position_sizing));
        }
        Ok(())
    }
}

/// Parses the same snake_case names the enums serialize to.
macro_rules! impl_from_str {
    ($ty:ty, $kind:literal, { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($name => Ok($variant),)+
                    other => Err(ConfigError::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

impl_from_str!(DirectionMode, "direction_mode", {
    "long_only" => DirectionMode::LongOnly,
    "long_short" => DirectionMode::LongShort,
});

impl_from_str!(EntryTiming, "entry_timing", {
    "same_bar_open" => EntryTiming::SameBarOpen,
    "same_bar_close" => EntryTiming::SameBarClose,
    "next_bar_open" => EntryTiming::NextBarOpen,
});

impl_from_str!(ExitTiming, "exit_timing", {
    "same_bar_close" => ExitTiming::SameBarClose,
    "on_next_signal" => ExitTiming::OnNextSignal,
});

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("initial_balance must be positive and finite, got {0}")]
    InitialBalance(f64),
    #[error("commission_rate must be non-negative and finite, got {0}")]
    CommissionRate(f64),
    #[error("position_sizing must be in (0, 1], got {0}")]
    PositionSizing(f64),
    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}
