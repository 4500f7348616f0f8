//! Serializable run configuration.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use signalbt_core::engine::{ConfigError, EngineConfig};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Everything needed to reproduce a single backtest run over a bar file.
///
/// Loaded from TOML. The `[engine]` table maps one-to-one onto
/// [`EngineConfig`] and has no defaults: every key must be present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Instrument label, e.g. "ETH/USDT". Informational only.
    pub symbol: String,

    /// Bar timeframe label, e.g. "1d". Informational only.
    #[serde(default)]
    pub timeframe: Option<String>,

    /// First calendar day (UTC) of the backtest window, inclusive.
    #[serde(default)]
    pub start: Option<NaiveDate>,

    /// Last calendar day (UTC) of the backtest window, inclusive.
    #[serde(default)]
    pub end: Option<NaiveDate>,

    pub engine: EngineConfig,
}

impl RunConfig {
    pub fn new(symbol: impl Into<String>, engine: EngineConfig) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: None,
            start: None,
            end: None,
            engine,
        }
    }

    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RunConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, RunConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, RunConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject bad engine parameters and inverted windows.
    pub fn validate(&self) -> Result<(), RunConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(RunConfigError::EmptySymbol);
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(RunConfigError::InvertedWindow { start, end });
            }
        }
        self.engine.validate()?;
        Ok(())
    }

    pub fn has_window(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs get the same RunId.
    pub fn run_id(&self) -> RunId {
        let bytes = serde_json::to_vec(self).unwrap_or_else(|_| format!("{self:?}").into_bytes());
        blake3::hash(&bytes).to_hex().to_string()
    }
}

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("symbol must not be empty")]
    EmptySymbol,
    #[error("window start {start} is after end {end}")]
    InvertedWindow { start: NaiveDate, end: NaiveDate },
    #[error(transparent)]
    Engine(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalbt_core::engine::{DirectionMode, EntryTiming, ExitTiming};

    const SAMPLE: &str = r#"
symbol = "ETH/USDT"
timeframe = "1d"
start = "2020-01-01"
end = "2026-12-31"

[engine]
initial_balance = 10000.0
commission_rate = 0.001
position_sizing = 1.0
direction_mode = "long_only"
entry_timing = "same_bar_open"
exit_timing = "same_bar_close"
liquidate_at_end = false
"#;

    fn sample() -> RunConfig {
        RunConfig::from_toml(SAMPLE).unwrap()
    }

    #[test]
    fn parses_sample_toml() {
        let config = sample();
        assert_eq!(config.symbol, "ETH/USDT");
        assert_eq!(config.timeframe.as_deref(), Some("1d"));
        assert_eq!(config.start, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(config.engine.direction_mode, DirectionMode::LongOnly);
        assert_eq!(config.engine.entry_timing, EntryTiming::SameBarOpen);
        assert_eq!(config.engine.exit_timing, ExitTiming::SameBarClose);
        assert!(config.has_window());
    }

    #[test]
    fn missing_engine_key_is_an_error() {
        let without_sizing = SAMPLE.replace("position_sizing = 1.0\n", "");
        assert!(matches!(
            RunConfig::from_toml(&without_sizing),
            Err(RunConfigError::Parse(_))
        ));
    }

    #[test]
    fn invalid_engine_values_are_rejected() {
        let bad = SAMPLE.replace("position_sizing = 1.0", "position_sizing = 1.5");
        assert!(matches!(
            RunConfig::from_toml(&bad),
            Err(RunConfigError::Engine(ConfigError::PositionSizing(_)))
        ));
    }

    #[test]
    fn unknown_timing_is_rejected() {
        let bad = SAMPLE.replace("same_bar_open", "intrabar");
        assert!(RunConfig::from_toml(&bad).is_err());
    }

    #[test]
    fn inverted_window_is_rejected() {
        let bad = SAMPLE.replace("end = \"2026-12-31\"", "end = \"2019-12-31\"");
        assert!(matches!(
            RunConfig::from_toml(&bad),
            Err(RunConfigError::InvertedWindow { .. })
        ));
    }

    #[test]
    fn test_run_id_deterministic() {
        let config = sample();
        let id1 = config.run_id();
        let id2 = config.run_id();
        assert_eq!(id1, id2, "RunId should be deterministic");
        assert_eq!(id1.len(), 64);
    }

    #[test]
    fn test_run_id_changes_with_params() {
        let config1 = sample();
        let mut config2 = config1.clone();
        config2.engine.commission_rate = 0.0005;
        assert_ne!(config1.run_id(), config2.run_id());
    }

    #[test]
    fn toml_roundtrip() {
        let config = sample();
        let text = config.to_toml().unwrap();
        let back = RunConfig::from_toml(&text).unwrap();
        assert_eq!(config, back);
    }
}
