use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fill::FillPoint;

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// +1.0 for long, -1.0 for short.
    pub fn sign(self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }
}

/// The single open position held by the engine.
///
/// `size` is signed (negative for shorts) so one P&L formula covers both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub size: f64,
    pub entry_price: f64,
    pub entry_timestamp: DateTime<Utc>,
    pub entry_bar: usize,
    /// Bar whose signal triggered the entry (the entry bar itself, or the one
    /// before it for next-bar-open entries).
    pub signal_bar: usize,
    pub entry_fill: FillPoint,
    pub entry_commission: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.size > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.size < 0.0
    }

    /// Absolute quantity held.
    pub fn quantity(&self) -> f64 {
        self.size.abs()
    }

    /// P&L before exit commission if closed at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size * (price - self.entry_price)
    }
}
