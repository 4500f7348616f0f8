use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::position::PositionSide;

/// Which price of a bar a fill executed at. The engine never fills intrabar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillPoint {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillKind {
    Entry,
    Exit,
}

/// One commission-bearing leg of a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub bar_index: usize,
    pub timestamp: DateTime<Utc>,
    pub kind: FillKind,
    pub side: PositionSide,
    pub point: FillPoint,
    pub price: f64,
    pub quantity: f64,
    pub commission: f64,
}
