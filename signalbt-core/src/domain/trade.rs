//! TradeRecord: a completed round-trip trade.

use super::position::PositionSide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A complete round-trip trade record: entry → exit.
///
/// Appended to the ledger when a position closes and never touched again.
/// `pnl` is net of both the entry and the exit commission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub side: PositionSide,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_timestamp: DateTime<Utc>,
    pub exit_price: f64,

    // ── Size ──
    /// Signed quantity (negative for shorts).
    pub size: f64,

    // ── PnL ──
    pub gross_pnl: f64,
    pub entry_commission: f64,
    pub exit_commission: f64,
    pub commission_paid: f64,
    pub pnl: f64,
    pub is_win: bool,

    pub bars_held: usize,
}

impl TradeRecord {
    /// Net return on the trade as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        let notional = self.entry_price * self.size.abs();
        if notional == 0.0 {
            return 0.0;
        }
        self.pnl / notional
    }

    pub fn is_winner(&self) -> bool {
        self.is_win
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_trade() -> TradeRecord {
        TradeRecord {
            side: PositionSide::Long,
            entry_bar: 4,
            entry_timestamp: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
            entry_price: 100.0,
            exit_bar: 8,
            exit_timestamp: Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap(),
            exit_price: 110.0,
            size: 50.0,
            gross_pnl: 500.0,
            entry_commission: 5.0,
            exit_commission: 5.5,
            commission_paid: 10.5,
            pnl: 489.5,
            is_win: true,
            bars_held: 4,
        }
    }

    #[test]
    fn return_pct_calculation() {
        let trade = sample_trade();
        let expected = 489.5 / (100.0 * 50.0);
        assert!((trade.return_pct() - expected).abs() < 1e-12);
    }

    #[test]
    fn return_pct_of_short_uses_absolute_size() {
        let mut trade = sample_trade();
        trade.side = PositionSide::Short;
        trade.size = -50.0;
        assert!(trade.return_pct() > 0.0);
    }

    #[test]
    fn is_winner() {
        assert!(sample_trade().is_winner());
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
