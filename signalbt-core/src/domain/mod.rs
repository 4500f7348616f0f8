//! Domain types for signalbt

pub mod account;
pub mod bar;
pub mod fill;
pub mod position;
pub mod trade;

pub use account::Account;
pub use bar::{validate_bars, Bar, BarError};
pub use fill::{Fill, FillKind, FillPoint};
pub use position::{Position, PositionSide};
pub use trade::TradeRecord;
