//! Mutable engine state and the two transitions of the Flat/Open machine.

use log::debug;

use crate::domain::{
    Account, Bar, Fill, FillKind, FillPoint, Position, PositionSide, TradeRecord,
};

use super::config::{DirectionMode, EngineConfig, EntryTiming};

/// Why an entry signal did not turn into a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Short signal while trading long-only.
    ShortNotAllowed,
    /// Balance is zero or negative.
    NoBalance,
    /// Entry price is not a positive finite number.
    BadPrice,
    /// Computed size is zero or not finite.
    ZeroSize,
    /// Entry commission would consume the whole balance.
    InsufficientBalance,
}

/// Outcome of an entry attempt on a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    NoSignal,
    Opened,
    Skipped(SkipReason),
}

/// State that evolves bar-by-bar during one run. Owned by exactly one run.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub account: Account,
    pub position: Option<Position>,
    pub trades: Vec<TradeRecord>,
    pub fills: Vec<Fill>,
    pub skipped_entries: usize,
}

impl EngineState {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            account: Account::new(initial_balance),
            position: None,
            trades: Vec::new(),
            fills: Vec::new(),
            skipped_entries: 0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Flat → Open, if bar `index`'s entry rule fires and the account can pay.
    ///
    /// An `index` with no bar (or no previous bar under `NextBarOpen`) reads
    /// as no signal.
    pub(crate) fn try_enter(&mut self, bars: &[Bar], index: usize, config: &EngineConfig) -> EntryOutcome {
        if self.position.is_some() {
            return EntryOutcome::NoSignal;
        }

        let signal_bar = match config.entry_timing {
            EntryTiming::SameBarOpen | EntryTiming::SameBarClose => Some(index),
            EntryTiming::NextBarOpen => index.checked_sub(1),
        };
        let Some(bar) = bars.get(index) else {
            return EntryOutcome::NoSignal;
        };
        let Some(signal_bar) = signal_bar else {
            return EntryOutcome::NoSignal;
        };
        let Some(side) = bars.get(signal_bar).and_then(Bar::signal_side) else {
            return EntryOutcome::NoSignal;
        };

        let (price, point) = match config.entry_timing {
            EntryTiming::SameBarOpen | EntryTiming::NextBarOpen => (bar.open, FillPoint::Open),
            EntryTiming::SameBarClose => (bar.close, FillPoint::Close),
        };

        match self.size_entry(side, price, config) {
            Ok((quantity, commission)) => {
                self.account.pay_commission(commission);
                self.fills.push(Fill {
                    bar_index: index,
                    timestamp: bar.timestamp,
                    kind: FillKind::Entry,
                    side,
                    point,
                    price,
                    quantity,
                    commission,
                });
                self.position = Some(Position {
                    side,
                    size: side.sign() * quantity,
                    entry_price: price,
                    entry_timestamp: bar.timestamp,
                    entry_bar: index,
                    signal_bar,
                    entry_fill: point,
                    entry_commission: commission,
                });
                debug!(
                    "bar {index}: open {side:?} {quantity:.8} @ {price} (commission {commission:.8}, balance {:.8})",
                    self.account.balance
                );
                EntryOutcome::Opened
            }
            Err(reason) => {
                self.skipped_entries += 1;
                debug!("bar {index}: {side:?} entry skipped ({reason:?})");
                EntryOutcome::Skipped(reason)
            }
        }
    }

    /// Quantity and commission for a new position, or why none can be opened.
    fn size_entry(
        &self,
        side: PositionSide,
        price: f64,
        config: &EngineConfig,
    ) -> Result<(f64, f64), SkipReason> {
        if side == PositionSide::Short && config.direction_mode == DirectionMode::LongOnly {
            return Err(SkipReason::ShortNotAllowed);
        }
        let balance = self.account.balance;
        if balance <= 0.0 {
            return Err(SkipReason::NoBalance);
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(SkipReason::BadPrice);
        }

        let notional = balance * config.position_sizing;
        let quantity = notional / price;
        if !quantity.is_finite() || quantity == 0.0 {
            return Err(SkipReason::ZeroSize);
        }

        let commission = quantity * price * config.commission_rate;
        if !self.account.can_afford(commission) {
            return Err(SkipReason::InsufficientBalance);
        }
        Ok((quantity, commission))
    }

    /// Open → Flat at bar `index`'s close. Returns the appended trade, if a
    /// position was open. An out-of-range `index` leaves the position open.
    pub(crate) fn close_at(
        &mut self,
        bars: &[Bar],
        index: usize,
        commission_rate: f64,
    ) -> Option<&TradeRecord> {
        let bar = bars.get(index)?;
        let position = self.position.take()?;
        let exit_price = bar.close;
        let quantity = position.quantity();

        let gross_pnl = position.unrealized_pnl(exit_price);
        let exit_commission = quantity * exit_price * commission_rate;
        self.account.settle(gross_pnl, exit_commission);

        self.fills.push(Fill {
            bar_index: index,
            timestamp: bar.timestamp,
            kind: FillKind::Exit,
            side: position.side,
            point: FillPoint::Close,
            price: exit_price,
            quantity,
            commission: exit_commission,
        });

        let pnl = gross_pnl - position.entry_commission - exit_commission;
        let is_win = pnl > 0.0;

        debug!(
            "bar {index}: close {:?} @ {exit_price} (gross {gross_pnl:.8}, net {pnl:.8}, balance {:.8})",
            position.side, self.account.balance
        );

        self.trades.push(TradeRecord {
            side: position.side,
            entry_bar: position.entry_bar,
            entry_timestamp: position.entry_timestamp,
            entry_price: position.entry_price,
            exit_bar: index,
            exit_timestamp: bar.timestamp,
            exit_price,
            size: position.size,
            gross_pnl,
            entry_commission: position.entry_commission,
            exit_commission,
            commission_paid: position.entry_commission + exit_commission,
            pnl,
            is_win,
            bars_held: index - position.entry_bar,
        });
        self.trades.last()
    }
}
