//! Account: the balance that funds every position, plus the commission tally.

use serde::{Deserialize, Serialize};

/// Cash-like account state.
///
/// The balance is debited by commission on every fill and moved by realized
/// P&L on every close. `total_commission` only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub balance: f64,
    pub total_commission: f64,
}

impl Account {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            balance: initial_balance,
            total_commission: 0.0,
        }
    }

    /// Whether a commission of `amount` can be paid without exhausting the balance.
    pub fn can_afford(&self, amount: f64) -> bool {
        amount < self.balance
    }

    /// Charge an entry-leg commission.
    pub fn pay_commission(&mut self, amount: f64) {
        self.balance -= amount;
        self.total_commission += amount;
    }

    /// Settle a close: credit gross P&L net of the exit-leg commission.
    pub fn settle(&mut self, gross_pnl: f64, exit_commission: f64) {
        self.balance += gross_pnl - exit_commission;
        self.total_commission += exit_commission;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_is_untouched() {
        let account = Account::new(10_000.0);
        assert_eq!(account.balance, 10_000.0);
        assert_eq!(account.total_commission, 0.0);
    }

    #[test]
    fn commission_and_settlement() {
        let mut account = Account::new(10_000.0);
        account.pay_commission(10.0);
        assert_eq!(account.balance, 9_990.0);
        account.settle(100.0, 5.0);
        assert_eq!(account.balance, 10_085.0);
        assert_eq!(account.total_commission, 15.0);
    }

    #[test]
    fn cannot_afford_commission_equal_to_balance() {
        let account = Account::new(5.0);
        assert!(!account.can_afford(5.0));
        assert!(account.can_afford(4.99));
    }
}
