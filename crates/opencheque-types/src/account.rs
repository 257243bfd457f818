//! Balance-holding accounts.
//!
//! Accounts are created at registration time (outside the core) and their
//! balances are mutated only by settlement. The non-negative balance
//! invariant is enforced at settlement time, not here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AccountId;

/// A balance-holding account, keyed by its unique username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier.
    pub id: AccountId,
    /// Unique login name; cheques reference accounts by username.
    pub username: String,
    /// Verified legal name; snapshotted onto cheques at issuance.
    pub realname: String,
    /// Current balance in the ledger currency.
    pub balance: Decimal,
}

impl Account {
    /// Create a new account with an opening balance.
    #[must_use]
    pub fn new(username: impl Into<String>, realname: impl Into<String>, balance: Decimal) -> Self {
        Self {
            id: AccountId::new(),
            username: username.into(),
            realname: realname.into(),
            balance,
        }
    }

    /// Whether the current balance covers `amount`.
    #[must_use]
    pub fn can_cover(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_fields() {
        let acct = Account::new("alice", "Alice Ahlgren", Decimal::new(5000, 0));
        assert_eq!(acct.username, "alice");
        assert_eq!(acct.realname, "Alice Ahlgren");
        assert_eq!(acct.balance, Decimal::new(5000, 0));
    }

    #[test]
    fn can_cover_boundary() {
        let acct = Account::new("bob", "Bob Brandt", Decimal::new(100, 0));
        assert!(acct.can_cover(Decimal::new(100, 0)));
        assert!(acct.can_cover(Decimal::new(99, 0)));
        assert!(!acct.can_cover(Decimal::new(101, 0)));
    }

    #[test]
    fn serde_roundtrip() {
        let acct = Account::new("carol", "Carol Chen", Decimal::new(250, 2));
        let json = serde_json::to_string(&acct).unwrap();
        let back: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(acct, back);
    }
}
