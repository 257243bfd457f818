//! Account balance storage.
//!
//! [`AccountStore`] is the seam between the engines and wherever balances
//! actually live. The shipped implementation is in-memory; a durable
//! backend implements the same trait. `transfer` is the only compound
//! mutation and it must stay atomic: debit and credit happen under one
//! write lock, with the payer's funds re-checked inside that lock, so no
//! interleaving can observe the debit without the credit or overdraw a
//! racing payer.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rust_decimal::Decimal;

use opencheque_types::{Account, ChequeError, Result};

/// Where account balances live.
pub trait AccountStore: Send + Sync {
    /// Snapshot of the account registered under `username`.
    fn fetch(&self, username: &str) -> Result<Account>;

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns [`ChequeError::InvalidOperation`] if the username is taken.
    fn open(&self, account: Account) -> Result<()>;

    /// Move `amount` from `payer` to `payee` in one atomic step.
    ///
    /// The payer's funds are re-checked under the same lock that performs
    /// the debit. A concurrent transfer that drained the payer fails here
    /// with [`ChequeError::InsufficientFunds`] instead of overdrawing.
    fn transfer(&self, payer: &str, payee: &str, amount: Decimal) -> Result<()>;
}

/// In-memory [`AccountStore`] keyed by username.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Account>> {
        self.accounts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Account>> {
        self.accounts.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AccountStore for MemoryAccountStore {
    fn fetch(&self, username: &str) -> Result<Account> {
        self.read()
            .get(username)
            .cloned()
            .ok_or_else(|| ChequeError::AccountNotFound {
                username: username.to_string(),
            })
    }

    fn open(&self, account: Account) -> Result<()> {
        let mut accounts = self.write();
        if accounts.contains_key(&account.username) {
            return Err(ChequeError::InvalidOperation {
                reason: format!("account already exists: {}", account.username),
            });
        }
        accounts.insert(account.username.clone(), account);
        Ok(())
    }

    fn transfer(&self, payer: &str, payee: &str, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(ChequeError::InvalidOperation {
                reason: format!("transfer amount must be positive, got {amount}"),
            });
        }

        let mut accounts = self.write();

        let available = accounts
            .get(payer)
            .ok_or_else(|| ChequeError::AccountNotFound {
                username: payer.to_string(),
            })?
            .balance;
        if !accounts.contains_key(payee) {
            return Err(ChequeError::AccountNotFound {
                username: payee.to_string(),
            });
        }
        if available < amount {
            return Err(ChequeError::InsufficientFunds {
                needed: amount,
                available,
            });
        }

        // Both keys were just verified present under this same write lock.
        if let Some(account) = accounts.get_mut(payer) {
            account.balance -= amount;
        }
        if let Some(account) = accounts.get_mut(payee) {
            account.balance += amount;
        }
        Ok(())
    }
}
