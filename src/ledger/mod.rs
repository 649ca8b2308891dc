//! Ledger module
//!
//! Account balances and the withdraw/deposit operations that guard the
//! non-negative-balance invariant.

mod error;
mod postgres;
mod store;

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::{Account, AccountId, Amount, Balance, DomainError};

pub use error::{LedgerError, StoreError};
pub use postgres::PgAccountStore;
pub use store::{AccountMutation, AccountStore, InMemoryAccountStore};

/// Balance-holding service over an [`AccountStore`]
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn AccountStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Ledger backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryAccountStore::new()))
    }

    /// Withdraw `amount` from an account.
    ///
    /// Checks run in order: negative amount, zero amount, unknown account,
    /// insufficient funds. Returns the balance after the withdrawal.
    pub async fn withdraw(&self, account_id: AccountId, amount: Decimal) -> Result<Balance, LedgerError> {
        let amount = Amount::new(amount).map_err(DomainError::from)?;
        self.store
            .update(account_id, &move |account: &mut Account| account.withdraw(&amount))
            .await
    }

    /// Deposit `amount` into an account and return the new balance
    pub async fn deposit(&self, account_id: AccountId, amount: Decimal) -> Result<Balance, LedgerError> {
        let amount = Amount::new(amount).map_err(DomainError::from)?;
        self.store
            .update(account_id, &move |account: &mut Account| account.deposit(&amount))
            .await
    }

    /// Open a new account with a non-negative initial balance
    pub async fn add(&self, initial_balance: Decimal) -> Result<AccountId, LedgerError> {
        let balance = Balance::new(initial_balance).map_err(DomainError::from)?;
        let id = self.store.insert(balance).await?;
        tracing::debug!(account_id = %id, balance = %balance, "Account created");
        Ok(id)
    }

    /// Current balance of an account
    pub async fn balance(&self, account_id: AccountId) -> Result<Balance, LedgerError> {
        self.store
            .find_by_id(account_id)
            .await?
            .map(|account| account.balance())
            .ok_or(LedgerError::UnknownAccount(account_id))
    }
}
