//! Account Store
//!
//! Persistence seam for accounts. Implementations must run the
//! read-check-write of [`AccountStore::update`] as one atomic unit per
//! account; operations on different accounts never wait on each other.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

use crate::domain::{Account, AccountId, Balance, DomainError};

use super::{LedgerError, StoreError};

/// Mutation applied to a locked account. Captured values must be owned.
pub type AccountMutation = dyn Fn(&mut Account) -> Result<Balance, DomainError> + Send + Sync;

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account and return its assigned ID
    async fn insert(&self, balance: Balance) -> Result<AccountId, StoreError>;

    /// Load an account by ID
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Lock the account, apply `mutation` and save the result.
    ///
    /// When the mutation fails nothing is written.
    async fn update(
        &self,
        id: AccountId,
        mutation: &AccountMutation,
    ) -> Result<Balance, LedgerError>;
}

/// Process-local store with one async mutex per account
#[derive(Debug)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Arc<Mutex<Account>>>>,
    next_id: AtomicI64,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn slot(&self, id: AccountId) -> Result<Option<Arc<Mutex<Account>>>, StoreError> {
        let accounts = self.accounts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(accounts.get(&id).cloned())
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert(&self, balance: Balance) -> Result<AccountId, StoreError> {
        let id = AccountId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut accounts = self.accounts.write().map_err(|_| StoreError::Poisoned)?;
        accounts.insert(id, Arc::new(Mutex::new(Account::new(id, balance))));
        Ok(id)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        match self.slot(id)? {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        id: AccountId,
        mutation: &AccountMutation,
    ) -> Result<Balance, LedgerError> {
        let slot = self.slot(id)?.ok_or(LedgerError::UnknownAccount(id))?;
        let mut account = slot.lock().await;

        // Work on a copy so a rejected mutation leaves the stored account alone
        let mut updated = account.clone();
        let balance = mutation(&mut updated)?;
        *account = updated;

        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Amount;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryAccountStore::new();
        let a = store.insert(Balance::zero()).await.unwrap();
        let b = store.insert(Balance::zero()).await.unwrap();

        assert_eq!(a, AccountId::new(1));
        assert_eq!(b, AccountId::new(2));
    }

    #[tokio::test]
    async fn test_find_missing_account() {
        let store = InMemoryAccountStore::new();
        assert!(store.find_by_id(AccountId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_account() {
        let store = InMemoryAccountStore::new();
        let result = store
            .update(AccountId::new(5), &|account: &mut Account| {
                account.deposit(&Amount::new(dec!(1)).unwrap())
            })
            .await;

        assert!(matches!(result, Err(LedgerError::UnknownAccount(_))));
    }

    #[tokio::test]
    async fn test_update_with_captured_amount() {
        let store = InMemoryAccountStore::new();
        let id = store.insert(Balance::new(dec!(10)).unwrap()).await.unwrap();

        let amount = Amount::new(dec!(4)).unwrap();
        let balance = store
            .update(id, &move |account: &mut Account| account.withdraw(&amount))
            .await
            .unwrap();
        assert_eq!(balance.value(), dec!(6));
    }

    #[tokio::test]
    async fn test_rejected_update_is_not_saved() {
        let store = InMemoryAccountStore::new();
        let id = store.insert(Balance::new(dec!(10)).unwrap()).await.unwrap();

        // Mutates the copy, then fails
        let result = store
            .update(id, &|account: &mut Account| -> Result<Balance, DomainError> {
                account.deposit(&Amount::new(dec!(5)).unwrap())?;
                Err(DomainError::ZeroAmount)
            })
            .await;
        assert!(result.is_err());

        let account = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(account.balance().value(), dec!(10));
    }
}
