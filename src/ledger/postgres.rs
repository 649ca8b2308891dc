//! PostgreSQL Account Store
//!
//! Row-level locking (`SELECT ... FOR UPDATE`) serializes concurrent
//! mutations of the same account inside one transaction.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{Account, AccountId, Balance};

use super::store::{AccountMutation, AccountStore};
use super::{LedgerError, StoreError};

#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_balance(value: Decimal) -> Result<Balance, StoreError> {
    Balance::new(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn insert(&self, balance: Balance) -> Result<AccountId, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO accounts (balance)
            VALUES ($1)
            RETURNING id
            "#,
        )
        .bind(balance.value())
        .fetch_one(&self.pool)
        .await?;

        Ok(AccountId::new(id))
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let balance: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM accounts WHERE id = $1")
                .bind(id.value())
                .fetch_optional(&self.pool)
                .await?;

        match balance {
            Some(value) => Ok(Some(Account::new(id, to_balance(value)?))),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        id: AccountId,
        mutation: &AccountMutation,
    ) -> Result<Balance, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        let current: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM accounts WHERE id = $1 FOR UPDATE")
                .bind(id.value())
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::from)?;

        let current = current.ok_or(LedgerError::UnknownAccount(id))?;
        let mut account = Account::new(id, to_balance(current)?);

        // Dropping the transaction on error rolls back and releases the row lock
        let balance = mutation(&mut account)?;

        sqlx::query("UPDATE accounts SET balance = $1 WHERE id = $2")
            .bind(balance.value())
            .bind(id.value())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;

        Ok(balance)
    }
}
