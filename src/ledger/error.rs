//! Ledger Errors
//!
//! Error types for ledger and account store operations.

use crate::domain::{AccountId, DomainError, WithdrawalResult};

/// Errors raised by an account store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// In-memory lock poisoned by a panicking writer
    #[error("Account store lock poisoned")]
    Poisoned,

    /// Persisted row violates a domain invariant
    #[error("Corrupt account data: {0}")]
    Corrupt(String),
}

/// Errors that can occur in ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Business rule violation, nothing was mutated
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// No account with this ID
    #[error("No account with ID {0}")]
    UnknownAccount(AccountId),

    /// Backend failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<&LedgerError> for WithdrawalResult {
    fn from(err: &LedgerError) -> Self {
        match err {
            LedgerError::Domain(DomainError::NegativeAmount(_)) => WithdrawalResult::NegativeAmount,
            LedgerError::Domain(DomainError::ZeroAmount) => WithdrawalResult::ZeroAmount,
            LedgerError::Domain(DomainError::InsufficientFunds { .. }) => {
                WithdrawalResult::InsufficientFunds
            }
            LedgerError::UnknownAccount(_) => WithdrawalResult::UnknownAccount,
            LedgerError::Domain(DomainError::Overflow) | LedgerError::Store(_) => {
                WithdrawalResult::Unknown
            }
        }
    }
}
