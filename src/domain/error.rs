//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::AmountError;

/// Business rule violations raised by domain types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Amount below zero
    #[error("Cannot use a negative amount: {0}")]
    NegativeAmount(Decimal),

    /// Amount equal to zero
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Balance lower than the requested withdrawal
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    /// Arithmetic left the representable decimal range
    #[error("Balance overflow")]
    Overflow,
}

impl DomainError {
    /// Create an insufficient funds error
    pub fn insufficient_funds(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }
}

impl From<AmountError> for DomainError {
    fn from(err: AmountError) -> Self {
        match err {
            AmountError::Negative(value) => Self::NegativeAmount(value),
            AmountError::Zero => Self::ZeroAmount,
            AmountError::Overflow => Self::Overflow,
        }
    }
}
