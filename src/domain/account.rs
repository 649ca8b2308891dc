//! Account entity
//!
//! An account holds a non-negative balance. Every mutation re-checks the
//! invariant before touching state, so a rejected operation leaves the
//! account exactly as it was.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Amount, Balance, DomainError};

/// Opaque numeric account identifier, assigned by the store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account with its current balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    balance: Balance,
}

impl Account {
    pub fn new(id: AccountId, balance: Balance) -> Self {
        Self { id, balance }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    /// Withdraw money from the account.
    ///
    /// Fails with `InsufficientFunds` when the balance is lower than the
    /// amount; the balance is left untouched in that case.
    pub fn withdraw(&mut self, amount: &Amount) -> Result<Balance, DomainError> {
        if !self.balance.is_sufficient_for(amount) {
            return Err(DomainError::insufficient_funds(
                amount.value(),
                self.balance.value(),
            ));
        }

        self.balance = self.balance.debit(amount)?;
        Ok(self.balance)
    }

    /// Deposit money into the account
    pub fn deposit(&mut self, amount: &Amount) -> Result<Balance, DomainError> {
        self.balance = self.balance.credit(amount)?;
        Ok(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account_with(balance: rust_decimal::Decimal) -> Account {
        Account::new(AccountId::new(1), Balance::new(balance).unwrap())
    }

    #[test]
    fn test_withdraw_reduces_balance() {
        let mut account = account_with(dec!(100.00));
        let amount = Amount::new(dec!(30.00)).unwrap();

        let balance = account.withdraw(&amount).unwrap();
        assert_eq!(balance.value(), dec!(70.00));
        assert_eq!(account.balance().value(), dec!(70.00));
    }

    #[test]
    fn test_withdraw_exact_balance() {
        let mut account = account_with(dec!(100));
        let amount = Amount::new(dec!(100)).unwrap();

        assert_eq!(account.withdraw(&amount).unwrap(), Balance::zero());
    }

    #[test]
    fn test_withdraw_insufficient_leaves_balance() {
        let mut account = account_with(dec!(50));
        let amount = Amount::new(dec!(50.01)).unwrap();

        let result = account.withdraw(&amount);
        assert!(matches!(result, Err(DomainError::InsufficientFunds { .. })));
        assert_eq!(account.balance().value(), dec!(50));
    }

    #[test]
    fn test_deposit() {
        let mut account = account_with(dec!(0));
        let amount = Amount::new(dec!(12.5)).unwrap();

        assert_eq!(account.deposit(&amount).unwrap().value(), dec!(12.5));
    }
}
