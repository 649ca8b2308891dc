//! Domain Events
//!
//! Immutable facts published to downstream consumers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::AccountId;

/// Outcome tag carried by a withdrawal event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    /// Only successful withdrawals are ever published
    Successful,
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WithdrawalStatus::Successful => write!(f, "SUCCESSFUL"),
        }
    }
}

/// A withdrawal was applied to an account.
///
/// `amount` goes on the wire as an exact JSON number, e.g. `30.00`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalEvent {
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub account_id: AccountId,
    pub status: WithdrawalStatus,
}

impl WithdrawalEvent {
    /// Record a successful withdrawal
    pub fn successful(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            amount,
            account_id,
            status: WithdrawalStatus::Successful,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_successful_event() {
        let event = WithdrawalEvent::successful(AccountId::new(7), dec!(30.00));

        assert_eq!(event.amount, dec!(30.00));
        assert_eq!(event.account_id, AccountId::new(7));
        assert_eq!(event.status, WithdrawalStatus::Successful);
    }

    #[test]
    fn test_amount_is_an_exact_json_number() {
        let event = WithdrawalEvent::successful(AccountId::new(7), dec!(30.00));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""amount":30.00"#), "{}", json);

        let decoded: WithdrawalEvent =
            serde_json::from_str(r#"{"amount":0.1,"accountId":7,"status":"SUCCESSFUL"}"#).unwrap();
        assert_eq!(decoded.amount, dec!(0.1));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&WithdrawalStatus::Successful).unwrap();
        assert_eq!(json, r#""SUCCESSFUL""#);
        assert_eq!(WithdrawalStatus::Successful.to_string(), "SUCCESSFUL");
    }
}
