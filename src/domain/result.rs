//! Withdrawal Result
//!
//! Caller-visible outcome of a withdrawal request.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalResult {
    NegativeAmount,
    ZeroAmount,
    InsufficientFunds,
    UnknownAccount,
    Unknown,
    Success,
}

impl WithdrawalResult {
    /// Human-readable description returned to the caller
    pub fn description(&self) -> &'static str {
        match self {
            WithdrawalResult::NegativeAmount => "Cannot withdraw a negative amount",
            WithdrawalResult::ZeroAmount => "No amount specified for withdrawal",
            WithdrawalResult::InsufficientFunds => "Insufficient funds for withdrawal",
            WithdrawalResult::UnknownAccount => "No such account",
            WithdrawalResult::Unknown => "Unknown error",
            WithdrawalResult::Success => "Withdrawal successful",
        }
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NegativeAmount | Self::ZeroAmount | Self::InsufficientFunds | Self::UnknownAccount
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for WithdrawalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
