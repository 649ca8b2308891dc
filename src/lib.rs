//! withdrawal_ledger Library
//!
//! Account ledger with withdrawals and batched withdrawal notifications.
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod ledger;
pub mod publish;

mod error;

pub use config::Config;
pub use domain::{AccountId, Amount, AmountError, Balance, DomainError, WithdrawalEvent, WithdrawalResult};
pub use error::AppError;
pub use handlers::WithdrawalHandler;
pub use ledger::{Ledger, LedgerError};
