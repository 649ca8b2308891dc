//! Handlers module
//!
//! Orchestrate business operations across the ledger and the publisher.

mod withdrawal_handler;

pub use withdrawal_handler::WithdrawalHandler;
