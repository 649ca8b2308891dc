//! Withdrawal Handler
//!
//! Runs the withdrawal pipeline: ledger mutation, event encoding, enqueue,
//! and batch flush. Anything that fails after the ledger commit is logged
//! and never changes the result returned to the caller.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::{AccountId, Balance, WithdrawalEvent, WithdrawalResult};
use crate::ledger::{Ledger, LedgerError};
use crate::publish::{BatchPublisher, BatchState, EventEncoder, JsonEventEncoder, QueueEntry};

pub struct WithdrawalHandler {
    ledger: Ledger,
    encoder: Arc<dyn EventEncoder>,
    publisher: Arc<BatchPublisher>,
}

impl WithdrawalHandler {
    pub fn new(ledger: Ledger, publisher: Arc<BatchPublisher>) -> Self {
        Self {
            ledger,
            encoder: Arc::new(JsonEventEncoder),
            publisher,
        }
    }

    /// Replace the default JSON encoder
    pub fn with_encoder(mut self, encoder: Arc<dyn EventEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn publisher(&self) -> &Arc<BatchPublisher> {
        &self.publisher
    }

    /// Withdraw and, on success, queue a notification.
    ///
    /// Returns as soon as the event is queued; batch sends run on their own
    /// tasks.
    pub async fn withdraw(&self, account_id: AccountId, amount: Decimal) -> WithdrawalResult {
        tracing::debug!(account_id = %account_id, amount = %amount, "Withdrawal request received");

        let result = match self.ledger.withdraw(account_id, amount).await {
            Ok(balance) => {
                tracing::debug!(account_id = %account_id, balance = %balance, "Withdrawal applied");
                self.notify(WithdrawalEvent::successful(account_id, amount));
                WithdrawalResult::Success
            }
            Err(e) => {
                if let LedgerError::Store(ref store_err) = e {
                    tracing::error!(account_id = %account_id, error = %store_err, "Account store failure");
                }
                WithdrawalResult::from(&e)
            }
        };

        tracing::debug!(
            account_id = %account_id,
            amount = %amount,
            result = ?result,
            "Withdrawal request completed"
        );
        result
    }

    /// Encode, enqueue and flush. Failures stop here.
    fn notify(&self, event: WithdrawalEvent) {
        let body = match self.encoder.encode(&event) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(
                    account_id = %event.account_id,
                    amount = %event.amount,
                    error = %e,
                    "Failed to encode withdrawal event"
                );
                return;
            }
        };

        match self.publisher.queue().enqueue(QueueEntry::new(body)) {
            Ok(depth) => {
                tracing::debug!(
                    account_id = %event.account_id,
                    amount = %event.amount,
                    depth,
                    "Withdrawal event queued"
                );
            }
            Err(e) => {
                tracing::warn!(
                    account_id = %event.account_id,
                    amount = %event.amount,
                    error = %e,
                    "Withdrawal event dropped"
                );
            }
        }

        self.publisher.maybe_flush();
    }

    pub async fn deposit(&self, account_id: AccountId, amount: Decimal) -> Result<Balance, LedgerError> {
        self.ledger.deposit(account_id, amount).await
    }

    pub async fn add(&self, initial_balance: Decimal) -> Result<AccountId, LedgerError> {
        self.ledger.add(initial_balance).await
    }

    pub async fn balance(&self, account_id: AccountId) -> Result<Balance, LedgerError> {
        self.ledger.balance(account_id).await
    }

    /// Ship whatever is still queued and wait for every outstanding send
    pub async fn shutdown(&self) -> Vec<BatchState> {
        self.publisher.flush_all();
        self.publisher.join_in_flight().await
    }
}
