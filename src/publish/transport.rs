//! Topic Transport
//!
//! Outbound pub/sub send primitive. The HTTP transport talks to a real
//! endpoint; the in-memory transport records batches for tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

use super::queue::QueueEntry;
use super::topic::TopicAddress;

/// Hard per-call limit of the batch publish API
pub const MAX_BATCH_ENTRIES: usize = 10;

/// A group of queued entries addressed to one topic
#[derive(Debug, Clone)]
pub struct PublishBatch {
    id: Uuid,
    topic: TopicAddress,
    entries: Vec<QueueEntry>,
    composed_at: DateTime<Utc>,
}

impl PublishBatch {
    pub fn new(topic: TopicAddress, entries: Vec<QueueEntry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic,
            entries,
            composed_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &TopicAddress {
        &self.topic
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn composed_at(&self) -> DateTime<Utc> {
        self.composed_at
    }

    /// Request entries with batch-unique IDs "0", "1", ...
    pub fn request_entries(&self) -> Vec<BatchRequestEntry> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| BatchRequestEntry {
                id: idx.to_string(),
                message: entry.body().to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchRequestEntry {
    pub id: String,
    pub message: String,
}

/// Acknowledgement of a submitted batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAck {
    pub delivered: usize,
    /// Entry IDs the topic refused individually
    pub failed_ids: Vec<String>,
}

impl BatchAck {
    pub fn all_delivered(batch: &PublishBatch) -> Self {
        Self {
            delivered: batch.len(),
            failed_ids: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Topic rejected batch with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The topic answered 2xx with a body that could not be read, so
    /// per-entry delivery is unknown
    #[error("Unreadable publish response (status {status}): {body}")]
    UnreadableResponse { status: u16, body: String },

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TopicTransport: Send + Sync {
    /// Send one batch and resolve once the topic answers
    async fn publish_batch(&self, batch: &PublishBatch) -> Result<BatchAck, TransportError>;
}

// =========================================================================
// HTTP transport
// =========================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PublishBatchRequest<'a> {
    topic_arn: &'a str,
    publish_batch_request_entries: Vec<BatchRequestEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct PublishBatchResponse {
    failed: Vec<FailedEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct FailedEntry {
    id: String,
    code: Option<String>,
}

/// Posts JSON PublishBatch requests to a configured endpoint
#[derive(Debug, Clone)]
pub struct HttpTopicTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTopicTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

}

#[async_trait]
impl TopicTransport for HttpTopicTransport {
    async fn publish_batch(&self, batch: &PublishBatch) -> Result<BatchAck, TransportError> {
        let request = PublishBatchRequest {
            topic_arn: batch.topic().as_str(),
            publish_batch_request_entries: batch.request_entries(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", "AmazonSNS.PublishBatch")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // An empty body cannot list failures
        let parsed = if body.trim().is_empty() {
            PublishBatchResponse::default()
        } else {
            match serde_json::from_str::<PublishBatchResponse>(&body) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(
                        batch_id = %batch.id(),
                        error = %e,
                        body = %body,
                        "Publish response unreadable; batch delivery unconfirmed"
                    );
                    return Err(TransportError::UnreadableResponse {
                        status: status.as_u16(),
                        body,
                    });
                }
            }
        };
        for failed in &parsed.failed {
            tracing::debug!(
                batch_id = %batch.id(),
                entry_id = %failed.id,
                code = ?failed.code,
                "Topic refused batch entry"
            );
        }
        let failed_ids: Vec<String> = parsed.failed.into_iter().map(|f| f.id).collect();

        Ok(BatchAck {
            delivered: batch.len().saturating_sub(failed_ids.len()),
            failed_ids,
        })
    }
}

// =========================================================================
// In-memory transport
// =========================================================================

/// Records every batch it is handed; can be switched into failure mode
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    attempts: Mutex<Vec<PublishBatch>>,
    delivered: Mutex<Vec<PublishBatch>>,
    failing: AtomicBool,
    notify: Notify,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that refuses every batch
    pub fn failing() -> Self {
        let transport = Self::default();
        transport.set_failing(true);
        transport
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Batches acknowledged so far
    pub fn delivered(&self) -> Vec<PublishBatch> {
        self.delivered.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Number of publish calls, successful or not
    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().map(|b| b.len()).unwrap_or(0)
    }

    /// Wait until at least `count` publish calls have completed
    pub async fn wait_for_attempts(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.attempt_count() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl TopicTransport for InMemoryTransport {
    async fn publish_batch(&self, batch: &PublishBatch) -> Result<BatchAck, TransportError> {
        let result = if self.failing.load(Ordering::SeqCst) {
            Err(TransportError::Unavailable(
                "in-memory transport is set to fail".to_string(),
            ))
        } else {
            if let Ok(mut delivered) = self.delivered.lock() {
                delivered.push(batch.clone());
            }
            Ok(BatchAck::all_delivered(batch))
        };

        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(batch.clone());
        }
        self.notify.notify_waiters();

        result
    }
}
