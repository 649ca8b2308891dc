//! Batch Publisher
//!
//! Drains full batches from the queue and ships them to the topic on a
//! spawned task. The producer never waits for the network; the outcome of
//! each batch only reaches the [`PublishOutcomeHandler`]. Send tasks stay
//! tracked until [`BatchPublisher::join_in_flight`] collects them.
//!
//! Batch lifecycle: `Composed -> Submitted -> {Acknowledged | Failed}`.
//! Failed batches are not retried.

use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;

use super::queue::{BatchQueue, QueueEntry};
use super::topic::TopicAddress;
use super::transport::{BatchAck, PublishBatch, TopicTransport, TransportError, MAX_BATCH_ENTRIES};

/// Default number of entries per publish call
pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Composed,
    Submitted,
    Acknowledged,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublisherError {
    #[error("Batch size must be between 1 and {max} (got {size})")]
    InvalidBatchSize { size: usize, max: usize },

    #[error("Queue capacity {capacity} is smaller than the batch size {batch_size}")]
    QueueTooSmall { capacity: usize, batch_size: usize },
}

/// Receives the final state of every submitted batch
pub trait PublishOutcomeHandler: Send + Sync {
    fn on_acknowledged(&self, batch: &PublishBatch, ack: &BatchAck);

    fn on_failed(&self, batch: &PublishBatch, error: &TransportError);
}

/// Default outcome handler: log and move on
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingOutcomeHandler;

impl PublishOutcomeHandler for LoggingOutcomeHandler {
    fn on_acknowledged(&self, batch: &PublishBatch, ack: &BatchAck) {
        let latency_ms = (Utc::now() - batch.composed_at()).num_milliseconds();
        if ack.failed_ids.is_empty() {
            tracing::debug!(
                batch_id = %batch.id(),
                topic = %batch.topic(),
                delivered = ack.delivered,
                latency_ms,
                "Publish batch acknowledged"
            );
        } else {
            tracing::warn!(
                batch_id = %batch.id(),
                topic = %batch.topic(),
                delivered = ack.delivered,
                failed_ids = ?ack.failed_ids,
                latency_ms,
                "Publish batch partially acknowledged"
            );
        }
    }

    fn on_failed(&self, batch: &PublishBatch, error: &TransportError) {
        tracing::error!(
            batch_id = %batch.id(),
            topic = %batch.topic(),
            entries = batch.len(),
            composed_at = %batch.composed_at(),
            error = %error,
            "Publish batch failed"
        );
    }
}

pub struct BatchPublisher {
    queue: Arc<BatchQueue>,
    transport: Arc<dyn TopicTransport>,
    outcome: Arc<dyn PublishOutcomeHandler>,
    topic: TopicAddress,
    batch_size: usize,
    in_flight: Mutex<JoinSet<BatchState>>,
}

impl BatchPublisher {
    pub fn new(
        queue: Arc<BatchQueue>,
        transport: Arc<dyn TopicTransport>,
        topic: TopicAddress,
        batch_size: usize,
    ) -> Result<Self, PublisherError> {
        if batch_size == 0 || batch_size > MAX_BATCH_ENTRIES {
            return Err(PublisherError::InvalidBatchSize {
                size: batch_size,
                max: MAX_BATCH_ENTRIES,
            });
        }
        if queue.capacity() < batch_size {
            return Err(PublisherError::QueueTooSmall {
                capacity: queue.capacity(),
                batch_size,
            });
        }

        Ok(Self {
            queue,
            transport,
            outcome: Arc::new(LoggingOutcomeHandler),
            topic,
            batch_size,
            in_flight: Mutex::new(JoinSet::new()),
        })
    }

    /// Replace the default logging outcome handler
    pub fn with_outcome_handler(mut self, outcome: Arc<dyn PublishOutcomeHandler>) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn queue(&self) -> &Arc<BatchQueue> {
        &self.queue
    }

    pub fn topic(&self) -> &TopicAddress {
        &self.topic
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Ship one batch for every full batch currently queued.
    ///
    /// Must be called from within a tokio runtime. Returns immediately with
    /// the number of batches dispatched.
    pub fn maybe_flush(&self) -> usize {
        let mut dispatched = 0;
        loop {
            match self.queue.drain_batch(self.batch_size) {
                Ok(Some(entries)) => {
                    self.submit(entries);
                    dispatched += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to drain publish queue");
                    break;
                }
            }
        }
        dispatched
    }

    /// Ship everything still queued, including a final partial batch
    pub fn flush_all(&self) -> usize {
        let mut dispatched = 0;
        loop {
            match self.queue.drain_up_to(self.batch_size) {
                Ok(entries) if entries.is_empty() => break,
                Ok(entries) => {
                    self.submit(entries);
                    dispatched += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to drain publish queue");
                    break;
                }
            }
        }
        dispatched
    }

    /// Wait for every batch dispatched so far, in completion order.
    ///
    /// A send task that panicked or was cancelled counts as `Failed`.
    pub async fn join_in_flight(&self) -> Vec<BatchState> {
        let mut tasks = match self.in_flight.lock() {
            Ok(mut set) => std::mem::take(&mut *set),
            Err(_) => {
                tracing::error!("Publish task set lock poisoned");
                return Vec::new();
            }
        };

        let mut states = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(state) => states.push(state),
                Err(e) => {
                    tracing::error!(error = %e, "Publish task did not complete");
                    states.push(BatchState::Failed);
                }
            }
        }
        states
    }

    fn submit(&self, entries: Vec<QueueEntry>) {
        let batch = PublishBatch::new(self.topic.clone(), entries);
        tracing::debug!(
            batch_id = %batch.id(),
            entries = batch.len(),
            state = ?BatchState::Composed,
            "Publish batch composed"
        );

        let transport = Arc::clone(&self.transport);
        let outcome = Arc::clone(&self.outcome);

        let send = async move {
            tracing::debug!(
                batch_id = %batch.id(),
                state = ?BatchState::Submitted,
                "Publish batch submitted"
            );
            match transport.publish_batch(&batch).await {
                Ok(ack) => {
                    outcome.on_acknowledged(&batch, &ack);
                    BatchState::Acknowledged
                }
                Err(e) => {
                    outcome.on_failed(&batch, &e);
                    BatchState::Failed
                }
            }
        };

        match self.in_flight.lock() {
            Ok(mut set) => {
                // Reap finished sends so the set only holds live tasks
                while set.try_join_next().is_some() {}
                set.spawn(send);
            }
            Err(_) => {
                tracing::error!("Publish task set lock poisoned; sending untracked");
                tokio::spawn(send);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::transport::InMemoryTransport;
    use std::sync::Mutex;

    fn topic() -> TopicAddress {
        TopicAddress::new("af-south-1", "000000000000", "withdrawals")
    }

    fn publisher(
        capacity: usize,
        batch_size: usize,
        transport: Arc<InMemoryTransport>,
    ) -> BatchPublisher {
        BatchPublisher::new(
            Arc::new(BatchQueue::new(capacity)),
            transport,
            topic(),
            batch_size,
        )
        .unwrap()
    }

    #[derive(Default)]
    struct RecordingOutcome {
        acknowledged: Mutex<Vec<usize>>,
        failed: Mutex<Vec<usize>>,
    }

    impl PublishOutcomeHandler for RecordingOutcome {
        fn on_acknowledged(&self, batch: &PublishBatch, _ack: &BatchAck) {
            self.acknowledged.lock().unwrap().push(batch.len());
        }

        fn on_failed(&self, batch: &PublishBatch, _error: &TransportError) {
            self.failed.lock().unwrap().push(batch.len());
        }
    }

    #[test]
    fn test_batch_size_limits() {
        let transport: Arc<dyn TopicTransport> = Arc::new(InMemoryTransport::new());
        let queue = Arc::new(BatchQueue::new(100));

        for size in [0, MAX_BATCH_ENTRIES + 1] {
            let result = BatchPublisher::new(queue.clone(), transport.clone(), topic(), size);
            assert!(matches!(result, Err(PublisherError::InvalidBatchSize { .. })));
        }

        let small = Arc::new(BatchQueue::new(5));
        let result = BatchPublisher::new(small, transport, topic(), 10);
        assert!(matches!(result, Err(PublisherError::QueueTooSmall { .. })));
    }

    #[tokio::test]
    async fn test_no_flush_below_threshold() {
        let transport = Arc::new(InMemoryTransport::new());
        let publisher = publisher(100, 10, transport.clone());

        for i in 0..9 {
            publisher.queue().enqueue(QueueEntry::new(i.to_string())).unwrap();
            assert_eq!(publisher.maybe_flush(), 0);
        }
        assert_eq!(publisher.queue().len(), 9);
        assert_eq!(transport.attempt_count(), 0);
    }

    #[tokio::test]
    async fn test_threshold_enqueue_triggers_one_batch() {
        let transport = Arc::new(InMemoryTransport::new());
        let publisher = publisher(100, 10, transport.clone());

        for i in 0..9 {
            publisher.queue().enqueue(QueueEntry::new(i.to_string())).unwrap();
        }
        let prior = publisher.queue().len();
        publisher.queue().enqueue(QueueEntry::new("9")).unwrap();

        assert_eq!(publisher.maybe_flush(), 1);
        assert_eq!(publisher.queue().len(), prior + 1 - 10);
        assert_eq!(publisher.join_in_flight().await, vec![BatchState::Acknowledged]);

        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 1);
        let bodies: Vec<&str> = delivered[0].entries().iter().map(|e| e.body()).collect();
        assert_eq!(bodies, vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
        assert_eq!(delivered[0].topic(), &topic());
    }

    #[tokio::test]
    async fn test_deep_queue_flushes_multiple_batches() {
        let transport = Arc::new(InMemoryTransport::new());
        let publisher = publisher(100, 10, transport.clone());

        for i in 0..25 {
            publisher.queue().enqueue(QueueEntry::new(i.to_string())).unwrap();
        }

        assert_eq!(publisher.maybe_flush(), 2);
        assert_eq!(publisher.queue().len(), 5);

        assert_eq!(publisher.join_in_flight().await.len(), 2);
        assert!(transport.delivered().iter().all(|b| b.len() == 10));
    }

    #[tokio::test]
    async fn test_failed_batch_reaches_outcome_handler() {
        let transport = Arc::new(InMemoryTransport::failing());
        let outcome = Arc::new(RecordingOutcome::default());
        let publisher = publisher(100, 2, transport.clone()).with_outcome_handler(outcome.clone());

        publisher.queue().enqueue(QueueEntry::new("a")).unwrap();
        publisher.queue().enqueue(QueueEntry::new("b")).unwrap();

        assert_eq!(publisher.maybe_flush(), 1);
        assert_eq!(publisher.join_in_flight().await, vec![BatchState::Failed]);

        assert_eq!(*outcome.failed.lock().unwrap(), vec![2]);
        assert!(outcome.acknowledged.lock().unwrap().is_empty());
        // No retry, entries are gone from the queue
        assert!(publisher.queue().is_empty());
        assert_eq!(transport.attempt_count(), 1);
    }

    #[tokio::test]
    async fn test_flush_all_ships_partial_batch() {
        let transport = Arc::new(InMemoryTransport::new());
        let outcome = Arc::new(RecordingOutcome::default());
        let publisher = publisher(100, 10, transport.clone()).with_outcome_handler(outcome.clone());

        for i in 0..13 {
            publisher.queue().enqueue(QueueEntry::new(i.to_string())).unwrap();
        }

        assert_eq!(publisher.flush_all(), 2);
        publisher.join_in_flight().await;

        let mut sizes = outcome.acknowledged.lock().unwrap().clone();
        sizes.sort();
        assert_eq!(sizes, vec![3, 10]);
        assert!(publisher.queue().is_empty());
    }

    #[tokio::test]
    async fn test_join_in_flight_waits_for_detached_sends() {
        let transport = Arc::new(InMemoryTransport::new());
        let publisher = publisher(100, 2, transport.clone());

        for round in 0..3 {
            publisher.queue().enqueue(QueueEntry::new(format!("{}-a", round))).unwrap();
            publisher.queue().enqueue(QueueEntry::new(format!("{}-b", round))).unwrap();
            publisher.maybe_flush();
        }

        let states = publisher.join_in_flight().await;
        assert_eq!(states.len(), 3);
        assert!(states.iter().all(|s| *s == BatchState::Acknowledged));
        assert_eq!(transport.delivered().len(), 3);

        // Nothing left to wait for
        assert!(publisher.join_in_flight().await.is_empty());
    }
}
