//! Publish module
//!
//! Withdrawal notifications: encoding, the bounded batch queue, and the
//! asynchronous batch publisher with its topic transports.

pub mod encoder;
pub mod publisher;
pub mod queue;
pub mod topic;
pub mod transport;

pub use encoder::{EncodingError, EventEncoder, JsonEventEncoder};
pub use publisher::{
    BatchPublisher, BatchState, LoggingOutcomeHandler, PublishOutcomeHandler,
    PublisherError, DEFAULT_BATCH_SIZE,
};
pub use queue::{BatchQueue, QueueEntry, QueueError, DEFAULT_QUEUE_CAPACITY};
pub use topic::TopicAddress;
pub use transport::{
    BatchAck, HttpTopicTransport, InMemoryTransport, PublishBatch, TopicTransport, TransportError,
    MAX_BATCH_ENTRIES,
};
