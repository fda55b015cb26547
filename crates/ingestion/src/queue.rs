//! Ingest queue - fixed-capacity hand-off between ingestion and dispatch
//!
//! Exactly one producer and one consumer. Insert never blocks: a full
//! queue rejects the incoming reading. Remove waits at most a bounded
//! interval so the consumer can re-check its own stop conditions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::Reading;
use tracing::trace;

/// Result of a non-blocking insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Reading accepted
    Queued,
    /// Queue at capacity, reading discarded
    Dropped,
    /// Consumer gone
    Closed,
}

/// Result of a bounded-wait remove
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    Reading(Reading),
    /// Nothing arrived within the wait interval
    Empty,
    /// Producer gone and queue drained
    Closed,
}

#[derive(Debug)]
struct QueueShared {
    capacity: usize,
    /// Set when an insert was rejected; cleared by the consumer
    saturated: AtomicBool,
}

/// Create a queue with the given capacity
///
/// A capacity of zero is raised to one.
pub fn ingest_queue(capacity: usize) -> (QueueProducer, QueueConsumer) {
    let capacity = capacity.max(1);
    let (tx, rx) = bounded(capacity);
    let shared = Arc::new(QueueShared {
        capacity,
        saturated: AtomicBool::new(false),
    });

    (
        QueueProducer {
            tx,
            shared: Arc::clone(&shared),
        },
        QueueConsumer { rx, shared },
    )
}

/// Insert side of the ingest queue
#[derive(Debug)]
pub struct QueueProducer {
    tx: Sender<Reading>,
    shared: Arc<QueueShared>,
}

impl QueueProducer {
    /// Insert without waiting
    pub fn try_insert(&self, reading: Reading) -> InsertOutcome {
        match self.tx.try_send(reading) {
            Ok(()) => {
                trace!(depth = self.tx.len(), "reading queued");
                InsertOutcome::Queued
            }
            Err(TrySendError::Full(_)) => {
                self.shared.saturated.store(true, Ordering::Relaxed);
                trace!(capacity = self.shared.capacity, "queue full, reading dropped");
                InsertOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => InsertOutcome::Closed,
        }
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

/// Remove side of the ingest queue
#[derive(Debug)]
pub struct QueueConsumer {
    rx: Receiver<Reading>,
    shared: Arc<QueueShared>,
}

impl QueueConsumer {
    /// Remove the oldest reading, waiting at most `wait`
    pub async fn remove(&self, wait: Duration) -> RemoveOutcome {
        match tokio::time::timeout(wait, self.rx.recv()).await {
            Ok(Ok(reading)) => RemoveOutcome::Reading(reading),
            Ok(Err(_)) => RemoveOutcome::Closed,
            Err(_) => RemoveOutcome::Empty,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rx.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Whether any insert was rejected since the last call
    pub fn take_saturation(&self) -> bool {
        self.shared.saturated.swap(false, Ordering::Relaxed)
    }
}
