//! Ingestion queue between instrumented call sites and the aggregator.
//!
//! - Bounded tokio mpsc channel, many producers, one consumer
//! - Producers use `try_send` and never wait
//! - Rejected events are counted with lock-free atomics

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};

use crate::telemetry::RawEvent;

/// Counters describing what happened to submitted events.
///
/// Both counters only ever increase.
#[derive(Debug, Default)]
pub struct IngestStats {
    accepted: AtomicU64,
    dropped: AtomicU64,
}

impl IngestStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events handed to the aggregator.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Number of events rejected because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }
}

/// Producer side of the ingestion queue.
///
/// Cloning is cheap; every [`Span`](crate::telemetry::Span) carries one.
#[derive(Debug, Clone)]
pub struct IngestHandle {
    tx: Sender<RawEvent>,
    stats: Arc<IngestStats>,
}

impl IngestHandle {
    /// Try to enqueue an event without waiting.
    ///
    /// Returns true if the event was accepted. A full or closed queue drops
    /// the event and increments the drop counter.
    pub fn submit(&self, event: RawEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => {
                self.stats.record_accepted();
                true
            }
            Err(TrySendError::Full(event)) => {
                self.stats.record_dropped();
                tracing::trace!(key = %event.key, "Ingestion queue full, event dropped");
                false
            }
            Err(TrySendError::Closed(event)) => {
                self.stats.record_dropped();
                tracing::trace!(key = %event.key, "Ingestion queue closed, event dropped");
                false
            }
        }
    }

    /// Shared counters for this queue.
    pub fn stats(&self) -> &Arc<IngestStats> {
        &self.stats
    }
}

/// Create an ingestion queue with the given capacity.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn ingest_queue(capacity: usize) -> (IngestHandle, Receiver<RawEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    let handle = IngestHandle {
        tx,
        stats: Arc::new(IngestStats::new()),
    };
    (handle, rx)
}
