//! Flow control between producers and the aggregator.
//!
//! Provides:
//! - Bounded, drop-on-full ingestion queue
//! - Accepted/dropped counters for operational visibility

pub mod ingest;

pub use ingest::{ingest_queue, IngestHandle, IngestStats};
