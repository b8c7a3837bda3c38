//! Spanlog: low-overhead timing spans aggregated into periodic percentile summaries.
//!
//! Instrumented call sites open a [`Span`] for an operation key and close it
//! with a success/failure flag. Completed spans are handed off to a background
//! aggregator which, once per flush interval, emits one summary per key
//! (count, p95, p98, p99) to a sink writer that persists it to an injected
//! output stream.
//!
//! # Architecture
//!
//! - **Non-blocking ingestion**: producers never wait; a full queue drops the
//!   event and bumps a counter
//! - **Windowed aggregation**: one summary per key per flush tick, final flush
//!   on shutdown
//! - **Backpressured persistence**: the aggregator waits for the sink writer,
//!   the request path never does
//! - **Fatal sink failures**: a write error stops the subsystem and is reported
//!   to the lifecycle owner
//!
//! # Modules
//!
//! - [`aggregate`]: Per-key windows, percentiles and the aggregator task
//! - [`config`]: CLI, environment and pipeline configuration
//! - [`flow`]: Ingestion queue with drop accounting
//! - [`observability`]: Tracing setup
//! - [`sink`]: Summary line formats and the sink writer task
//! - [`telemetry`]: Spans, events and the observability facade
//! - [`workload`]: Synthetic request workload for the demo binary

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // sink::writer::SinkWriter is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::cast_possible_truncation,   // Nanosecond and millisecond casts are bounded
    clippy::struct_excessive_bools,     // Config structs may have flags
    clippy::too_many_lines              // Some functions are inherently long
)]

pub mod aggregate;
pub mod config;
pub mod flow;
pub mod observability;
pub mod sink;
pub mod telemetry;
pub mod workload;

pub use config::TelemetryConfig;
pub use sink::format::SinkFormat;
pub use telemetry::{LoggingTasks, Observability, RawEvent, Span, SummaryRecord, TelemetryError};

/// Get the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock reads earlier than the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
