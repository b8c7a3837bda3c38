//! Records flowing through the pipeline.

use std::borrow::Cow;
use std::time::Duration;

/// One completed timing measurement.
///
/// Produced when a [`Span`](super::Span) closes and folded into exactly one
/// aggregation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Operation key.
    pub key: Cow<'static, str>,
    /// Wall-clock start time, Unix milliseconds.
    pub started_at_ms: i64,
    /// Elapsed time between open and close.
    pub duration: Duration,
    /// Whether the operation ended with an error.
    pub failed: bool,
}

impl RawEvent {
    /// Create a new event.
    pub fn new(
        key: impl Into<Cow<'static, str>>,
        started_at_ms: i64,
        duration: Duration,
        failed: bool,
    ) -> Self {
        Self {
            key: key.into(),
            started_at_ms,
            duration,
            failed,
        }
    }
}

/// Per-key, per-window aggregate.
///
/// Invariants: `count >= 1`, `failures <= count`, `p95 <= p98 <= p99`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    /// Operation key.
    pub key: String,
    /// Wall-clock time of the flush that closed the window, Unix milliseconds.
    pub window_end_ms: i64,
    /// Number of events folded into the window.
    pub count: u64,
    /// Number of those events that failed.
    pub failures: u64,
    /// 95th percentile duration.
    pub p95: Duration,
    /// 98th percentile duration.
    pub p98: Duration,
    /// 99th percentile duration.
    pub p99: Duration,
}
