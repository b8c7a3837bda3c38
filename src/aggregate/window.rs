//! Per-key aggregation windows and percentile selection.
//!
//! Percentiles use a clamped nearest-rank rule on the ascending durations:
//!
//! ```text
//! p_k = sorted[clamp(floor(count * k / 100) - 1, 0, count - 1)]
//! ```
//!
//! The floor is taken in integer arithmetic so that, for example, ten
//! samples give index 8 for p95, p98 and p99 alike.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::telemetry::{RawEvent, SummaryRecord};

/// Percentiles reported for every window.
pub const P95: u64 = 95;
pub const P98: u64 = 98;
pub const P99: u64 = 99;

/// Select the `pct`-th percentile from ascending `sorted` durations.
///
/// Returns `None` for an empty slice.
pub fn percentile(sorted: &[Duration], pct: u64) -> Option<Duration> {
    let count = sorted.len();
    if count == 0 {
        return None;
    }
    let rank = (count as u64).saturating_mul(pct) / 100;
    let index = (rank as usize).saturating_sub(1).min(count - 1);
    Some(sorted[index])
}

/// Durations recorded for one key since the last flush.
#[derive(Debug, Default, Clone)]
pub struct Window {
    durations: Vec<Duration>,
    failures: u64,
}

impl Window {
    /// Add one measurement.
    pub fn push(&mut self, duration: Duration, failed: bool) {
        self.durations.push(duration);
        if failed {
            self.failures += 1;
        }
    }

    /// Whether no measurement has been recorded.
    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Consume the window into a summary record.
    ///
    /// Returns `None` for an empty window.
    pub fn summarize(mut self, key: String, window_end_ms: i64) -> Option<SummaryRecord> {
        self.durations.sort_unstable();
        let sorted = &self.durations;

        Some(SummaryRecord {
            key,
            window_end_ms,
            count: sorted.len() as u64,
            failures: self.failures,
            p95: percentile(sorted, P95)?,
            p98: percentile(sorted, P98)?,
            p99: percentile(sorted, P99)?,
        })
    }
}

/// All open windows, keyed by operation.
///
/// Owned by a single aggregator task, so no locking.
#[derive(Debug, Default)]
pub struct Windows {
    by_key: BTreeMap<Cow<'static, str>, Window>,
    events: usize,
}

impl Windows {
    /// Create an empty set of windows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the window for its key.
    pub fn fold(&mut self, event: RawEvent) {
        self.by_key
            .entry(event.key)
            .or_default()
            .push(event.duration, event.failed);
        self.events += 1;
    }

    /// Number of events folded since the last flush.
    pub fn event_count(&self) -> usize {
        self.events
    }

    /// Whether nothing has been folded since the last flush.
    pub fn is_empty(&self) -> bool {
        self.events == 0
    }

    /// Close every window, returning one record per non-empty key in
    /// ascending key order. All windows are cleared.
    pub fn take_summaries(&mut self, window_end_ms: i64) -> Vec<SummaryRecord> {
        self.events = 0;
        std::mem::take(&mut self.by_key)
            .into_iter()
            .filter_map(|(key, window)| window.summarize(key.into_owned(), window_end_ms))
            .collect()
    }
}
