//! Timing span handle.

use std::borrow::Cow;
use std::time::{Duration, Instant};

use crate::flow::IngestHandle;
use crate::now_millis;

use super::RawEvent;

/// Handle for one in-flight timed operation.
///
/// Opened by [`Observability::start_span`](super::Observability::start_span)
/// and closed with [`Span::done`]. Closing never blocks: if the ingestion
/// queue is full the measurement is dropped and counted.
///
/// A span that is dropped without being closed records nothing.
#[derive(Debug)]
#[must_use = "a span records nothing until `done` is called"]
pub struct Span {
    key: Cow<'static, str>,
    started_at: Instant,
    started_at_ms: i64,
    ingest: Option<IngestHandle>,
}

impl Span {
    pub(crate) fn new(key: Cow<'static, str>, ingest: IngestHandle) -> Self {
        Self {
            key,
            started_at: Instant::now(),
            started_at_ms: now_millis(),
            ingest: Some(ingest),
        }
    }

    /// Operation key this span was opened for.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether `done` has already been called.
    pub fn is_done(&self) -> bool {
        self.ingest.is_none()
    }

    /// Time since the span was opened.
    pub fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.started_at)
    }

    /// Close the span and hand the measurement to the aggregator.
    ///
    /// Only the first call records anything; later calls are no-ops.
    pub fn done(&mut self, failed: bool) {
        let Some(ingest) = self.ingest.take() else {
            return;
        };

        let event = RawEvent {
            key: self.key.clone(),
            started_at_ms: self.started_at_ms,
            duration: self.elapsed(),
            failed,
        };
        ingest.submit(event);
    }

    /// Close the span, marking it failed if `result` is an error.
    pub fn finish<T, E>(&mut self, result: &Result<T, E>) {
        self.done(result.is_err());
    }
}
