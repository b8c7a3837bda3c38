//! Observability facade: span creation and pipeline lifecycle.

use std::borrow::Cow;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use super::{RawEvent, Span};
use crate::aggregate::{Aggregator, AggregatorError};
use crate::config::TelemetryConfig;
use crate::flow::{ingest_queue, IngestHandle};
use crate::sink::{SinkError, SinkWriter};

/// Error type for the telemetry lifecycle.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry logging has already been started")]
    AlreadyStarted,

    #[error("sink writer failed: {0}")]
    Sink(#[from] SinkError),

    #[error("telemetry task failed: {0}")]
    Task(#[from] JoinError),
}

struct Inner {
    config: TelemetryConfig,
    ingest: IngestHandle,
    /// Consumer end of the ingestion queue until logging starts.
    events: Mutex<Option<Receiver<RawEvent>>>,
}

/// Entry point for instrumented code and for the lifecycle owner.
///
/// Cloning is cheap and every clone feeds the same pipeline. Spans can be
/// opened before logging starts; their events wait in the ingestion queue
/// (and are dropped once it is full).
#[derive(Clone)]
pub struct Observability {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Observability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observability")
            .field("config", &self.inner.config)
            .field("accepted", &self.accepted_events())
            .field("dropped", &self.dropped_events())
            .finish()
    }
}

impl Default for Observability {
    fn default() -> Self {
        Self::new(TelemetryConfig::default())
    }
}

impl Observability {
    /// Create the pipeline queues. No task runs until [`start_logging`].
    ///
    /// [`start_logging`]: Observability::start_logging
    pub fn new(config: TelemetryConfig) -> Self {
        let config = config.normalized();
        let (ingest, events) = ingest_queue(config.ingest_capacity);
        Self {
            inner: Arc::new(Inner {
                config,
                ingest,
                events: Mutex::new(Some(events)),
            }),
        }
    }

    /// Open a span for `key`. Never blocks.
    pub fn start_span(&self, key: impl Into<Cow<'static, str>>) -> Span {
        Span::new(key.into(), self.inner.ingest.clone())
    }

    /// Spawn the aggregator and sink writer tasks and return immediately.
    ///
    /// `sink` is owned by the sink writer until the returned tasks finish.
    /// Cancelling `cancel` triggers a final flush followed by a drain of the
    /// summary queue. Must be called from within a tokio runtime, and only
    /// once per pipeline.
    pub fn start_logging<W>(
        &self,
        sink: W,
        cancel: CancellationToken,
    ) -> Result<LoggingTasks<W>, TelemetryError>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let events = self
            .inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(TelemetryError::AlreadyStarted)?;

        let config = &self.inner.config;
        let (summary_tx, summary_rx) = mpsc::channel(config.summary_capacity);

        let aggregator = Aggregator::new(
            events,
            summary_tx,
            self.inner.ingest.stats().clone(),
            config,
        );
        // A sink failure stops the aggregator without cancelling the caller's token.
        let stop = cancel.child_token();
        let aggregator = tokio::spawn(aggregator.run(stop.clone()));

        let failed = CancellationToken::new();
        let writer = SinkWriter::new(sink, summary_rx, config.format);
        let writer = tokio::spawn({
            let failed = failed.clone();
            async move {
                // Cancels on error and on panic; disarmed after a clean exit.
                let failed = failed.drop_guard();
                let stop = stop.drop_guard();
                let result = writer.run().await;
                if result.is_ok() {
                    let _ = failed.disarm();
                    let _ = stop.disarm();
                }
                result
            }
        });

        tracing::info!(
            flush_interval_ms = config.flush_interval.as_millis() as u64,
            ingest_capacity = config.ingest_capacity,
            format = %config.format,
            "Telemetry logging started"
        );

        Ok(LoggingTasks {
            aggregator,
            writer,
            failed,
        })
    }

    /// Number of events accepted into the ingestion queue.
    pub fn accepted_events(&self) -> u64 {
        self.inner.ingest.stats().accepted()
    }

    /// Number of events dropped because the ingestion queue was full or closed.
    pub fn dropped_events(&self) -> u64 {
        self.inner.ingest.stats().dropped()
    }
}

/// Background tasks started by [`Observability::start_logging`].
#[must_use = "dropping the handle detaches the tasks and hides sink failures"]
pub struct LoggingTasks<W> {
    aggregator: JoinHandle<Result<(), AggregatorError>>,
    writer: JoinHandle<Result<W, SinkError>>,
    failed: CancellationToken,
}

impl<W> LoggingTasks<W> {
    /// Resolves if the sink writer stops on a write failure.
    ///
    /// Never resolves on a clean shutdown.
    pub async fn failed(&self) {
        self.failed.cancelled().await;
    }

    /// Whether the sink writer has hit a fatal error.
    pub fn has_failed(&self) -> bool {
        self.failed.is_cancelled()
    }

    /// Wait for both tasks to finish.
    ///
    /// Returns the sink after a clean shutdown, or the fatal sink error.
    pub async fn wait(self) -> Result<W, TelemetryError> {
        // Await both before reporting so neither task is left detached.
        let written = self.writer.await;
        let aggregated = self.aggregator.await;

        let sink = written??;
        if let Err(e) = aggregated? {
            tracing::warn!(error = %e, "Aggregator stopped early");
        }
        Ok(sink)
    }
}
