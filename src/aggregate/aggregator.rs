//! Aggregator task: folds raw events into windows and emits summaries.
//!
//! The loop waits on a single `select!` over cancellation, the flush timer
//! and the ingestion queue, so it never spins while idle. Flushes are
//! awaited inline, which means every record of window N is queued for the
//! sink writer before window N+1 starts draining.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::window::Windows;
use crate::config::TelemetryConfig;
use crate::flow::IngestStats;
use crate::now_millis;
use crate::telemetry::{RawEvent, SummaryRecord};

/// Error type for the aggregator task.
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("summary queue closed, sink writer is gone")]
    SummaryQueueClosed,
}

/// Single consumer of the ingestion queue.
pub struct Aggregator {
    events: Receiver<RawEvent>,
    summaries: Sender<SummaryRecord>,
    stats: Arc<IngestStats>,
    windows: Windows,
    flush_interval: Duration,
    max_drain: usize,
    /// Drop counter value at the previous flush.
    last_dropped: u64,
}

impl Aggregator {
    /// Create an aggregator reading `events` and writing to `summaries`.
    ///
    /// Zero drain bounds and intervals are clamped as in
    /// [`TelemetryConfig::normalized`].
    pub fn new(
        events: Receiver<RawEvent>,
        summaries: Sender<SummaryRecord>,
        stats: Arc<IngestStats>,
        config: &TelemetryConfig,
    ) -> Self {
        let config = config.normalized();
        let last_dropped = stats.dropped();
        Self {
            events,
            summaries,
            stats,
            windows: Windows::new(),
            flush_interval: config.flush_interval,
            max_drain: config.max_drain_per_iteration,
            last_dropped,
        }
    }

    /// Run until `cancel` fires, then flush what was already accepted.
    ///
    /// Returns an error only if the sink writer has gone away.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), AggregatorError> {
        let mut ticker = interval_at(Instant::now() + self.flush_interval, self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut batch = Vec::with_capacity(self.max_drain);

        tracing::debug!(
            flush_interval_ms = self.flush_interval.as_millis() as u64,
            max_drain = self.max_drain,
            "Aggregator started"
        );

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::debug!("Cancellation received, running final flush");
                    break;
                }
                _ = ticker.tick() => {
                    self.flush().await?;
                }
                received = self.events.recv_many(&mut batch, self.max_drain) => {
                    if received == 0 {
                        tracing::debug!("Ingestion queue closed, running final flush");
                        break;
                    }
                    for event in batch.drain(..) {
                        self.windows.fold(event);
                    }
                }
            }
        }

        self.shutdown().await
    }

    /// Stop accepting events, fold the ones already queued and flush.
    async fn shutdown(mut self) -> Result<(), AggregatorError> {
        self.events.close();
        while let Ok(event) = self.events.try_recv() {
            self.windows.fold(event);
        }

        self.flush().await?;
        tracing::debug!(
            accepted = self.stats.accepted(),
            dropped = self.stats.dropped(),
            "Aggregator stopped"
        );
        Ok(())
    }

    /// Close all windows and queue one record per non-empty key.
    async fn flush(&mut self) -> Result<(), AggregatorError> {
        let dropped = self.stats.dropped();
        if dropped > self.last_dropped {
            tracing::warn!(
                dropped = dropped - self.last_dropped,
                total_dropped = dropped,
                "Events dropped at ingestion since last flush"
            );
            self.last_dropped = dropped;
        }

        if self.windows.is_empty() {
            return Ok(());
        }

        let events = self.windows.event_count();
        let records = self.windows.take_summaries(now_millis());
        tracing::trace!(events, keys = records.len(), "Flushing windows");

        for record in records {
            self.summaries
                .send(record)
                .await
                .map_err(|_| AggregatorError::SummaryQueueClosed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{ingest_queue, IngestHandle};
    use tokio::sync::mpsc;

    fn spawn_aggregator(
        config: TelemetryConfig,
    ) -> (
        IngestHandle,
        mpsc::Receiver<SummaryRecord>,
        CancellationToken,
        tokio::task::JoinHandle<Result<(), AggregatorError>>,
    ) {
        let (ingest, events) = ingest_queue(config.ingest_capacity);
        let (summary_tx, summary_rx) = mpsc::channel(config.summary_capacity);
        let aggregator = Aggregator::new(events, summary_tx, ingest.stats().clone(), &config);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(aggregator.run(cancel.clone()));
        (ingest, summary_rx, cancel, task)
    }

    fn init() {
        crate::observability::tracing::init_test_tracing();
    }

    fn event(key: &'static str, nanos: u64) -> RawEvent {
        RawEvent::new(key, 0, Duration::from_nanos(nanos), false)
    }

    async fn collect(mut rx: mpsc::Receiver<SummaryRecord>) -> Vec<SummaryRecord> {
        let mut records = Vec::new();
        while let Some(record) = rx.recv().await {
            records.push(record);
        }
        records
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_emits_one_record_per_key() {
        let config = TelemetryConfig::test_config();
        let (ingest, mut rx, cancel, task) = spawn_aggregator(config);

        for n in 1..=5 {
            ingest.submit(event("a", n));
        }
        ingest.submit(event("b", 9));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!((first.key.as_str(), first.count), ("a", 5));
        assert_eq!((second.key.as_str(), second.count), ("b", 1));

        cancel.cancel();
        task.await.unwrap().unwrap();
        assert!(collect(rx).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_ticks_emit_nothing() {
        let config = TelemetryConfig::test_config();
        let (_ingest, rx, cancel, task) = spawn_aggregator(config);

        tokio::time::sleep(config.flush_interval * 5).await;
        cancel.cancel();
        task.await.unwrap().unwrap();

        assert!(collect(rx).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_windows_do_not_mix() {
        let config = TelemetryConfig::test_config();
        let (ingest, rx, cancel, task) = spawn_aggregator(config);

        for _ in 0..3 {
            ingest.submit(event("k", 10));
        }
        tokio::time::sleep(config.flush_interval + config.flush_interval / 2).await;
        for _ in 0..2 {
            ingest.submit(event("k", 20));
        }
        cancel.cancel();
        task.await.unwrap().unwrap();

        let records = collect(rx).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].count, 3);
        assert_eq!(records[0].p99, Duration::from_nanos(10));
        assert_eq!(records[1].count, 2);
        assert_eq!(records[1].p99, Duration::from_nanos(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_flushes_queued_events() {
        let config = TelemetryConfig {
            flush_interval: Duration::from_secs(3600),
            ..TelemetryConfig::test_config()
        };
        let (ingest, rx, cancel, task) = spawn_aggregator(config);

        for n in 0..40 {
            ingest.submit(event("late", n));
        }
        cancel.cancel();
        task.await.unwrap().unwrap();

        let records = collect(rx).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].count, 40);

        // The queue is closed after shutdown.
        assert!(!ingest.submit(event("late", 1)));
        assert_eq!(ingest.stats().dropped(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_drain_bound_keeps_running() {
        init();
        let config = TelemetryConfig {
            max_drain_per_iteration: 0,
            ..TelemetryConfig::test_config()
        };
        let (ingest, mut rx, cancel, task) = spawn_aggregator(config);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());
        assert!(ingest.submit(event("k", 5)));
        assert!(ingest.submit(event("k", 6)));

        let record = rx.recv().await.unwrap();
        assert_eq!((record.key.as_str(), record.count), ("k", 2));

        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_steady_stream_does_not_starve_ticks() {
        init();
        let config = TelemetryConfig::test_config();
        let (ingest, rx, cancel, task) = spawn_aggregator(config);
        let collector = tokio::spawn(collect(rx));

        // Keep the queue busy across several windows: each burst exceeds
        // one drain, and a new burst lands every millisecond.
        let producer = tokio::spawn({
            let ingest = ingest.clone();
            async move {
                let deadline = Instant::now() + config.flush_interval * 5;
                while Instant::now() < deadline {
                    for n in 0..config.max_drain_per_iteration * 2 {
                        ingest.submit(event("hot", n as u64));
                    }
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        });
        producer.await.unwrap();
        cancel.cancel();
        task.await.unwrap().unwrap();

        let records = collector.await.unwrap();
        assert!(records.len() > 1, "expected several windows, got {}", records.len());
        let total: u64 = records.iter().map(|r| r.count).sum();
        assert_eq!(total, ingest.stats().accepted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_summary_queue_stops_aggregator() {
        let config = TelemetryConfig::test_config();
        let (ingest, rx, _cancel, task) = spawn_aggregator(config);
        drop(rx);

        ingest.submit(event("orphan", 1));
        let result = task.await.unwrap();
        assert!(matches!(result, Err(AggregatorError::SummaryQueueClosed)));
    }
}
