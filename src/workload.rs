//! Synthetic request workload for the demo binary.
//!
//! Each worker repeatedly serves a dashboard request: the handler span wraps
//! two concurrent simulated data-access calls, each under its own span, with
//! random latency and a configurable failure rate.

use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::telemetry::Observability;

/// Span key of the request handler.
pub const HANDLER_KEY: &str = "handler.user_dashboard";
/// Span key of the article feed query.
pub const ARTICLE_FEED_KEY: &str = "db.get_article_feed";
/// Span key of the care plan query.
pub const CARE_PLAN_KEY: &str = "db.get_care_plan_steps";

/// Chance that a simulated call lands in the slow tail.
const SLOW_TAIL_RATE: f64 = 0.02;

/// Settings for the synthetic workload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkloadConfig {
    /// Number of concurrent request loops.
    pub workers: usize,
    /// Pause between requests within one loop.
    pub request_interval: Duration,
    /// Probability that a simulated data-access call fails.
    pub failure_rate: f64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            request_interval: Duration::from_millis(10),
            failure_rate: 0.01,
        }
    }
}

/// Failure returned by a simulated operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("simulated failure in {0}")]
    Simulated(&'static str),
}

/// Planned behaviour of one simulated call.
#[derive(Debug, Clone, Copy)]
struct Call {
    latency: Duration,
    fail: bool,
}

impl Call {
    fn plan(rng: &mut fastrand::Rng, base_ms: std::ops::Range<u64>, failure_rate: f64) -> Self {
        let mut micros = rng.u64(base_ms.start * 1000..base_ms.end * 1000);
        if rng.f64() < SLOW_TAIL_RATE {
            micros *= 10;
        }
        Self {
            latency: Duration::from_micros(micros),
            fail: rng.f64() < failure_rate,
        }
    }
}

/// Drive the workload until `cancel` fires.
///
/// Returns the number of handler requests completed.
pub async fn run(obs: Observability, config: WorkloadConfig, cancel: CancellationToken) -> u64 {
    let failure_rate = config.failure_rate.clamp(0.0, 1.0);
    let mut workers = JoinSet::new();

    for worker in 0..config.workers.max(1) {
        let obs = obs.clone();
        let cancel = cancel.clone();
        workers.spawn(async move {
            let mut rng = fastrand::Rng::new();
            let mut completed = 0u64;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(config.request_interval) => {}
                }

                let feed = Call::plan(&mut rng, 1..20, failure_rate);
                let steps = Call::plan(&mut rng, 1..10, failure_rate);
                if let Err(e) = user_dashboard(&obs, feed, steps).await {
                    tracing::trace!(worker, error = %e, "Request failed");
                }
                completed += 1;
            }
            completed
        });
    }

    tracing::info!(workers = config.workers.max(1), "Synthetic workload started");

    let mut total = 0;
    while let Some(result) = workers.join_next().await {
        match result {
            Ok(completed) => total += completed,
            Err(e) => tracing::error!(error = %e, "Workload worker failed"),
        }
    }

    tracing::info!(requests = total, "Synthetic workload stopped");
    total
}

/// Serve one dashboard request.
async fn user_dashboard(
    obs: &Observability,
    feed: Call,
    steps: Call,
) -> Result<(), OperationError> {
    let mut span = obs.start_span(HANDLER_KEY);

    let (articles, care_plan) = tokio::join!(
        simulated_query(obs, ARTICLE_FEED_KEY, feed),
        simulated_query(obs, CARE_PLAN_KEY, steps),
    );
    let result = articles.and(care_plan);

    span.finish(&result);
    result
}

async fn simulated_query(
    obs: &Observability,
    key: &'static str,
    call: Call,
) -> Result<(), OperationError> {
    let mut span = obs.start_span(key);
    tokio::time::sleep(call.latency).await;

    let result = if call.fail {
        Err(OperationError::Simulated(key))
    } else {
        Ok(())
    };
    span.finish(&result);
    result
}
