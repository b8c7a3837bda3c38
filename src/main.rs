//! Spanlog demo service: synthetic traffic timed into percentile summaries.
//!
//! # Usage
//!
//! ```bash
//! spanlog --output log.csv --workers 8 --duration-secs 30
//! ```
//!
//! Environment variables can also be used:
//! - `SPANLOG_OUTPUT`: File receiving summary lines
//! - `SPANLOG_FORMAT`: Summary format (csv, json)
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use spanlog::config::Config;
use spanlog::observability::tracing::init_tracing;
use spanlog::{workload, Observability};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  Spanlog v{} - timing spans to percentile summaries

  Configuration:
    Output:     {} ({})
    Flush:      every {}ms
    Workers:    {}
    Log Level:  {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.output.display(),
        config.format,
        config.flush_interval_ms,
        config.workers,
        config.log_level
    );
}

/// Wait for SIGTERM or SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {
                        tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating shutdown...");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = ctrl_c.await;
                tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }
}

/// Resolve after `secs`, or never when no duration is configured.
async fn run_limit(secs: Option<u64>) {
    match secs {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => std::future::pending().await,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    // Initialize tracing/logging
    init_tracing(&config.log_level, config.log_json);

    // Open the summary sink
    let output = tokio::fs::File::create(&config.output).await?;

    print_banner(&config);

    let obs = Observability::new(config.telemetry());
    let cancel = CancellationToken::new();
    let tasks = obs.start_logging(output, cancel.clone())?;

    // Drive synthetic traffic through the pipeline
    let stop_traffic = CancellationToken::new();
    let traffic = tokio::spawn(workload::run(
        obs.clone(),
        config.workload(),
        stop_traffic.clone(),
    ));

    tokio::select! {
        () = shutdown_signal() => {}
        () = run_limit(config.duration_secs) => {
            tracing::info!("Run duration elapsed, initiating shutdown...");
        }
        () = tasks.failed() => {
            tracing::error!("Telemetry sink failed, initiating shutdown...");
        }
    }

    // Stop traffic first so its last spans reach the final flush
    stop_traffic.cancel();
    let requests = traffic.await?;

    cancel.cancel();
    tasks.wait().await?;

    tracing::info!(
        requests,
        accepted = obs.accepted_events(),
        dropped = obs.dropped_events(),
        "Spanlog shutdown complete"
    );
    Ok(())
}
