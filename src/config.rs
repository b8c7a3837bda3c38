//! Configuration for the spanlog pipeline and demo binary.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::sink::format::SinkFormat;
use crate::workload::WorkloadConfig;

/// Default capacity of the ingestion queue.
pub const DEFAULT_INGEST_CAPACITY: usize = 10_000;

/// Default capacity of the summary queue.
pub const DEFAULT_SUMMARY_CAPACITY: usize = 10;

/// Default flush interval.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Default maximum number of events drained per aggregator iteration.
pub const DEFAULT_MAX_DRAIN: usize = 1024;

/// Spanlog: timing spans aggregated into percentile summaries.
#[derive(Parser, Debug, Clone)]
#[command(name = "spanlog")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// File that receives one summary line per key per flush
    #[arg(short, long, env = "SPANLOG_OUTPUT", default_value = "log.csv")]
    pub output: PathBuf,

    /// Summary line format (csv, json)
    #[arg(short, long, env = "SPANLOG_FORMAT", default_value = "csv")]
    pub format: SinkFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit diagnostic logs as JSON
    #[arg(long, env = "SPANLOG_LOG_JSON")]
    pub log_json: bool,

    /// Capacity of the ingestion queue (events beyond this are dropped)
    #[arg(long, env = "SPANLOG_INGEST_CAPACITY", default_value_t = DEFAULT_INGEST_CAPACITY)]
    pub ingest_capacity: usize,

    /// Capacity of the summary queue
    #[arg(long, env = "SPANLOG_SUMMARY_CAPACITY", default_value_t = DEFAULT_SUMMARY_CAPACITY)]
    pub summary_capacity: usize,

    /// Flush interval in milliseconds
    #[arg(long, env = "SPANLOG_FLUSH_INTERVAL_MS", default_value_t = 1000)]
    pub flush_interval_ms: u64,

    /// Maximum events drained per aggregator iteration
    #[arg(long, env = "SPANLOG_MAX_DRAIN", default_value_t = DEFAULT_MAX_DRAIN)]
    pub max_drain: usize,

    /// Number of concurrent synthetic request loops
    #[arg(short, long, env = "SPANLOG_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Pause between synthetic requests per worker, in milliseconds
    #[arg(long, env = "SPANLOG_REQUEST_INTERVAL_MS", default_value_t = 10)]
    pub request_interval_ms: u64,

    /// Probability (0.0-1.0) that a simulated data-access call fails
    #[arg(long, env = "SPANLOG_FAILURE_RATE", default_value_t = 0.01)]
    pub failure_rate: f64,

    /// Stop after this many seconds instead of waiting for a signal
    #[arg(long, env = "SPANLOG_DURATION_SECS")]
    pub duration_secs: Option<u64>,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Pipeline settings derived from this configuration.
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            ingest_capacity: self.ingest_capacity,
            summary_capacity: self.summary_capacity,
            flush_interval: Duration::from_millis(self.flush_interval_ms),
            max_drain_per_iteration: self.max_drain,
            format: self.format,
        }
    }

    /// Synthetic workload settings derived from this configuration.
    pub fn workload(&self) -> WorkloadConfig {
        WorkloadConfig {
            workers: self.workers,
            request_interval: Duration::from_millis(self.request_interval_ms),
            failure_rate: self.failure_rate,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: PathBuf::from("log.csv"),
            format: SinkFormat::Csv,
            log_level: "info".into(),
            log_json: false,
            ingest_capacity: DEFAULT_INGEST_CAPACITY,
            summary_capacity: DEFAULT_SUMMARY_CAPACITY,
            flush_interval_ms: 1000,
            max_drain: DEFAULT_MAX_DRAIN,
            workers: 4,
            request_interval_ms: 10,
            failure_rate: 0.01,
            duration_secs: None,
        }
    }
}

/// Settings for the ingestion, aggregation and sink stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryConfig {
    /// Capacity of the producer-facing queue.
    pub ingest_capacity: usize,
    /// Capacity of the aggregator-to-sink queue.
    pub summary_capacity: usize,
    /// Length of one aggregation window.
    pub flush_interval: Duration,
    /// Upper bound on events folded per aggregator iteration.
    pub max_drain_per_iteration: usize,
    /// Line format written by the sink writer.
    pub format: SinkFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            ingest_capacity: DEFAULT_INGEST_CAPACITY,
            summary_capacity: DEFAULT_SUMMARY_CAPACITY,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            max_drain_per_iteration: DEFAULT_MAX_DRAIN,
            format: SinkFormat::Csv,
        }
    }
}

impl TelemetryConfig {
    /// Clamp values that the underlying channels and timers cannot accept.
    ///
    /// Zero capacities become 1, zero drain bounds become 1, and a zero
    /// flush interval becomes 1ms.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            ingest_capacity: self.ingest_capacity.max(1),
            summary_capacity: self.summary_capacity.max(1),
            flush_interval: self.flush_interval.max(Duration::from_millis(1)),
            max_drain_per_iteration: self.max_drain_per_iteration.max(1),
            format: self.format,
        }
    }

    /// Create a test config with small queues.
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            ingest_capacity: 64,
            summary_capacity: 4,
            flush_interval: Duration::from_millis(100),
            max_drain_per_iteration: 16,
            format: SinkFormat::Csv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output, PathBuf::from("log.csv"));
        assert_eq!(config.telemetry(), TelemetryConfig::default());
    }

    #[test]
    fn test_parse_overrides() {
        let config = Config::try_parse_from([
            "spanlog",
            "--output",
            "/tmp/summaries.jsonl",
            "--format",
            "json",
            "--flush-interval-ms",
            "250",
            "--ingest-capacity",
            "128",
        ])
        .unwrap();

        let telemetry = config.telemetry();
        assert_eq!(telemetry.format, SinkFormat::JsonLines);
        assert_eq!(telemetry.flush_interval, Duration::from_millis(250));
        assert_eq!(telemetry.ingest_capacity, 128);
        assert_eq!(telemetry.summary_capacity, DEFAULT_SUMMARY_CAPACITY);
    }

    #[test]
    fn test_normalized_clamps_zeroes() {
        let config = TelemetryConfig {
            ingest_capacity: 0,
            summary_capacity: 0,
            flush_interval: Duration::ZERO,
            max_drain_per_iteration: 0,
            format: SinkFormat::Csv,
        }
        .normalized();

        assert_eq!(config.ingest_capacity, 1);
        assert_eq!(config.summary_capacity, 1);
        assert_eq!(config.flush_interval, Duration::from_millis(1));
        assert_eq!(config.max_drain_per_iteration, 1);
    }
}
