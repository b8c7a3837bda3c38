//! Windowed aggregation of raw timings.
//!
//! Provides:
//! - Per-key windows and the clamped percentile rule
//! - The aggregator task that drains events and flushes on a timer

pub mod aggregator;
pub mod window;

pub use aggregator::{Aggregator, AggregatorError};
pub use window::{percentile, Window, Windows};
