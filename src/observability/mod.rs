//! Diagnostic logging for spanlog itself.
//!
//! Provides:
//! - Structured tracing setup for the binaries
//! - A quiet subscriber for tests

pub mod tracing;
