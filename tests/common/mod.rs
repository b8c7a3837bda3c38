//! Test utilities for spanlog integration tests.
//!
//! Provides:
//! - Temporary summary file fixtures
//! - Failing sinks
//! - Summary parsing helpers

#![allow(dead_code)]

use spanlog::{SinkFormat, SummaryRecord};
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tempfile::TempDir;
use tokio::io::AsyncWrite;

/// Test fixture that manages a temporary summary file.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory holding the summary file
    pub temp_dir: TempDir,
    /// Path to the summary file
    pub output_path: PathBuf,
}

impl TestFixture {
    /// Create a new fixture with a summary file path inside a temp directory.
    pub fn new() -> Self {
        spanlog::observability::tracing::init_test_tracing();
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let output_path = temp_dir.path().join("log.csv");
        Self {
            temp_dir,
            output_path,
        }
    }

    /// Read back every record written to the summary file.
    pub fn read_records(&self, format: SinkFormat) -> Vec<SummaryRecord> {
        let contents = std::fs::read_to_string(&self.output_path).expect("failed to read output");
        parse(contents.as_bytes(), format)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode summary lines from raw sink output.
pub fn parse(output: &[u8], format: SinkFormat) -> Vec<SummaryRecord> {
    std::str::from_utf8(output)
        .expect("sink output is not UTF-8")
        .lines()
        .map(|line| format.decode_line(line).expect("invalid summary line"))
        .collect()
}

/// Sink that rejects every write, as a full disk or closed socket would.
pub struct BrokenSink;

impl AsyncWrite for BrokenSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Sink whose first write panics, standing in for a buggy writer.
pub struct PanickingSink;

impl AsyncWrite for PanickingSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        panic!("sink exploded");
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Wait for a condition to become true with timeout.
///
/// # Returns
///
/// `true` if condition was met, `false` if timeout expired
pub async fn wait_for<F>(timeout: std::time::Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.temp_dir.path().exists());
        assert!(fixture.output_path.ends_with("log.csv"));
    }
}
