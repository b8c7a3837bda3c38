//! Sink writer task.
//!
//! Single consumer of the summary queue and sole owner of the output
//! stream while it runs. Records already waiting in the queue are encoded
//! together and written with one `write_all` + `flush`.
//!
//! A write failure is fatal: the task stops, drops the queue (which stops
//! the aggregator) and returns the error to whoever awaits it.

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::Receiver;

use super::format::SinkFormat;
use crate::telemetry::SummaryRecord;

/// Error type for the sink writer.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write summaries: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to encode summary: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persists summary records to an injected byte sink.
pub struct SinkWriter<W> {
    sink: W,
    summaries: Receiver<SummaryRecord>,
    format: SinkFormat,
    buf: Vec<u8>,
    written: u64,
}

impl<W> SinkWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Create a writer draining `summaries` into `sink`.
    pub fn new(sink: W, summaries: Receiver<SummaryRecord>, format: SinkFormat) -> Self {
        Self {
            sink,
            summaries,
            format,
            buf: Vec::with_capacity(1024),
            written: 0,
        }
    }

    /// Write records until the summary queue closes, then hand the sink back.
    pub async fn run(mut self) -> Result<W, SinkError> {
        tracing::debug!(format = %self.format, "Sink writer started");

        while let Some(record) = self.summaries.recv().await {
            self.buf.clear();
            let mut batch = 1;
            self.format.encode(&record, &mut self.buf)?;
            while let Ok(record) = self.summaries.try_recv() {
                self.format.encode(&record, &mut self.buf)?;
                batch += 1;
            }

            if let Err(e) = self.write_buffered().await {
                tracing::error!(
                    error = %e,
                    pending = batch,
                    "Sink write failed, stopping telemetry persistence"
                );
                return Err(e.into());
            }
            self.written += batch;
        }

        self.sink.flush().await?;
        tracing::debug!(records = self.written, "Sink writer stopped");
        Ok(self.sink)
    }

    async fn write_buffered(&mut self) -> std::io::Result<()> {
        self.sink.write_all(&self.buf).await?;
        self.sink.flush().await
    }
}
