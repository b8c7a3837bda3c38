//! Telemetry surface used by the rest of the application.
//!
//! Instrumented code only needs [`Observability::start_span`] and
//! [`Span::done`]. The lifecycle owner calls
//! [`Observability::start_logging`] with an output stream and a
//! cancellation token, then awaits [`LoggingTasks::wait`].
//!
//! ```no_run
//! use spanlog::{Observability, TelemetryConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), spanlog::TelemetryError> {
//! let obs = Observability::new(TelemetryConfig::default());
//! let cancel = CancellationToken::new();
//! let file = tokio::fs::File::create("log.csv").await.expect("create log file");
//! let tasks = obs.start_logging(file, cancel.clone())?;
//!
//! let mut span = obs.start_span("db.get_article_feed");
//! // ... do the work ...
//! span.done(false);
//!
//! cancel.cancel();
//! tasks.wait().await?;
//! # Ok(())
//! # }
//! ```

pub mod event;
pub mod facade;
pub mod span;

pub use event::{RawEvent, SummaryRecord};
pub use facade::{LoggingTasks, Observability, TelemetryError};
pub use span::Span;
