//! Summary persistence.
//!
//! Provides:
//! - CSV and JSON-lines encodings of summary records
//! - The sink writer task that owns the output stream

pub mod format;
pub mod writer;

pub use format::{ParseError, SinkFormat};
pub use writer::{SinkError, SinkWriter};
