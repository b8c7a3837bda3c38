//! Summary line formats.
//!
//! CSV (default), one line per record:
//!
//! ```text
//! <key>,<window_end_unix_ms>,<count>,<p99_ns>,<p98_ns>,<p95_ns>
//! ```
//!
//! JSON lines carry the same fields plus the failure count.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::telemetry::SummaryRecord;

/// Number of fields in a CSV summary line.
const CSV_FIELDS: usize = 6;

/// Error type for decoding summary lines.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid JSON line: {0}")]
    Json(#[from] serde_json::Error),
}

/// Line format written by the sink writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SinkFormat {
    #[default]
    Csv,
    JsonLines,
}

impl FromStr for SinkFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" | "jsonl" => Ok(Self::JsonLines),
            _ => Err(format!("unknown summary format: {s}")),
        }
    }
}

impl fmt::Display for SinkFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::JsonLines => f.write_str("json"),
        }
    }
}

/// JSON representation of one record.
#[derive(Debug, Serialize, Deserialize)]
struct SummaryLine<'a> {
    #[serde(borrow)]
    key: Cow<'a, str>,
    window_end_ms: i64,
    count: u64,
    #[serde(default)]
    failures: u64,
    p99_ns: u64,
    p98_ns: u64,
    p95_ns: u64,
}

impl SinkFormat {
    /// Append the newline-terminated encoding of `record` to `buf`.
    pub fn encode(
        self,
        record: &SummaryRecord,
        buf: &mut Vec<u8>,
    ) -> Result<(), serde_json::Error> {
        match self {
            Self::Csv => {
                let line = format!(
                    "{},{},{},{},{},{}\n",
                    csv_key(&record.key),
                    record.window_end_ms,
                    record.count,
                    as_nanos(record.p99),
                    as_nanos(record.p98),
                    as_nanos(record.p95),
                );
                buf.extend_from_slice(line.as_bytes());
            }
            Self::JsonLines => {
                let line = SummaryLine {
                    key: Cow::Borrowed(record.key.as_str()),
                    window_end_ms: record.window_end_ms,
                    count: record.count,
                    failures: record.failures,
                    p99_ns: as_nanos(record.p99),
                    p98_ns: as_nanos(record.p98),
                    p95_ns: as_nanos(record.p95),
                };
                serde_json::to_writer(&mut *buf, &line)?;
                buf.push(b'\n');
            }
        }
        Ok(())
    }

    /// Decode one line (with or without its trailing newline).
    ///
    /// CSV lines do not carry a failure count; it decodes as 0.
    pub fn decode_line(self, line: &str) -> Result<SummaryRecord, ParseError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        match self {
            Self::Csv => decode_csv(line),
            Self::JsonLines => {
                let parsed: SummaryLine<'_> = serde_json::from_str(line)?;
                Ok(SummaryRecord {
                    key: parsed.key.into_owned(),
                    window_end_ms: parsed.window_end_ms,
                    count: parsed.count,
                    failures: parsed.failures,
                    p95: Duration::from_nanos(parsed.p95_ns),
                    p98: Duration::from_nanos(parsed.p98_ns),
                    p99: Duration::from_nanos(parsed.p99_ns),
                })
            }
        }
    }
}

fn decode_csv(line: &str) -> Result<SummaryRecord, ParseError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != CSV_FIELDS {
        return Err(ParseError::FieldCount {
            expected: CSV_FIELDS,
            found: fields.len(),
        });
    }

    Ok(SummaryRecord {
        key: fields[0].to_string(),
        window_end_ms: number(fields[1], "window end")?,
        count: number(fields[2], "count")?,
        failures: 0,
        p99: Duration::from_nanos(number(fields[3], "p99")?),
        p98: Duration::from_nanos(number(fields[4], "p98")?),
        p95: Duration::from_nanos(number(fields[5], "p95")?),
    })
}

fn number<T: FromStr>(value: &str, field: &'static str) -> Result<T, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Durations beyond u64 nanoseconds (~584 years) saturate.
fn as_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Replace characters that would break the CSV line structure.
fn csv_key(key: &str) -> Cow<'_, str> {
    if key.contains([',', '\n', '\r']) {
        Cow::Owned(key.replace([',', '\n', '\r'], "_"))
    } else {
        Cow::Borrowed(key)
    }
}
