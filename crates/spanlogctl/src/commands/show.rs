//! Show command implementation.

use anyhow::Result;
use serde::Serialize;
use spanlog::{SinkFormat, SummaryRecord};
use std::path::Path;

use super::{human_duration, read_records};
use crate::OutputFormat;

#[derive(Serialize)]
struct RecordInfo<'a> {
    key: &'a str,
    window_end_ms: i64,
    count: u64,
    failures: u64,
    p95_ns: u128,
    p98_ns: u128,
    p99_ns: u128,
}

/// Records matching `key`, keeping only the last `limit` (0 keeps all).
fn select<'a>(
    records: &'a [SummaryRecord],
    key: Option<&str>,
    limit: usize,
) -> Vec<&'a SummaryRecord> {
    let matching: Vec<_> = records
        .iter()
        .filter(|record| key.map_or(true, |key| record.key == key))
        .collect();
    let skip = if limit == 0 {
        0
    } else {
        matching.len().saturating_sub(limit)
    };
    matching.into_iter().skip(skip).collect()
}

pub fn run(
    file: &Path,
    format: SinkFormat,
    key: Option<&str>,
    limit: usize,
    output: OutputFormat,
) -> Result<()> {
    let records = read_records(file, format)?;
    let selected = select(&records, key, limit);

    match output {
        OutputFormat::Text => {
            if selected.is_empty() {
                println!("No matching summaries.");
                return Ok(());
            }
            println!(
                "{:<32} {:>15} {:>8} {:>12} {:>12} {:>12}",
                "KEY", "WINDOW END", "COUNT", "P95", "P98", "P99"
            );
            println!("{}", "-".repeat(96));
            for record in &selected {
                println!(
                    "{:<32} {:>15} {:>8} {:>12} {:>12} {:>12}",
                    record.key,
                    record.window_end_ms,
                    record.count,
                    human_duration(record.p95),
                    human_duration(record.p98),
                    human_duration(record.p99),
                );
            }
        }
        OutputFormat::Json => {
            let infos: Vec<_> = selected
                .iter()
                .map(|record| RecordInfo {
                    key: &record.key,
                    window_end_ms: record.window_end_ms,
                    count: record.count,
                    failures: record.failures,
                    p95_ns: record.p95.as_nanos(),
                    p98_ns: record.p98.as_nanos(),
                    p99_ns: record.p99.as_nanos(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&infos)?);
        }
    }

    Ok(())
}
