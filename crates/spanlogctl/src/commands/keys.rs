//! Keys command implementation.

use anyhow::Result;
use serde::Serialize;
use spanlog::{SinkFormat, SummaryRecord};
use std::collections::BTreeMap;
use std::path::Path;

use super::{human_duration, read_records};
use crate::OutputFormat;

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
struct KeyInfo {
    key: String,
    windows: u64,
    events: u64,
    failures: u64,
    max_p99_ns: u64,
    last_window_end_ms: i64,
}

#[derive(Serialize)]
struct KeysOutput {
    keys: Vec<KeyInfo>,
    total: usize,
}

fn summarize(records: &[SummaryRecord]) -> Vec<KeyInfo> {
    let mut by_key: BTreeMap<&str, KeyInfo> = BTreeMap::new();
    for record in records {
        let info = by_key.entry(record.key.as_str()).or_insert_with(|| KeyInfo {
            key: record.key.clone(),
            ..KeyInfo::default()
        });
        info.windows += 1;
        info.events += record.count;
        info.failures += record.failures;
        info.max_p99_ns = info
            .max_p99_ns
            .max(u64::try_from(record.p99.as_nanos()).unwrap_or(u64::MAX));
        info.last_window_end_ms = info.last_window_end_ms.max(record.window_end_ms);
    }
    by_key.into_values().collect()
}

pub fn run(file: &Path, format: SinkFormat, output: OutputFormat) -> Result<()> {
    let records = read_records(file, format)?;
    let keys = summarize(&records);
    let output_data = KeysOutput {
        total: keys.len(),
        keys,
    };

    match output {
        OutputFormat::Text => {
            if output_data.keys.is_empty() {
                println!("No summaries found.");
            } else {
                println!(
                    "{:<40} {:>8} {:>10} {:>12}",
                    "KEY", "WINDOWS", "EVENTS", "MAX P99"
                );
                println!("{}", "-".repeat(73));
                for info in &output_data.keys {
                    println!(
                        "{:<40} {:>8} {:>10} {:>12}",
                        info.key,
                        info.windows,
                        info.events,
                        human_duration(std::time::Duration::from_nanos(info.max_p99_ns))
                    );
                }
                println!();
                println!("Total: {} key(s)", output_data.total);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output_data)?);
        }
    }

    Ok(())
}
