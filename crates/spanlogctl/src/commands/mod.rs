//! Subcommand implementations.

pub mod keys;
pub mod show;

use anyhow::{Context, Result};
use spanlog::{SinkFormat, SummaryRecord};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Read every record in a summary file, skipping blank lines.
pub fn read_records(path: &Path, format: SinkFormat) -> Result<Vec<SummaryRecord>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read summary file: {}", path.display()))?;
    parse_records(&contents, format).with_context(|| format!("in {}", path.display()))
}

/// Parse summary lines, reporting the 1-based line number of the first bad one.
pub fn parse_records(contents: &str, format: SinkFormat) -> Result<Vec<SummaryRecord>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            format
                .decode_line(line)
                .with_context(|| format!("invalid summary on line {}", index + 1))
        })
        .collect()
}

/// Render a duration in the most readable unit.
pub fn human_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos < 1_000 {
        format!("{nanos}ns")
    } else if nanos < 1_000_000 {
        format!("{:.1}µs", nanos as f64 / 1e3)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1e6)
    } else {
        format!("{:.2}s", nanos as f64 / 1e9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_skips_blank_lines() {
        let contents = "a,1,2,30,20,10\n\nb,2,1,5,5,5\n";
        let records = parse_records(contents, SinkFormat::Csv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].key, "b");
    }

    #[test]
    fn test_parse_records_reports_line_number() {
        let err = parse_records("a,1,2,30,20,10\nbroken\n", SinkFormat::Csv).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_read_records_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "a,1,2,30,20,10\n").unwrap();

        let records = read_records(&path, SinkFormat::Csv).unwrap();
        assert_eq!(records[0].count, 2);
    }

    #[test]
    fn test_human_duration() {
        assert_eq!(human_duration(Duration::from_nanos(900)), "900ns");
        assert_eq!(human_duration(Duration::from_micros(15)), "15.0µs");
        assert_eq!(human_duration(Duration::from_millis(3)), "3.00ms");
        assert_eq!(human_duration(Duration::from_secs(2)), "2.00s");
    }
}
