//! Bar CSV loader.
//!
//! Required columns (any order, extra columns ignored):
//! `symbol,timestamp,open,high,low,close,volume`
//!
//! `timestamp` accepts:
//! - RFC 3339 with offset (`2024-01-08T14:30:00Z`, `...-05:00`): zoned
//! - `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`: naive, read as UTC
//! - empty: the bar has no timestamp and strategies will skip it
//!
//! Rows are returned in file order. Nothing is sorted or de-duplicated; the
//! file is expected to already be time-ordered per symbol.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use pbd_strategy::{Bar, BarTimestamp};
use serde::Deserialize;

use crate::types::ReplayBar;

const REQUIRED_COLUMNS: [&str; 7] = ["symbol", "timestamp", "open", "high", "low", "close", "volume"];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    EmptyInput,
    MissingHeader(&'static str),
    /// `line` is 1-based and counts the header.
    BadRow { line: u64, reason: String },
    Io(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::EmptyInput => write!(f, "empty input"),
            LoadError::MissingHeader(h) => write!(f, "missing header: {h}"),
            LoadError::BadRow { line, reason } => write!(f, "bad row at line {line}: {reason}"),
            LoadError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    symbol: String,
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

pub fn load_csv_file(path: impl AsRef<Path>) -> Result<Vec<ReplayBar>, LoadError> {
    let s = std::fs::read_to_string(path)?;
    parse_csv_bars(&s)
}

pub fn parse_csv_bars(input: &str) -> Result<Vec<ReplayBar>, LoadError> {
    let input = input.trim_start_matches('\u{feff}');
    if input.trim().is_empty() {
        return Err(LoadError::EmptyInput);
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(input.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| LoadError::BadRow {
            line: 1,
            reason: e.to_string(),
        })?
        .clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(LoadError::MissingHeader(col));
        }
    }

    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(|e| LoadError::BadRow {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            reason: e.to_string(),
        })?;
        let line = rec.position().map(|p| p.line()).unwrap_or(0);
        let bad = |reason: String| LoadError::BadRow { line, reason };

        let row: CsvRow = rec
            .deserialize(Some(&headers))
            .map_err(|e| bad(e.to_string()))?;

        if row.symbol.is_empty() {
            return Err(bad("symbol is empty".to_string()));
        }
        let timestamp = parse_timestamp(&row.timestamp)
            .map_err(|v| bad(format!("unrecognized timestamp: {v}")))?;

        out.push(ReplayBar {
            symbol: row.symbol,
            bar: Bar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            },
        });
    }

    Ok(out)
}

/// `Ok(None)` for an empty field; `Err` echoes the rejected text.
pub fn parse_timestamp(raw: &str) -> Result<Option<BarTimestamp>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(BarTimestamp::Zoned(dt)));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .map(|n| Some(BarTimestamp::Naive(n)))
        .ok_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_all_timestamp_shapes() {
        assert!(matches!(
            parse_timestamp("2024-01-08T14:30:00Z"),
            Ok(Some(BarTimestamp::Zoned(_)))
        ));
        assert!(matches!(
            parse_timestamp("2024-01-08T09:30:00-05:00"),
            Ok(Some(BarTimestamp::Zoned(_)))
        ));
        assert!(matches!(
            parse_timestamp("2024-01-08 14:30:00"),
            Ok(Some(BarTimestamp::Naive(_)))
        ));
        assert!(matches!(
            parse_timestamp("2024-01-08T14:30:00"),
            Ok(Some(BarTimestamp::Naive(_)))
        ));
        assert_eq!(parse_timestamp("  "), Ok(None));
        assert_eq!(parse_timestamp("yesterday"), Err("yesterday".to_string()));
    }

    #[test]
    fn header_only_is_not_an_error() {
        let bars = parse_csv_bars("symbol,timestamp,open,high,low,close,volume\n").unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn blank_input_is_empty() {
        assert_eq!(parse_csv_bars("\n  \n"), Err(LoadError::EmptyInput));
    }
}
