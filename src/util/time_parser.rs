//! Parser for the snapshot timestamps written by the collector.
//!
//! The canonical stored form is naive ISO 8601 without a timezone suffix, so
//! that lexicographic and chronological order agree:
//! - `2026-02-07T17:00:00`
//! - `2026-02-07T17:00:00.123456` (fraction is kept for ordering, ignored for display)
//!
//! For robustness the parser also accepts a space separator and RFC 3339
//! values with an offset, which are read as wall-clock time in that offset.

use chrono::{DateTime, NaiveDateTime};

/// Canonical format for stored snapshot timestamps.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Error type for timestamp parsing failures.
#[derive(Debug, Clone)]
pub struct TimeParseError {
    pub input: String,
    pub message: String,
}

impl std::fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse timestamp '{}': {}", self.input, self.message)
    }
}

impl std::error::Error for TimeParseError {}

/// Parse a stored snapshot timestamp.
///
/// # Supported formats
///
/// | Format | Example |
/// |--------|---------|
/// | ISO 8601 | `2026-02-07T17:00:00` |
/// | ISO 8601 + fraction | `2026-02-07T17:00:00.250` |
/// | Space separator | `2026-02-07 17:00:00` |
/// | RFC 3339 | `2026-02-07T17:00:00+01:00` |
///
/// # Examples
///
/// ```
/// use mayordomo::util::parse_snapshot_timestamp;
///
/// let ts = parse_snapshot_timestamp("2026-02-07T17:00:00.5").unwrap();
/// assert_eq!(ts.format("%H:%M:%S").to_string(), "17:00:00");
/// ```
pub fn parse_snapshot_timestamp(input: &str) -> Result<NaiveDateTime, TimeParseError> {
    let input = input.trim();

    if let Some(ts) = try_parse_naive(input) {
        return Ok(ts);
    }

    if let Some(ts) = try_parse_rfc3339(input) {
        return Ok(ts);
    }

    Err(TimeParseError {
        input: input.to_string(),
        message: "Unrecognized format. Use ISO 8601 (2026-02-07T17:00:00)".to_string(),
    })
}

/// Try to parse as naive ISO 8601 with `T` or space separator.
fn try_parse_naive(input: &str) -> Option<NaiveDateTime> {
    if let Ok(ndt) = NaiveDateTime::parse_from_str(input, SNAPSHOT_TIMESTAMP_FORMAT) {
        return Some(ndt);
    }

    NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f").ok()
}

/// Try to parse as RFC 3339, keeping the wall-clock time of its offset.
fn try_parse_rfc3339(input: &str) -> Option<NaiveDateTime> {
    let normalized = input.replacen(' ', "T", 1);
    DateTime::parse_from_rfc3339(&normalized)
        .ok()
        .map(|dt| dt.naive_local())
}
