//! Formatting of raw stored values into display strings.
//!
//! Nothing here fails: values that cannot be coerced to a number become
//! [`NOT_AVAILABLE`], and null values become [`Formatted::Missing`] so the
//! caller can word that case itself.

use std::collections::BTreeMap;

use crate::storage::{Column, MetricValue, MetricsRow};
use crate::util::parse_snapshot_timestamp;

/// Sentinel shown when a value is present but not numeric.
pub const NOT_AVAILABLE: &str = "N/A";

/// Bytes per binary megabyte, used for network counters.
pub const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

/// Display format for snapshot timestamps.
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%H:%M:%S %d/%m/%Y";

/// How a stored column is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Percent,
    Megahertz,
    Gigabytes,
    /// Raw byte count shown in binary megabytes.
    Megabytes,
    Celsius,
    Watts,
    /// Passed through verbatim (hostnames, user names).
    Text,
    /// Parsed and re-rendered with [`DISPLAY_TIMESTAMP_FORMAT`].
    Timestamp,
}

impl Unit {
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Percent => "%",
            Unit::Megahertz => "MHz",
            Unit::Gigabytes => "GB",
            Unit::Megabytes => "MB",
            Unit::Celsius => "°C",
            Unit::Watts => "W",
            Unit::Text | Unit::Timestamp => "",
        }
    }

    pub fn is_byte_count(self) -> bool {
        matches!(self, Unit::Megabytes)
    }
}

/// Result of formatting one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatted {
    /// The stored value was null.
    Missing,
    Value(String),
}

impl Formatted {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Formatted::Missing => None,
            Formatted::Value(s) => Some(s),
        }
    }
}

/// Why a value could not be read as a number.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoercionError {
    #[error("valor nulo")]
    Null,
    #[error("'{0}' no es un número")]
    NotNumeric(String),
    #[error("{0} no es un número finito")]
    NotFinite(f64),
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Coerce a stored value to a finite `f64`.
///
/// Text is trimmed and parsed, so `" 42.5 "` coerces but `"abc"`, `"N/A"`,
/// `"nan"` and `"inf"` do not.
pub fn coerce_f64(raw: &MetricValue) -> Result<f64, CoercionError> {
    let value = match raw {
        MetricValue::Null => return Err(CoercionError::Null),
        MetricValue::Integer(i) => *i as f64,
        MetricValue::Real(f) => *f,
        MetricValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| CoercionError::NotNumeric(s.clone()))?,
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoercionError::NotFinite(value))
    }
}

// ---------------------------------------------------------------------------
// Value formatting
// ---------------------------------------------------------------------------

/// Format a numeric value with 2 decimals and a unit suffix.
///
/// `"42.00 %"`, `"2.00 MB"` (from 2097152 bytes with `is_byte_count`),
/// `"N/A"` for non-numeric input.
pub fn format_value(raw: &MetricValue, suffix: &str, is_byte_count: bool) -> Formatted {
    if raw.is_null() {
        return Formatted::Missing;
    }

    let Ok(mut value) = coerce_f64(raw) else {
        return Formatted::Value(NOT_AVAILABLE.to_string());
    };

    if is_byte_count {
        value /= BYTES_PER_MEGABYTE;
    }

    if suffix.is_empty() {
        Formatted::Value(format!("{:.2}", value))
    } else {
        Formatted::Value(format!("{:.2} {}", value, suffix))
    }
}

/// Pass a textual value through without numeric coercion.
pub fn format_text(raw: &MetricValue) -> Formatted {
    match raw {
        MetricValue::Null => Formatted::Missing,
        MetricValue::Integer(i) => Formatted::Value(i.to_string()),
        MetricValue::Real(f) => Formatted::Value(f.to_string()),
        MetricValue::Text(s) => Formatted::Value(s.clone()),
    }
}

/// Render a stored timestamp as `HH:MM:SS DD/MM/YYYY`.
///
/// Unparseable input is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    match parse_snapshot_timestamp(raw) {
        Ok(ts) => ts.format(DISPLAY_TIMESTAMP_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Format a value according to its column unit.
pub fn format_metric(raw: &MetricValue, unit: Unit) -> Formatted {
    match unit {
        Unit::Text => format_text(raw),
        Unit::Timestamp => match raw {
            MetricValue::Null => Formatted::Missing,
            MetricValue::Text(s) => Formatted::Value(format_timestamp(s)),
            other => format_text(other),
        },
        numeric => format_value(raw, numeric.suffix(), numeric.is_byte_count()),
    }
}

// ---------------------------------------------------------------------------
// Whole-row formatting
// ---------------------------------------------------------------------------

/// A metrics row with every field rendered for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattedSnapshot {
    fields: BTreeMap<String, Formatted>,
    timestamp: Option<String>,
}

impl FormattedSnapshot {
    /// Formats every schema column present in `row`.
    pub fn from_row(row: &MetricsRow, schema: &[Column]) -> Self {
        let mut fields = BTreeMap::new();
        let mut timestamp = None;

        for column in schema {
            let Some(raw) = row.get(column.name) else {
                continue;
            };
            let formatted = format_metric(raw, column.unit);
            if column.unit == Unit::Timestamp {
                timestamp = formatted.as_str().map(str::to_string);
            }
            fields.insert(column.name.to_string(), formatted);
        }

        Self { fields, timestamp }
    }

    /// Formatted value of a field, `None` if the row has no such field.
    pub fn get(&self, field: &str) -> Option<&Formatted> {
        self.fields.get(field)
    }

    /// Display form of the snapshot's timestamp, if it had one.
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
