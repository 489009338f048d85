//! Columnar variant: a directory of Parquet snapshot files sharing one schema.
//!
//! The files matched by the glob are treated as one unioned table. The latest
//! row is the one with the greatest timestamp across all of them.

use std::cmp::Ordering;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};
use tracing::{debug, warn};

use super::schema::{METRICS_COLUMNS, TIMESTAMP_COLUMN};
use super::{MetricValue, MetricsRow, ReadError, SnapshotReader};
use crate::util::SNAPSHOT_TIMESTAMP_FORMAT;

/// Default glob for snapshot files inside the directory.
pub const DEFAULT_PATTERN: &str = "*.parquet";

/// Reads the latest row from a directory of Parquet files.
#[derive(Debug, Clone)]
pub struct ParquetReader {
    dir: PathBuf,
    pattern: String,
    table: String,
}

impl ParquetReader {
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            pattern: pattern.into(),
            table: table.into(),
        }
    }

    fn full_pattern(&self) -> String {
        self.dir.join(&self.pattern).to_string_lossy().into_owned()
    }

    /// Glob with the directory part escaped, so only `pattern` is matched.
    fn glob_pattern(&self) -> String {
        let dir = glob::Pattern::escape(&self.dir.to_string_lossy());
        Path::new(&dir).join(&self.pattern).to_string_lossy().into_owned()
    }

    /// Resolves the glob to a sorted list of regular files.
    fn snapshot_files(&self) -> Result<Vec<PathBuf>, ReadError> {
        let mut files = Vec::new();
        for entry in glob::glob(&self.glob_pattern())? {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => debug!(error = %e, "skipping unreadable glob entry"),
            }
        }
        files.sort();
        Ok(files)
    }

    fn scan_file(
        &self,
        path: &Path,
        latest: &mut Option<(Option<String>, Row)>,
    ) -> Result<usize, ReadError> {
        let file = File::open(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = SerializedFileReader::new(file)?;

        let mut scanned = 0;
        for row in reader.get_row_iter(None)? {
            let row = row?;
            scanned += 1;
            let key = timestamp_key(&row);
            let newer = match latest {
                None => true,
                Some((current, _)) => compare_keys(&key, current) == Ordering::Greater,
            };
            if newer {
                *latest = Some((key, row));
            }
        }
        Ok(scanned)
    }

    fn bind_row(&self, row: &Row) -> Result<MetricsRow, ReadError> {
        let mut values = Vec::with_capacity(METRICS_COLUMNS.len());
        for column in &METRICS_COLUMNS {
            match find_field(row, column.name) {
                Some(field) => values.push(field_value(field)),
                None => {
                    return Err(ReadError::SchemaMismatch {
                        table: self.table.clone(),
                        expected: METRICS_COLUMNS.len(),
                        found: values.len(),
                    });
                }
            }
        }
        MetricsRow::from_columns(&self.table, &METRICS_COLUMNS, values)
    }
}

impl SnapshotReader for ParquetReader {
    fn read_latest(&self) -> Result<MetricsRow, ReadError> {
        if !self.dir.is_dir() {
            return Err(ReadError::SourceMissing {
                path: self.dir.clone(),
                table: self.table.clone(),
            });
        }

        let files = self.snapshot_files()?;
        if files.is_empty() {
            return Err(ReadError::NoFilesFound {
                pattern: self.full_pattern(),
                table: self.table.clone(),
            });
        }

        let mut latest = None;
        let mut scanned = 0;
        for path in &files {
            scanned += self.scan_file(path, &mut latest)?;
        }
        debug!(files = files.len(), rows = scanned, "parquet snapshot scan finished");

        match latest {
            Some((_, row)) => self.bind_row(&row),
            None => Err(ReadError::NoRows {
                table: self.table.clone(),
            }),
        }
    }

    fn location(&self) -> &Path {
        &self.dir
    }

    fn table(&self) -> &str {
        &self.table
    }
}

fn find_field<'a>(row: &'a Row, name: &str) -> Option<&'a Field> {
    row.get_column_iter()
        .find(|(column, _)| column.as_str() == name)
        .map(|(_, field)| field)
}

/// Sort key of a row: its timestamp rendered as canonical text, with a
/// space date/time separator replaced by `T`.
fn timestamp_key(row: &Row) -> Option<String> {
    match find_field(row, TIMESTAMP_COLUMN).map(field_value) {
        Some(MetricValue::Text(s)) => Some(s.replace(' ', "T")),
        Some(MetricValue::Integer(i)) => Some(i.to_string()),
        Some(MetricValue::Real(f)) => Some(f.to_string()),
        Some(MetricValue::Null) | None => None,
    }
}

/// Orders keys like `ORDER BY timestamp DESC` does: nulls sort last.
fn compare_keys(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn field_value(field: &Field) -> MetricValue {
    match field {
        Field::Null => MetricValue::Null,
        Field::Bool(b) => MetricValue::Integer(i64::from(*b)),
        Field::Byte(v) => MetricValue::Integer(i64::from(*v)),
        Field::Short(v) => MetricValue::Integer(i64::from(*v)),
        Field::Int(v) => MetricValue::Integer(i64::from(*v)),
        Field::Long(v) => MetricValue::Integer(*v),
        Field::UByte(v) => MetricValue::Integer(i64::from(*v)),
        Field::UShort(v) => MetricValue::Integer(i64::from(*v)),
        Field::UInt(v) => MetricValue::Integer(i64::from(*v)),
        Field::ULong(v) => match i64::try_from(*v) {
            Ok(i) => MetricValue::Integer(i),
            Err(_) => MetricValue::Real(*v as f64),
        },
        Field::Float(v) => MetricValue::Real(f64::from(*v)),
        Field::Double(v) => MetricValue::Real(*v),
        Field::Str(s) => MetricValue::Text(s.clone()),
        Field::TimestampMillis(ms) => match DateTime::from_timestamp_millis(*ms) {
            Some(dt) => MetricValue::Text(dt.naive_utc().format(SNAPSHOT_TIMESTAMP_FORMAT).to_string()),
            None => MetricValue::Integer(*ms),
        },
        Field::TimestampMicros(us) => match DateTime::from_timestamp_micros(*us) {
            Some(dt) => MetricValue::Text(dt.naive_utc().format(SNAPSHOT_TIMESTAMP_FORMAT).to_string()),
            None => MetricValue::Integer(*us),
        },
        other => {
            warn!(field = %other, "unexpected parquet field type, using its text form");
            MetricValue::Text(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ReadFailureKind;
    use parquet::data_type::{ByteArray, ByteArrayType, DoubleType};
    use parquet::file::properties::WriterProperties;
    use parquet::file::writer::SerializedFileWriter;
    use parquet::schema::parser::parse_message_type;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Writes a snapshot file holding one row per `(timestamp, cpu_percent)`.
    /// Text columns get fixed values, other numeric columns get `1.0`.
    fn write_snapshot(path: &Path, columns: &[&str], rows: &[(&str, f64)]) {
        let mut message = String::from("message metricas {\n");
        for name in columns {
            if matches!(*name, "timestamp" | "hostname" | "username") {
                message.push_str(&format!("  OPTIONAL BYTE_ARRAY {name} (UTF8);\n"));
            } else {
                message.push_str(&format!("  OPTIONAL DOUBLE {name};\n"));
            }
        }
        message.push('}');

        let schema = Arc::new(parse_message_type(&message).unwrap());
        let props = Arc::new(WriterProperties::builder().build());
        let file = File::create(path).unwrap();
        let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();
        if rows.is_empty() {
            writer.close().unwrap();
            return;
        }
        let mut group = writer.next_row_group().unwrap();
        let def_levels = vec![1i16; rows.len()];

        let mut idx = 0;
        while let Some(mut column) = group.next_column().unwrap() {
            match columns[idx] {
                "timestamp" => {
                    let values: Vec<ByteArray> =
                        rows.iter().map(|(ts, _)| ByteArray::from(*ts)).collect();
                    column
                        .typed::<ByteArrayType>()
                        .write_batch(&values, Some(&def_levels), None)
                        .unwrap();
                }
                "hostname" | "username" => {
                    let values: Vec<ByteArray> =
                        rows.iter().map(|_| ByteArray::from("djin")).collect();
                    column
                        .typed::<ByteArrayType>()
                        .write_batch(&values, Some(&def_levels), None)
                        .unwrap();
                }
                "cpu_percent" => {
                    let values: Vec<f64> = rows.iter().map(|(_, cpu)| *cpu).collect();
                    column
                        .typed::<DoubleType>()
                        .write_batch(&values, Some(&def_levels), None)
                        .unwrap();
                }
                _ => {
                    let values = vec![1.0f64; rows.len()];
                    column
                        .typed::<DoubleType>()
                        .write_batch(&values, Some(&def_levels), None)
                        .unwrap();
                }
            }
            column.close().unwrap();
            idx += 1;
        }
        group.close().unwrap();
        writer.close().unwrap();
    }

    fn all_columns() -> Vec<&'static str> {
        METRICS_COLUMNS.iter().map(|c| c.name).collect()
    }

    #[test]
    fn test_missing_directory_is_source_missing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("snapshots");
        let reader = ParquetReader::new(&missing, DEFAULT_PATTERN, "metricas");

        let err = reader.read_latest().unwrap_err();
        assert!(matches!(err, ReadError::SourceMissing { .. }));
        assert_eq!(err.kind(), ReadFailureKind::StorageUnavailable);
        assert!(err.to_string().contains("snapshots"));
        assert!(err.to_string().contains("metricas"));
    }

    #[test]
    fn test_no_matching_files_is_distinct_from_no_rows() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a snapshot").unwrap();
        let reader = ParquetReader::new(dir.path(), DEFAULT_PATTERN, "metricas");

        let err = reader.read_latest().unwrap_err();
        assert_eq!(err.kind(), ReadFailureKind::NoFilesFound);
        assert!(err.to_string().contains("*.parquet"));

        write_snapshot(&dir.path().join("empty.parquet"), &all_columns(), &[]);
        let err = reader.read_latest().unwrap_err();
        assert_eq!(err.kind(), ReadFailureKind::NoRows);
    }

    #[test]
    fn test_latest_row_across_files() {
        let dir = TempDir::new().unwrap();
        let columns = all_columns();
        write_snapshot(
            &dir.path().join("a.parquet"),
            &columns,
            &[("2025-03-01T10:00:00", 10.0), ("2025-03-01T13:00:00", 42.0)],
        );
        write_snapshot(
            &dir.path().join("b.parquet"),
            &columns,
            &[("2025-03-01T12:00:00", 20.0)],
        );

        let reader = ParquetReader::new(dir.path(), DEFAULT_PATTERN, "metricas");
        let row = reader.read_latest().unwrap();

        assert_eq!(row.timestamp(), Some(&MetricValue::from("2025-03-01T13:00:00")));
        assert_eq!(row.get("cpu_percent"), Some(&MetricValue::Real(42.0)));
        assert_eq!(row.get("hostname"), Some(&MetricValue::from("djin")));
    }

    #[test]
    fn test_mixed_separators_pick_latest() {
        let dir = TempDir::new().unwrap();
        let columns = all_columns();
        write_snapshot(
            &dir.path().join("a.parquet"),
            &columns,
            &[("2026-02-07T17:00:00", 17.0), ("2026-02-07 18:00:00", 18.0)],
        );
        write_snapshot(
            &dir.path().join("b.parquet"),
            &columns,
            &[("2026-02-07 16:00:00", 16.0)],
        );

        let reader = ParquetReader::new(dir.path(), DEFAULT_PATTERN, "metricas");
        let row = reader.read_latest().unwrap();
        assert_eq!(row.get("cpu_percent"), Some(&MetricValue::Real(18.0)));
        assert_eq!(row.timestamp(), Some(&MetricValue::from("2026-02-07 18:00:00")));
    }

    #[test]
    fn test_directory_with_glob_metacharacters() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("snap[1]");
        std::fs::create_dir(&dir).unwrap();
        write_snapshot(
            &dir.join("metrics.parquet"),
            &all_columns(),
            &[("2025-03-01T10:00:00", 10.0)],
        );

        let reader = ParquetReader::new(&dir, DEFAULT_PATTERN, "metricas");
        let row = reader.read_latest().unwrap();
        assert_eq!(row.get("cpu_percent"), Some(&MetricValue::Real(10.0)));
    }

    #[test]
    fn test_glob_limits_file_set() {
        let dir = TempDir::new().unwrap();
        let columns = all_columns();
        write_snapshot(
            &dir.path().join("metrics-1.parquet"),
            &columns,
            &[("2025-03-01T10:00:00", 10.0)],
        );
        write_snapshot(
            &dir.path().join("other-1.parquet"),
            &columns,
            &[("2025-03-02T10:00:00", 99.0)],
        );

        let reader = ParquetReader::new(dir.path(), "metrics-*.parquet", "metricas");
        let row = reader.read_latest().unwrap();
        assert_eq!(row.get("cpu_percent"), Some(&MetricValue::Real(10.0)));
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        write_snapshot(
            &dir.path().join("narrow.parquet"),
            &["timestamp", "hostname", "cpu_percent"],
            &[("2025-03-01T10:00:00", 10.0)],
        );

        let reader = ParquetReader::new(dir.path(), DEFAULT_PATTERN, "metricas");
        let err = reader.read_latest().unwrap_err();
        assert_eq!(err.kind(), ReadFailureKind::SchemaMismatch);
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.parquet"), b"garbage").unwrap();

        let reader = ParquetReader::new(dir.path(), DEFAULT_PATTERN, "metricas");
        let err = reader.read_latest().unwrap_err();
        assert!(matches!(err, ReadError::Parquet(_)));
    }

    #[test]
    fn test_compare_keys_puts_nulls_last() {
        let some = Some("2025-01-01T00:00:00".to_string());
        assert_eq!(compare_keys(&some, &None), Ordering::Greater);
        assert_eq!(compare_keys(&None, &some), Ordering::Less);
        assert_eq!(compare_keys(&None, &None), Ordering::Equal);
    }

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(field_value(&Field::Int(7)), MetricValue::Integer(7));
        assert_eq!(field_value(&Field::Double(1.5)), MetricValue::Real(1.5));
        assert_eq!(field_value(&Field::Null), MetricValue::Null);
        assert_eq!(
            field_value(&Field::TimestampMillis(0)),
            MetricValue::from("1970-01-01T00:00:00")
        );
    }
}
