//! Row-store variant: a single SQLite file written by the collector.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use super::schema::{METRICS_COLUMNS, TIMESTAMP_COLUMN};
use super::{MetricValue, MetricsRow, ReadError, SnapshotReader};

/// How long a read waits on the writer's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_millis(500);

/// Reads the latest row from a SQLite database file.
///
/// The connection is opened read-only inside each [`read_latest`] call and
/// dropped before it returns, so the writer is never locked out for longer
/// than one query.
///
/// [`read_latest`]: SnapshotReader::read_latest
#[derive(Debug, Clone)]
pub struct SqliteReader {
    path: PathBuf,
    table: String,
}

impl SqliteReader {
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            table: table.into(),
        }
    }

    /// Orders on the timestamp with a `T` separator so rows written with a
    /// space compare in time order against the canonical form.
    fn latest_row_sql(&self) -> String {
        format!(
            "SELECT * FROM {} ORDER BY replace({}, ' ', 'T') DESC LIMIT 1",
            quote_identifier(&self.table),
            TIMESTAMP_COLUMN
        )
    }

    fn open(&self) -> Result<Connection, ReadError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    fn query_latest(&self, conn: &Connection) -> Result<MetricsRow, ReadError> {
        let mut stmt = conn.prepare(&self.latest_row_sql())?;
        let column_count = stmt.column_count();
        let mut rows = stmt.query([])?;

        let Some(row) = rows.next()? else {
            return Err(ReadError::NoRows {
                table: self.table.clone(),
            });
        };

        let available = column_count.min(METRICS_COLUMNS.len());
        let mut values = Vec::with_capacity(available);
        for idx in 0..available {
            values.push(metric_value(row.get_ref(idx)?));
        }

        MetricsRow::from_columns(&self.table, &METRICS_COLUMNS, values)
    }
}

impl SnapshotReader for SqliteReader {
    fn read_latest(&self) -> Result<MetricsRow, ReadError> {
        if !self.path.is_file() {
            return Err(ReadError::SourceMissing {
                path: self.path.clone(),
                table: self.table.clone(),
            });
        }

        let conn = self.open()?;
        let result = self.query_latest(&conn);
        // Connection is released here on every path, including query errors.
        drop(conn);

        debug!(
            path = %self.path.display(),
            ok = result.is_ok(),
            "sqlite latest-row read finished"
        );
        result
    }

    fn location(&self) -> &Path {
        &self.path
    }

    fn table(&self) -> &str {
        &self.table
    }
}

fn metric_value(value: ValueRef<'_>) -> MetricValue {
    match value {
        ValueRef::Null => MetricValue::Null,
        ValueRef::Integer(i) => MetricValue::Integer(i),
        ValueRef::Real(f) => MetricValue::Real(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            MetricValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Quotes an SQL identifier, doubling embedded quotes.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::ReadFailureKind;
    use tempfile::TempDir;

    /// Creates the `metricas` table the way the writer does.
    pub(crate) fn create_metrics_db(path: &Path) -> Connection {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE metricas (
                timestamp TEXT PRIMARY KEY,
                hostname TEXT, username TEXT,
                cpu_percent REAL, cpu_freq REAL,
                ram_percent REAL, ram_used REAL, ram_total REAL, ram_free REAL,
                disk_percent REAL, disk_used REAL, disk_total REAL, disk_free REAL,
                swap_percent REAL, swap_usado REAL, swap_total REAL,
                red_bytes_sent INTEGER, red_bytes_recv INTEGER,
                cpu_temp_celsius REAL, battery_percent REAL,
                cpu_power_package REAL, cpu_power_cores REAL, cpu_clocks REAL
            );",
        )
        .unwrap();
        conn
    }

    /// Inserts a row with the given timestamp and CPU percentage; every other
    /// numeric column gets a fixed value.
    pub(crate) fn insert_row(conn: &Connection, timestamp: &str, cpu_percent: Option<f64>) {
        conn.execute(
            "INSERT INTO metricas VALUES (
                ?1, 'djin-host', 'djin', ?2, 2400.0,
                51.5, 7.25, 15.5, 8.25,
                40.0, 200.0, 500.0, 300.0,
                1.0, 0.5, 2.0,
                2097152, 10485760,
                55.0, 'N/A',
                12.5, 8.0, 3100.0
            )",
            rusqlite::params![timestamp, cpu_percent],
        )
        .unwrap();
    }

    #[test]
    fn test_missing_file_is_source_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitoreo.db");
        let reader = SqliteReader::new(&path, "metricas");

        let err = reader.read_latest().unwrap_err();
        assert!(matches!(err, ReadError::SourceMissing { .. }));
        assert!(err.to_string().contains("monitoreo.db"));
        assert!(err.to_string().contains("metricas"));
        assert!(!reader.source_exists());
    }

    #[test]
    fn test_empty_table_is_no_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitoreo.db");
        drop(create_metrics_db(&path));

        let reader = SqliteReader::new(&path, "metricas");
        let err = reader.read_latest().unwrap_err();
        assert_eq!(err.kind(), ReadFailureKind::NoRows);
    }

    #[test]
    fn test_reads_row_with_latest_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitoreo.db");
        let conn = create_metrics_db(&path);
        insert_row(&conn, "2025-03-01T10:00:00", Some(10.0));
        insert_row(&conn, "2025-03-01T12:30:00.123456", Some(30.0));
        insert_row(&conn, "2025-03-01T11:00:00", Some(20.0));
        drop(conn);

        let reader = SqliteReader::new(&path, "metricas");
        let row = reader.read_latest().unwrap();

        assert_eq!(row.len(), METRICS_COLUMNS.len());
        assert_eq!(
            row.timestamp(),
            Some(&MetricValue::from("2025-03-01T12:30:00.123456"))
        );
        assert_eq!(row.get("cpu_percent"), Some(&MetricValue::Real(30.0)));
        assert_eq!(row.get("red_bytes_sent"), Some(&MetricValue::Integer(2_097_152)));
        assert_eq!(row.get("battery_percent"), Some(&MetricValue::from("N/A")));
    }

    #[test]
    fn test_null_values_are_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitoreo.db");
        let conn = create_metrics_db(&path);
        insert_row(&conn, "2025-03-01T10:00:00", None);
        drop(conn);

        let row = SqliteReader::new(&path, "metricas").read_latest().unwrap();
        assert!(row.get("cpu_percent").unwrap().is_null());
    }

    #[test]
    fn test_narrow_table_is_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitoreo.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE metricas (timestamp TEXT PRIMARY KEY, hostname TEXT);
             INSERT INTO metricas VALUES ('2025-03-01T10:00:00', 'host');",
        )
        .unwrap();
        drop(conn);

        let err = SqliteReader::new(&path, "metricas").read_latest().unwrap_err();
        assert_eq!(err.kind(), ReadFailureKind::SchemaMismatch);
    }

    #[test]
    fn test_missing_table_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitoreo.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE other (id INTEGER);").unwrap();
        drop(conn);

        let err = SqliteReader::new(&path, "metricas").read_latest().unwrap_err();
        assert_eq!(err.kind(), ReadFailureKind::StorageUnavailable);
        assert!(matches!(err, ReadError::Sqlite(_)));
    }

    #[test]
    fn test_mixed_separators_pick_latest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitoreo.db");
        let conn = create_metrics_db(&path);
        insert_row(&conn, "2026-02-07T17:00:00", Some(17.0));
        insert_row(&conn, "2026-02-07 18:00:00", Some(18.0));
        drop(conn);

        let row = SqliteReader::new(&path, "metricas").read_latest().unwrap();
        assert_eq!(row.get("cpu_percent"), Some(&MetricValue::Real(18.0)));
        assert_eq!(row.timestamp(), Some(&MetricValue::from("2026-02-07 18:00:00")));
    }

    #[test]
    fn test_failed_read_releases_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitoreo.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE other (id INTEGER);").unwrap();
        drop(conn);

        let reader = SqliteReader::new(&path, "metricas");
        assert!(reader.read_latest().is_err());

        // The writer can create and fill the table right after the failure.
        let conn = create_metrics_db(&path);
        insert_row(&conn, "2025-03-01T10:00:00", Some(12.0));

        let row = reader.read_latest().unwrap();
        assert_eq!(row.get("cpu_percent"), Some(&MetricValue::Real(12.0)));
    }

    #[test]
    fn test_reader_does_not_block_writer_between_reads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitoreo.db");
        let conn = create_metrics_db(&path);
        insert_row(&conn, "2025-03-01T10:00:00", Some(10.0));

        let reader = SqliteReader::new(&path, "metricas");
        reader.read_latest().unwrap();

        // Writer still holds its own connection and can write immediately.
        insert_row(&conn, "2025-03-01T10:00:05", Some(15.0));
        let row = reader.read_latest().unwrap();
        assert_eq!(row.get("cpu_percent"), Some(&MetricValue::Real(15.0)));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("metricas"), "\"metricas\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
