//! Read-only access to the most recent metrics snapshot.
//!
//! The writer process keeps the `metricas` table in one of two physical
//! representations. Each has a [`SnapshotReader`] implementation, and callers
//! only ever see the trait:
//!
//! ```text
//!                 ┌──────────────────┐
//!                 │  SnapshotReader  │ (trait)
//!                 └────────┬─────────┘
//!              ┌───────────┴────────────┐
//!       ┌──────▼───────┐        ┌───────▼────────┐
//!       │ SqliteReader │        │ ParquetReader  │
//!       │ (row store)  │        │ (dir + glob)   │
//!       └──────────────┘        └────────────────┘
//! ```

pub mod columnar;
pub mod schema;
pub mod sqlite;

pub use columnar::ParquetReader;
pub use schema::{Column, DEFAULT_TABLE, METRICS_COLUMNS, TIMESTAMP_COLUMN};
pub use sqlite::SqliteReader;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A stored value whose concrete type is only known at read time.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl MetricValue {
    pub fn is_null(&self) -> bool {
        matches!(self, MetricValue::Null)
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        MetricValue::Text(s.to_string())
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Real(v)
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Integer(v)
    }
}

/// The latest row of the metrics table, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsRow {
    fields: BTreeMap<String, MetricValue>,
}

impl MetricsRow {
    /// Binds positional values to the schema's column names.
    ///
    /// Fails with [`ReadError::SchemaMismatch`] when the row is shorter than
    /// the schema; extra trailing values are ignored.
    pub fn from_columns(
        table: &str,
        columns: &[Column],
        values: Vec<MetricValue>,
    ) -> Result<Self, ReadError> {
        if values.len() < columns.len() {
            return Err(ReadError::SchemaMismatch {
                table: table.to_string(),
                expected: columns.len(),
                found: values.len(),
            });
        }

        let fields = columns
            .iter()
            .map(|c| c.name.to_string())
            .zip(values)
            .collect();
        Ok(Self { fields })
    }

    pub fn get(&self, field: &str) -> Option<&MetricValue> {
        self.fields.get(field)
    }

    pub fn timestamp(&self) -> Option<&MetricValue> {
        self.get(TIMESTAMP_COLUMN)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Coarse classification of a failed read, independent of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFailureKind {
    /// Backend missing or unreadable.
    StorageUnavailable,
    /// Directory exists but the glob matched nothing.
    NoFilesFound,
    /// Backend reachable but the table holds no rows.
    NoRows,
    /// Row shape does not match the fixed schema.
    SchemaMismatch,
}

/// Failure of [`SnapshotReader::read_latest`].
///
/// The `Display` text is shown to the user as-is.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(
        "El origen de datos '{}' no fue encontrado (tabla esperada: '{table}'). La lectura de métricas no funcionará hasta que el escritor lo cree.",
        path.display()
    )]
    SourceMissing { path: PathBuf, table: String },

    #[error("No hay archivos de instantáneas que coincidan con '{pattern}' (tabla esperada: '{table}').")]
    NoFilesFound { pattern: String, table: String },

    #[error("No hay datos en la tabla de métricas '{table}'.")]
    NoRows { table: String },

    #[error(
        "La fila más reciente de '{table}' no coincide con el esquema: se esperaban {expected} columnas y se encontraron {found}."
    )]
    SchemaMismatch {
        table: String,
        expected: usize,
        found: usize,
    },

    #[error("Error al leer la base de datos SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Error al leer las instantáneas Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Patrón de instantáneas no válido: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Error de E/S en '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ReadError {
    pub fn kind(&self) -> ReadFailureKind {
        match self {
            ReadError::NoFilesFound { .. } => ReadFailureKind::NoFilesFound,
            ReadError::NoRows { .. } => ReadFailureKind::NoRows,
            ReadError::SchemaMismatch { .. } => ReadFailureKind::SchemaMismatch,
            ReadError::SourceMissing { .. }
            | ReadError::Sqlite(_)
            | ReadError::Parquet(_)
            | ReadError::Pattern(_)
            | ReadError::Io { .. } => ReadFailureKind::StorageUnavailable,
        }
    }
}

/// A source of the latest metrics snapshot.
///
/// Implementations hold no open handles between calls: every
/// [`read_latest`](Self::read_latest) acquires and releases its own.
pub trait SnapshotReader {
    /// Reads the row with the greatest timestamp.
    fn read_latest(&self) -> Result<MetricsRow, ReadError>;

    /// File or directory this reader points at.
    fn location(&self) -> &Path;

    /// Name of the table the reader expects.
    fn table(&self) -> &str;

    /// Returns `true` if the storage location currently exists.
    fn source_exists(&self) -> bool {
        self.location().exists()
    }
}
