//! Runtime settings and construction of the engine's collaborators.
//!
//! The storage backend is picked here, once, and handed to the engine as a
//! boxed [`SnapshotReader`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::catalog::MetricCatalog;
use crate::engine::QueryEngine;
use crate::ranker::{DEFAULT_PROCESS_LIMIT, DEFAULT_SAMPLE_INTERVAL, ProcessRanker, ProcessSampler};
use crate::storage::columnar::DEFAULT_PATTERN;
use crate::storage::{DEFAULT_TABLE, ParquetReader, SnapshotReader, SqliteReader};

/// Default location of the single-file database.
pub const DEFAULT_DB_PATH: &str = "./data/monitoreo.db";

/// Default directory of Parquet snapshots.
pub const DEFAULT_SNAPSHOT_DIR: &str = "./data/snapshots";

/// Default `/proc` mount.
pub const DEFAULT_PROC_PATH: &str = "/proc";

/// Which backend holds the metrics table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Single SQLite file.
    Sqlite { path: PathBuf, table: String },
    /// Directory of Parquet files matched by a glob pattern.
    Parquet {
        dir: PathBuf,
        pattern: String,
        table: String,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: PathBuf::from(DEFAULT_DB_PATH),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl StorageConfig {
    /// Parquet directory with the default pattern and table.
    pub fn parquet(dir: impl Into<PathBuf>) -> Self {
        StorageConfig::Parquet {
            dir: dir.into(),
            pattern: DEFAULT_PATTERN.to_string(),
            table: DEFAULT_TABLE.to_string(),
        }
    }

    /// Builds the reader. Nothing is opened until the first read.
    pub fn open(&self) -> Box<dyn SnapshotReader> {
        match self {
            StorageConfig::Sqlite { path, table } => {
                info!(path = %path.display(), table = table.as_str(), "using SQLite snapshot store");
                Box::new(SqliteReader::new(path, table.as_str()))
            }
            StorageConfig::Parquet {
                dir,
                pattern,
                table,
            } => {
                info!(
                    dir = %dir.display(),
                    pattern = pattern.as_str(),
                    table = table.as_str(),
                    "using Parquet snapshot directory"
                );
                Box::new(ParquetReader::new(dir, pattern.as_str(), table.as_str()))
            }
        }
    }
}

/// Everything needed to assemble a [`QueryEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub storage: StorageConfig,
    pub proc_path: PathBuf,
    pub sample_interval: Duration,
    pub process_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            proc_path: PathBuf::from(DEFAULT_PROC_PATH),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            process_limit: DEFAULT_PROCESS_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Assembles the engine around the built-in catalog.
    pub fn build(&self, sampler: Box<dyn ProcessSampler>) -> QueryEngine {
        let ranker = ProcessRanker::new(sampler, self.sample_interval);
        QueryEngine::new(
            Arc::new(MetricCatalog::builtin()),
            self.storage.open(),
            ranker,
        )
        .with_process_limit(self.process_limit)
    }
}
