//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The process sampler reads `/proc` through the `FileSystem` trait so the
//! same code runs against the real Linux `/proc` and against `MockFs`.

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction for the filesystem operations the sampler needs.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Lists entries in a directory.
    ///
    /// # Returns
    /// A vector of paths to entries in the directory, or an I/O error.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        // Entries can vanish while listing /proc.
        for entry in entries.flatten() {
            paths.push(entry.path());
        }
        Ok(paths)
    }
}
