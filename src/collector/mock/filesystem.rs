//! In-memory mock filesystem for testing the sampler without real `/proc`.
//!
//! `MockFs` simulates a filesystem in memory, so process sampling tests run on
//! macOS and in CI environments without Linux.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }

    /// Adds a process with the `/proc/[pid]/` files the sampler reads.
    ///
    /// # Arguments
    /// * `pid` - Process ID
    /// * `comm` - Process name, as in `/proc/[pid]/comm`
    /// * `utime`, `stime` - CPU ticks spent in user and kernel mode
    pub fn add_process(&mut self, pid: u32, comm: &str, utime: u64, stime: u64) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        self.add_dir(&base);
        self.add_file(base.join("stat"), stat_line(pid, comm, utime, stime));
        self.add_file(base.join("comm"), format!("{}\n", comm));
    }

    /// A small system: init plus two workers sharing one name.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();
        fs.add_file("/proc/uptime", "12345.67 98765.43\n");
        fs.add_process(1, "systemd", 150, 80);
        fs.add_process(1000, "postgres", 5000, 1200);
        fs.add_process(1001, "postgres", 4200, 900);
        fs
    }
}

/// Builds a `/proc/[pid]/stat` line with the given CPU times.
///
/// All other fields carry plausible constants; `starttime` is derived from
/// the pid so each process has a distinct one.
pub fn stat_line(pid: u32, comm: &str, utime: u64, stime: u64) -> String {
    format!(
        "{pid} ({comm}) S 1 {pid} {pid} 0 -1 4194560 1000 0 0 0 {utime} {stime} 0 0 20 0 1 0 {start} 12345678 500 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0\n",
        start = u64::from(pid) * 100,
    )
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = HashSet::new();

        // Find all files and directories that are direct children
        for file_path in self.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &self.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }
}
