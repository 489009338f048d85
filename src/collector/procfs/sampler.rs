//! Per-process CPU sampling over `/proc/[pid]/stat`.

use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::collector::procfs::parser::{ProcStat, parse_proc_stat};
use crate::collector::traits::FileSystem;
use crate::ranker::{ProcessSample, ProcessSampler};

/// `USER_HZ` as exposed in `/proc`; fixed at 100 on every mainstream Linux.
pub const CLOCK_TICKS_PER_SECOND: u64 = 100;

/// Error type for process sampling.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Process disappeared (or its pid was reused) during sampling.
    #[error("el proceso {0} ya no existe")]
    ProcessGone(u32),
    /// Process files are not readable by this user.
    #[error("acceso denegado al proceso {0}")]
    AccessDenied(u32),
    /// I/O error reading process files.
    #[error("error de E/S: {0}")]
    Io(#[from] io::Error),
    /// Parse error in process files.
    #[error("error de formato: {0}")]
    Parse(String),
}

impl CollectError {
    /// Races that are expected while walking `/proc` and are skipped silently.
    pub fn is_race(&self) -> bool {
        matches!(
            self,
            CollectError::ProcessGone(_) | CollectError::AccessDenied(_)
        )
    }
}

/// Samples CPU utilization of every process under a `/proc` mount.
///
/// Each process is read twice, at least `interval` apart; the utilization is
/// the share of one CPU spent by the process over the measured window, so a
/// process busy on two cores reports up to 200%.
pub struct ProcfsSampler<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
}

impl<F: FileSystem> ProcfsSampler<F> {
    pub fn new(fs: F, proc_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    /// Numeric entries of the `/proc` directory, ascending.
    fn list_pids(&self) -> Result<Vec<u32>, CollectError> {
        let entries = self.fs.read_dir(&self.proc_path)?;
        let mut pids: Vec<u32> = entries
            .iter()
            .filter_map(|entry| entry.file_name().and_then(|n| n.to_str()))
            .filter_map(|name| name.parse::<u32>().ok())
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    fn read_stat(&self, pid: u32) -> Result<ProcStat, CollectError> {
        let path = self.proc_path.join(pid.to_string()).join("stat");
        let content = self.fs.read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CollectError::ProcessGone(pid),
            io::ErrorKind::PermissionDenied => CollectError::AccessDenied(pid),
            _ => CollectError::Io(e),
        })?;
        parse_proc_stat(&content).map_err(|e| CollectError::Parse(e.message))
    }

    /// Name from `/proc/[pid]/comm`, falling back to the stat comm field.
    fn read_name(&self, pid: u32, stat: &ProcStat) -> String {
        let path = self.proc_path.join(pid.to_string()).join("comm");
        match self.fs.read_to_string(&path) {
            Ok(comm) if !comm.trim().is_empty() => comm.trim_end_matches('\n').to_string(),
            _ => stat.comm.clone(),
        }
    }

    fn sample_process(&self, pid: u32, interval: Duration) -> Result<ProcessSample, CollectError> {
        let before = self.read_stat(pid)?;
        let started = Instant::now();
        thread::sleep(interval);
        let elapsed = started.elapsed();
        let after = self.read_stat(pid)?;

        if after.starttime != before.starttime {
            return Err(CollectError::ProcessGone(pid));
        }

        let ticks = after.cpu_ticks().saturating_sub(before.cpu_ticks());
        Ok(ProcessSample {
            name: self.read_name(pid, &after),
            cpu_percent: cpu_percent(ticks, elapsed),
        })
    }
}

/// CPU percentage of `ticks` clock ticks spent over the measured `window`.
fn cpu_percent(ticks: u64, window: Duration) -> f64 {
    let secs = window.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    ticks as f64 / CLOCK_TICKS_PER_SECOND as f64 / secs * 100.0
}

impl<F: FileSystem> ProcessSampler for ProcfsSampler<F> {
    /// Samples all processes.
    ///
    /// Processes that disappear or deny access during sampling are skipped.
    fn sample(&mut self, interval: Duration) -> Result<Vec<ProcessSample>, CollectError> {
        let pids = self.list_pids()?;
        debug!(count = pids.len(), ?interval, "sampling processes");

        let mut samples = Vec::with_capacity(pids.len());
        for pid in pids {
            match self.sample_process(pid, interval) {
                Ok(sample) => samples.push(sample),
                Err(e) if e.is_race() => {
                    debug!(pid, error = %e, "skipping process");
                }
                Err(e) => {
                    warn!(pid, error = %e, "failed to sample process");
                }
            }
        }

        Ok(samples)
    }
}
