//! Top-N report of live processes by CPU usage.
//!
//! Samples come from a [`ProcessSampler`], are aggregated per process name
//! (CPU summed, instances counted) and ranked by summed CPU, descending. Ties
//! keep first-seen order.

use std::time::Duration;

use tracing::{debug, warn};

use crate::collector::CollectError;

/// Number of entries in the process report.
pub const DEFAULT_PROCESS_LIMIT: usize = 10;

/// Default per-process sampling window.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// One process observed over a sampling window.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub name: String,
    /// Share of one CPU over the window, in percent. Never negative.
    pub cpu_percent: f64,
}

/// Source of live process samples.
pub trait ProcessSampler {
    /// Samples every running process over `interval`.
    ///
    /// Processes that vanish or deny access mid-enumeration are left out;
    /// an error means the process list itself could not be obtained.
    fn sample(&mut self, interval: Duration) -> Result<Vec<ProcessSample>, CollectError>;
}

/// All processes sharing one name.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessUsage {
    pub name: String,
    pub instances: usize,
    pub cpu_percent: f64,
}

/// Groups samples by name, in first-seen order.
pub fn aggregate_by_name(samples: &[ProcessSample]) -> Vec<ProcessUsage> {
    let mut usages: Vec<ProcessUsage> = Vec::new();
    for sample in samples {
        match usages.iter_mut().find(|u| u.name == sample.name) {
            Some(usage) => {
                usage.instances += 1;
                usage.cpu_percent += sample.cpu_percent;
            }
            None => usages.push(ProcessUsage {
                name: sample.name.clone(),
                instances: 1,
                cpu_percent: sample.cpu_percent,
            }),
        }
    }
    usages
}

/// Sorts by CPU descending (stable) and keeps the first `limit`.
pub fn rank(mut usages: Vec<ProcessUsage>, limit: usize) -> Vec<ProcessUsage> {
    usages.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
    usages.truncate(limit);
    usages
}

/// Renders the report lines for ranked usages.
pub fn render_report(ranked: &[ProcessUsage], limit: usize) -> String {
    if ranked.is_empty() {
        return "No se encontraron procesos activos.".to_string();
    }

    let mut out = format!("Top {} procesos con mayor consumo de CPU:", limit);
    for (idx, usage) in ranked.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {} - {:.2}% (Instances: {})",
            idx + 1,
            usage.name,
            usage.cpu_percent,
            usage.instances
        ));
    }
    out
}

/// Produces the top-N process report.
pub struct ProcessRanker {
    sampler: Box<dyn ProcessSampler>,
    interval: Duration,
}

impl ProcessRanker {
    /// A zero interval would yield meaningless readings and is replaced by
    /// [`DEFAULT_SAMPLE_INTERVAL`].
    pub fn new(sampler: Box<dyn ProcessSampler>, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            warn!(
                default = ?DEFAULT_SAMPLE_INTERVAL,
                "zero sampling interval requested, using default"
            );
            DEFAULT_SAMPLE_INTERVAL
        } else {
            interval
        };
        Self { sampler, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Aggregated and ranked usages, at most `limit` of them.
    pub fn top_usages(&mut self, limit: usize) -> Result<Vec<ProcessUsage>, CollectError> {
        let samples = self.sampler.sample(self.interval)?;
        let ranked = rank(aggregate_by_name(&samples), limit);
        debug!(
            samples = samples.len(),
            reported = ranked.len(),
            "ranked processes"
        );
        Ok(ranked)
    }

    /// The report text shown to the user. Sampling failures become the text.
    pub fn top_by_cpu(&mut self, limit: usize) -> String {
        match self.top_usages(limit) {
            Ok(ranked) => render_report(&ranked, limit),
            Err(e) => {
                warn!(error = %e, "process listing failed");
                format!("Error al obtener la lista de procesos: {}", e)
            }
        }
    }
}
