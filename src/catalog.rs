//! Static registry of the metrics a user can ask for.
//!
//! Entries are addressed by 1-based ordinal (their position in the listing)
//! or by name. Names are matched exactly after normalization (trimmed,
//! lowercased, whitespace runs turned into `_`) against either the canonical
//! key or the normalized label.

use crate::fmt::Unit;

/// Key of the synthetic entry answered from live processes.
pub const LIVE_PROCESSES_KEY: &str = "top_10_cpu";

/// Where the value of a metric comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    /// A column of the latest stored snapshot.
    Snapshot(Unit),
    /// The live top-N process report; never touches storage.
    LiveProcesses,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub ordinal: usize,
    pub key: String,
    pub label: String,
    pub source: MetricSource,
}

/// Failed catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("Número de métrica fuera de rango. Por favor, elige un número del 1 al {max} o escribe 'opciones'.")]
    OutOfRange { requested: String, max: usize },

    #[error("Métrica no válida. Por favor, escribe el número o nombre exacto de la métrica.")]
    NotFound { name: String },
}

/// Static description of an entry, used to build the catalog.
struct MetricSpec {
    key: &'static str,
    label: Option<&'static str>,
    source: MetricSource,
}

const fn snapshot(key: &'static str, unit: Unit) -> MetricSpec {
    MetricSpec {
        key,
        label: None,
        source: MetricSource::Snapshot(unit),
    }
}

const BUILTIN: [MetricSpec; 21] = [
    snapshot("cpu_percent", Unit::Percent),
    snapshot("cpu_freq", Unit::Megahertz),
    snapshot("ram_percent", Unit::Percent),
    snapshot("ram_used", Unit::Gigabytes),
    snapshot("ram_total", Unit::Gigabytes),
    snapshot("ram_free", Unit::Gigabytes),
    snapshot("disk_percent", Unit::Percent),
    snapshot("disk_used", Unit::Gigabytes),
    snapshot("disk_total", Unit::Gigabytes),
    snapshot("disk_free", Unit::Gigabytes),
    snapshot("swap_percent", Unit::Percent),
    snapshot("swap_usado", Unit::Gigabytes),
    snapshot("swap_total", Unit::Gigabytes),
    snapshot("red_bytes_sent", Unit::Megabytes),
    snapshot("red_bytes_recv", Unit::Megabytes),
    snapshot("cpu_temp_celsius", Unit::Celsius),
    snapshot("battery_percent", Unit::Percent),
    snapshot("cpu_power_package", Unit::Watts),
    snapshot("cpu_power_cores", Unit::Watts),
    snapshot("cpu_clocks", Unit::Megahertz),
    MetricSpec {
        key: LIVE_PROCESSES_KEY,
        label: Some("Top 10 Apps High CPU"),
        source: MetricSource::LiveProcesses,
    },
];

/// Immutable, ordered set of metric descriptors.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    entries: Vec<MetricDescriptor>,
}

impl MetricCatalog {
    /// The catalog of metrics the collector writes, plus the live process report.
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .enumerate()
            .map(|(idx, spec)| MetricDescriptor {
                ordinal: idx + 1,
                key: spec.key.to_string(),
                label: spec
                    .label
                    .map(str::to_string)
                    .unwrap_or_else(|| title_case(spec.key)),
                source: spec.source,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a decimal ordinal or a name.
    pub fn resolve(&self, token: &str) -> Result<&MetricDescriptor, LookupError> {
        let token = token.trim();
        if is_integer(token) {
            return self.by_ordinal_str(token);
        }
        self.by_name(token)
    }

    /// Looks up a 1-based ordinal.
    pub fn by_ordinal(&self, ordinal: i64) -> Result<&MetricDescriptor, LookupError> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| self.entries.get(idx))
            .ok_or_else(|| LookupError::OutOfRange {
                requested: ordinal.to_string(),
                max: self.len(),
            })
    }

    fn by_ordinal_str(&self, token: &str) -> Result<&MetricDescriptor, LookupError> {
        match token.parse::<i64>() {
            Ok(n) => self.by_ordinal(n),
            // Too many digits for i64: certainly out of range.
            Err(_) => Err(LookupError::OutOfRange {
                requested: token.to_string(),
                max: self.len(),
            }),
        }
    }

    /// Looks up a name, matching the key or the label after normalization.
    pub fn by_name(&self, name: &str) -> Result<&MetricDescriptor, LookupError> {
        let wanted = normalize(name);
        self.entries
            .iter()
            .find(|d| d.key == wanted || normalize(&d.label) == wanted)
            .ok_or(LookupError::NotFound { name: wanted })
    }

    /// Ordinal and label of every entry, in registration order.
    pub fn list_all(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries.iter().map(|d| (d.ordinal, d.label.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.entries.iter()
    }
}

/// Canonical form of a user-typed name: `"Cpu Percent"` -> `"cpu_percent"`.
pub fn normalize(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Display label of a key: `"cpu_temp_celsius"` -> `"Cpu Temp Celsius"`.
fn title_case(key: &str) -> String {
    key.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Decimal integer with an optional sign.
fn is_integer(token: &str) -> bool {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
