//! Query orchestration: one user command in, one response text out.
//!
//! The engine is the only component that knows all the others. A command is
//! resolved against the catalog, then answered either from the latest stored
//! snapshot or, for the live process entry, from the process ranker without
//! touching storage.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{MetricCatalog, MetricDescriptor, MetricSource};
use crate::command::{Command, CommandResolver, LIST_OPTIONS_WORD};
use crate::fmt::{Formatted, FormattedSnapshot};
use crate::ranker::{DEFAULT_PROCESS_LIMIT, ProcessRanker};
use crate::storage::{METRICS_COLUMNS, SnapshotReader};

const GREETING: &str = "¡Hola! Soy un bot de monitoreo del sistema. Escribe el número o nombre de una métrica para conocer su valor, o escribe 'opciones' para ver la lista de métricas.";

const NOT_IN_SNAPSHOT: &str = "No se encontraron datos para esa métrica en la base de datos.";

/// Engine state. `Processing` lasts exactly one [`QueryEngine::handle`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Processing,
}

/// What a response is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// The catalog listing.
    Options,
    /// A formatted metric value.
    Value,
    /// The metric exists in the snapshot but has no recorded value.
    Missing,
    /// The metric is in the catalog but not in the snapshot row.
    NotInSnapshot,
    /// Storage could not produce a snapshot.
    ReadFailure,
    /// The live process report.
    Processes,
    /// Input did not resolve to a command.
    Invalid,
}

/// Text shown to the user, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub kind: ResponseKind,
    pub text: String,
}

impl Response {
    fn new(kind: ResponseKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Answers one command at a time.
pub struct QueryEngine {
    catalog: Arc<MetricCatalog>,
    resolver: CommandResolver,
    reader: Box<dyn SnapshotReader>,
    ranker: ProcessRanker,
    state: EngineState,
    process_limit: usize,
}

impl QueryEngine {
    pub fn new(
        catalog: Arc<MetricCatalog>,
        reader: Box<dyn SnapshotReader>,
        ranker: ProcessRanker,
    ) -> Self {
        Self {
            resolver: CommandResolver::new(Arc::clone(&catalog)),
            catalog,
            reader,
            ranker,
            state: EngineState::Idle,
            process_limit: DEFAULT_PROCESS_LIMIT,
        }
    }

    /// Number of entries in the process report.
    pub fn with_process_limit(mut self, limit: usize) -> Self {
        self.process_limit = limit;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    /// Opening message of a session.
    ///
    /// A missing storage source is announced up front; the session still
    /// works, and process ranking does not need storage at all.
    pub fn greeting(&self) -> String {
        let mut out = String::new();
        if !self.reader.source_exists() {
            info!(
                path = %self.reader.location().display(),
                "storage source not found at startup"
            );
            out.push_str(&format!(
                "Advertencia: El origen de datos '{}' no fue encontrado. Asegúrate de que el recolector de métricas esté en ejecución.\n\n",
                self.reader.location().display()
            ));
        }
        out.push_str(GREETING);
        out.push_str("\n\n");
        out.push_str(&render_options(&self.catalog));
        out
    }

    /// Handles one raw user input and returns the full response.
    pub fn handle(&mut self, raw: &str) -> Response {
        self.state = EngineState::Processing;
        debug!(input = raw.trim(), "processing command");

        let response = match self.resolver.resolve(raw) {
            Command::ListOptions => {
                Response::new(ResponseKind::Options, render_options(&self.catalog))
            }
            Command::Lookup(descriptor) => self.lookup(&descriptor),
            Command::Invalid(e) => Response::new(
                ResponseKind::Invalid,
                format!("{}\n\n{}", e, render_options(&self.catalog)),
            ),
        };

        debug!(kind = ?response.kind, "command done");
        self.state = EngineState::Idle;
        response
    }

    fn lookup(&mut self, descriptor: &MetricDescriptor) -> Response {
        match descriptor.source {
            MetricSource::LiveProcesses => Response::new(
                ResponseKind::Processes,
                self.ranker.top_by_cpu(self.process_limit),
            ),
            MetricSource::Snapshot(_) => self.lookup_snapshot(descriptor),
        }
    }

    fn lookup_snapshot(&self, descriptor: &MetricDescriptor) -> Response {
        let row = match self.reader.read_latest() {
            Ok(row) => row,
            Err(e) => {
                debug!(error = %e, kind = ?e.kind(), "snapshot read failed");
                return Response::new(ResponseKind::ReadFailure, format!("Error: {}", e));
            }
        };

        let snapshot = FormattedSnapshot::from_row(&row, &METRICS_COLUMNS);
        let suffix = snapshot
            .timestamp()
            .map(|ts| format!(" (Última actualización: {})", ts))
            .unwrap_or_default();

        match snapshot.get(&descriptor.key) {
            None => Response::new(ResponseKind::NotInSnapshot, NOT_IN_SNAPSHOT),
            Some(Formatted::Missing) => Response::new(
                ResponseKind::Missing,
                format!(
                    "No hay un valor registrado para '{}' en la última medición.{}",
                    descriptor.label, suffix
                ),
            ),
            Some(Formatted::Value(value)) => Response::new(
                ResponseKind::Value,
                format!("El valor de '{}' es: {}{}", descriptor.label, value, suffix),
            ),
        }
    }
}

/// The numbered catalog listing.
pub fn render_options(catalog: &MetricCatalog) -> String {
    let mut out = String::from("Métricas disponibles:");
    for (ordinal, label) in catalog.list_all() {
        out.push_str(&format!("\n{}. {}", ordinal, label));
    }
    out.push_str(&format!(
        "\n\nEscribe el número o el nombre de la métrica, o '{}' para ver esta lista.",
        LIST_OPTIONS_WORD
    ));
    out
}
