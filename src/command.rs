//! Interpretation of raw user text.

use std::sync::Arc;

use crate::catalog::{LookupError, MetricCatalog, MetricDescriptor};

/// Control word that lists the catalog.
pub const LIST_OPTIONS_WORD: &str = "opciones";

/// A parsed user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListOptions,
    Lookup(MetricDescriptor),
    Invalid(LookupError),
}

/// Maps free-form text to a [`Command`] using the catalog. Performs no I/O.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    catalog: Arc<MetricCatalog>,
}

impl CommandResolver {
    pub fn new(catalog: Arc<MetricCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn resolve(&self, raw: &str) -> Command {
        let text = raw.trim().to_lowercase();
        if text == LIST_OPTIONS_WORD {
            return Command::ListOptions;
        }

        match self.catalog.resolve(&text) {
            Ok(descriptor) => Command::Lookup(descriptor.clone()),
            Err(e) => Command::Invalid(e),
        }
    }
}
