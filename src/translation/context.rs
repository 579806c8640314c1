//! Immutable translation context and its compute-once holder.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use super::{Statement, TranslateError};
use crate::catalog::{Catalog, CatalogError};
use crate::config::{Settings, SettingsError};
use crate::sql::dialect::Dialect;
use crate::udf::UdfRegistry;
use crate::validation::ValidationOptions;

/// The context could not be built.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Everything a translation reads: the catalog, the conversion rules and
/// the settings. Built once, shared read-only across threads.
#[derive(Debug, Clone)]
pub struct TranslationContext {
    catalog: Arc<Catalog>,
    registry: Arc<UdfRegistry>,
    settings: Settings,
    source: Dialect,
    target: Dialect,
}

impl Default for TranslationContext {
    /// Presto to Hive over the built-in tables.
    fn default() -> Self {
        Self::new(Arc::new(Catalog::with_builtin_tables("default")))
    }
}

impl TranslationContext {
    /// Presto to Hive over `catalog`, with default settings.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            registry: Arc::new(UdfRegistry::presto_to_hive()),
            settings: Settings::default(),
            source: Dialect::Presto,
            target: Dialect::Hive,
        }
    }

    /// Build the catalog the settings describe.
    pub fn from_settings(settings: &Settings) -> Result<Self, ContextError> {
        let namespace = settings.catalog.default_namespace.as_str();
        let mut catalog = if settings.catalog.builtin_tables {
            Catalog::with_builtin_tables(namespace)
        } else {
            Catalog::new(namespace)
        };
        if let Some(dir) = settings.catalog.resolved_schema_dir()? {
            catalog.load_dir(&dir)?;
        }
        info!(tables = catalog.len(), "Built translation context");

        Ok(Self {
            settings: settings.clone(),
            ..Self::new(Arc::new(catalog))
        })
    }

    /// Render for `target` instead of Hive.
    pub fn with_target(mut self, target: Dialect) -> Self {
        self.target = target;
        self
    }

    pub fn with_registry(mut self, registry: UdfRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &UdfRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn source(&self) -> Dialect {
        self.source
    }

    pub fn target(&self) -> Dialect {
        self.target
    }

    fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            source: self.source,
            case_sensitive: self.settings.parser.case_sensitive,
            unknown_functions: self.settings.validation.unknown_functions,
        }
    }

    /// Run one statement through every stage.
    #[tracing::instrument(level = "debug", skip_all, fields(source = %self.source, target = %self.target))]
    pub fn translate(&self, sql: &str) -> Result<String, TranslateError> {
        let parsed = Statement::parse(sql, &self.settings.parser.options())?;
        let validated = if self.settings.validation.enabled {
            parsed.validate(&self.catalog, self.validation_options())?
        } else {
            parsed.assume_valid()
        };
        validated
            .rewrite(&self.registry, self.source, self.target)?
            .render(self.settings.render.options())
    }
}

/// A [`TranslationContext`] built on first use.
///
/// The first caller runs the initializer; concurrent callers block until it
/// has published, then all observe the same instance. A failed initializer
/// publishes nothing, so a later call may try again.
#[derive(Debug, Default)]
pub struct SharedContext {
    cell: OnceCell<Arc<TranslationContext>>,
}

impl SharedContext {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Option<Arc<TranslationContext>> {
        self.cell.get().cloned()
    }

    pub fn get_or_try_init<F, E>(&self, init: F) -> Result<Arc<TranslationContext>, E>
    where
        F: FnOnce() -> Result<TranslationContext, E>,
    {
        self.cell
            .get_or_try_init(|| init().map(Arc::new))
            .map(Arc::clone)
    }

    /// Build from `Settings::load()` on first use.
    pub fn get_or_load(&self) -> Result<Arc<TranslationContext>, ContextError> {
        self.get_or_try_init(|| {
            let settings = Settings::load()?;
            TranslationContext::from_settings(&settings)
        })
    }
}
