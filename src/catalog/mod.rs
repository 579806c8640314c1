//! Table and function catalog.
//!
//! Maps `(namespace, table)` to a row type. Tables come from three places:
//! the built-in fixture tables, schema documents loaded at start-up and
//! logical schemas registered by the embedding application. Registering a
//! table into an existing namespace merges it with the tables already there.
//!
//! Names are stored lower-cased, so lookups ignore case.
//!
//! # Example
//!
//! ```
//! use sqlbridge::catalog::Catalog;
//!
//! let catalog = Catalog::with_builtin_tables("default");
//! assert!(catalog.contains_table("dwh.dim_agent"));
//! assert!(catalog.resolve("table1").is_ok());
//! ```

pub mod functions;
mod loader;

pub use functions::{FunctionDef, FunctionKind, ReturnRule};

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::schema::{Schema, SchemaDocument, SchemaError, StructField, StructuralType};

/// Errors raised by catalog registration and lookup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed to read schema directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A registered table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub namespace: String,
    pub name: String,
    /// Always a [`StructuralType::Struct`] of the table's columns.
    pub row_type: StructuralType,
}

impl Table {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn columns(&self) -> &[StructField] {
        match &self.row_type {
            StructuralType::Struct(fields) => fields,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    default_namespace: String,
    namespaces: BTreeMap<String, BTreeMap<String, Table>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new("default")
    }
}

impl Catalog {
    /// An empty catalog. Unqualified table names resolve in `default_namespace`.
    pub fn new(default_namespace: impl Into<String>) -> Self {
        Self {
            default_namespace: default_namespace.into().to_lowercase(),
            namespaces: BTreeMap::new(),
        }
    }

    /// A catalog seeded with the built-in fixture tables.
    pub fn with_builtin_tables(default_namespace: impl Into<String>) -> Self {
        let mut catalog = Self::new(default_namespace);
        catalog.register_builtin_tables();
        catalog
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Register tables into `namespace`, keeping the tables already there.
    ///
    /// A table registered twice keeps the later row type.
    pub fn register_tables(
        &mut self,
        namespace: &str,
        tables: impl IntoIterator<Item = (String, StructuralType)>,
    ) {
        let namespace = namespace.to_lowercase();
        let mut merged = self.namespaces.remove(&namespace).unwrap_or_default();
        for (name, row_type) in tables {
            let name = name.to_lowercase();
            merged.insert(
                name.clone(),
                Table {
                    namespace: namespace.clone(),
                    name,
                    row_type,
                },
            );
        }
        self.namespaces.insert(namespace, merged);
    }

    pub fn register(&mut self, namespace: &str, name: &str, row_type: StructuralType) {
        self.register_tables(namespace, [(name.to_string(), row_type)]);
    }

    /// Register the table a schema document describes.
    pub fn register_document(&mut self, document: &SchemaDocument) -> Result<(), CatalogError> {
        let row_type = document.row_type()?;
        self.register(&document.database, &document.table_name, row_type);
        Ok(())
    }

    /// Register a logical schema as a table whose columns are its top-level fields.
    pub fn register_schema(
        &mut self,
        namespace: &str,
        name: &str,
        schema: &Schema,
    ) -> Result<(), CatalogError> {
        let columns = schema
            .fields()
            .iter()
            .map(|field| {
                field
                    .to_structural_type()
                    .map(|ty| StructField::new(field.name(), ty))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.register(namespace, name, StructuralType::Struct(columns));
        Ok(())
    }

    /// Resolve `namespace.table` or an unqualified `table` in the default namespace.
    pub fn resolve(&self, qualified_name: &str) -> Result<&Table, CatalogError> {
        let found = match qualified_name.split_once('.') {
            Some((namespace, name)) => self.table(Some(namespace), name),
            None => self.table(None, qualified_name),
        };
        found.ok_or_else(|| CatalogError::TableNotFound(qualified_name.to_string()))
    }

    pub fn table(&self, namespace: Option<&str>, name: &str) -> Option<&Table> {
        let namespace = namespace.unwrap_or(&self.default_namespace).to_lowercase();
        self.namespaces.get(&namespace)?.get(&name.to_lowercase())
    }

    /// Whether `db.table` is registered.
    ///
    /// Only exactly two dot-separated segments are accepted; unqualified and
    /// three-part names always return false.
    pub fn contains_table(&self, qualified_name: &str) -> bool {
        let parts: Vec<&str> = qualified_name.split('.').collect();
        match parts.as_slice() {
            [namespace, name] => self.table(Some(namespace), name).is_some(),
            _ => false,
        }
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.namespaces.values().flat_map(|tables| tables.values())
    }

    pub fn len(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register_builtin_tables(&mut self) {
        use StructuralType::{Double, Int32, Int64, String, Timestamp};

        let columns = |cols: &[(&str, StructuralType)]| {
            StructuralType::Struct(
                cols.iter()
                    .map(|(name, ty)| StructField::new(*name, ty.clone()))
                    .collect(),
            )
        };

        let default = self.default_namespace.clone();
        self.register(
            &default,
            "table1",
            columns(&[
                ("a", String),
                ("b", Int32),
                ("c", Double),
                ("arr", StructuralType::array(String)),
                ("ts", Timestamp),
            ]),
        );
        self.register(
            "dwh",
            "dim_agent",
            columns(&[
                ("email", String),
                ("name", String),
                ("site_code", String),
                ("site_name", String),
                ("uuid", String),
            ]),
        );
        self.register(
            "rta",
            "agent_state_updates",
            columns(&[
                ("agent_routing_mode", String),
                ("current_availability", String),
                ("current_state_detail", String),
                ("ts", Int64),
                ("agent_id", String),
            ]),
        );
    }
}
