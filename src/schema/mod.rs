//! Schema type model.
//!
//! Two inputs describe table shapes:
//!
//! - [`Schema`]: a logical field tree with metric/dimension flags, aliases and
//!   required filters. Validated at construction and immutable afterwards.
//! - [`SchemaDocument`]: the per-table column document loaded into the catalog.
//!
//! Both convert into [`StructuralType`], which is what identifier resolution
//! and operand typing work against.

mod document;
mod field;
mod logical;
mod types;

pub use document::{AttributeDocument, ColumnDocument, DataTypeDocument, SchemaDocument};
pub use field::{Field, FieldSpec, FieldType, GeoShape};
pub use logical::{build_flat_fields, pretty_print, Alias, RequiredFilter, Schema, SchemaSpec};
pub use types::{StructField, StructuralType, TypeFamily};

use std::path::PathBuf;

/// Errors raised while building schemas or loading schema documents.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Unrecognized field type: {0}")]
    UnrecognizedFieldType(String),

    #[error("Field [{field}] {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Field [{field}] of type {field_type} has no structural type")]
    UnsupportedFieldType { field: String, field_type: FieldType },

    #[error("Document type {type_name} ({field_type}) is not supported")]
    UnsupportedDocumentType {
        type_name: String,
        field_type: FieldType,
    },

    #[error("Schema must declare at least one field")]
    NoFields,

    #[error("Unknown field {field} referenced by {context}")]
    UnknownField { field: String, context: String },

    #[error("Alias {alias} declared for both {first} and {second}")]
    ConflictingAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Schema exceeds maximum printable depth of {0}")]
    TooDeep(usize),

    #[error("Malformed schema document: {0}")]
    MalformedDocument(String),

    #[error("Column {table}.{column}: {source}")]
    InColumn {
        table: String,
        column: String,
        #[source]
        source: Box<SchemaError>,
    },

    #[error("Failed to parse schema document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
