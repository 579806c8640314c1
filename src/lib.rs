//! # sqlbridge
//!
//! Translates Presto SQL statements into Hive SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Presto SQL text                          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql::frontend]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Node (syntax tree)                       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [validation]  <── catalog <── schema documents
//! ┌─────────────────────────────────────────────────────────┐
//! │           Node + TypeInfo (resolved, typed)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [rewrite + udf]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Node (Hive shaped)                       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql::unparse + dialect hooks]
//! ┌─────────────────────────────────────────────────────────┐
//! │                   Hive SQL text                          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`translation`] drives the stages; [`config`] describes how the catalog
//! and the stages are set up.

pub mod catalog;
pub mod config;
pub mod rewrite;
pub mod schema;
pub mod sql;
pub mod translation;
pub mod udf;
pub mod validation;

// Re-export SQL submodules at crate level for convenience
pub use sql::dialect;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::Catalog;
    pub use crate::config::Settings;
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::schema::{Schema, SchemaDocument, StructuralType};
    pub use crate::sql::{parse_query, Node, ParserOptions, UnparseOptions, Unparser};
    pub use crate::translation::{
        translate, SharedContext, Stage, Statement, TranslateError, TranslationContext,
    };
    pub use crate::udf::UdfRegistry;
}

// Also export at crate root for convenience
pub use dialect::Dialect;
pub use translation::{translate, TranslateError, TranslationContext};
