//! Translation driver.
//!
//! A statement moves through `Parsed -> Validated -> Rewritten` and is then
//! rendered. Each transition consumes the statement, so a failed step leaves
//! nothing half-translated behind: the caller holds either the next state or
//! a [`TranslateError`] naming the stage that failed.
//!
//! ```
//! use sqlbridge::translation::TranslationContext;
//!
//! let ctx = TranslationContext::default();
//! let hive = ctx.translate("SELECT now() FROM table1").unwrap();
//! assert_eq!(hive, "SELECT current_timestamp() FROM table1");
//! ```

mod context;

pub use context::{ContextError, SharedContext, TranslationContext};

use std::borrow::Cow;
use std::fmt;

use tracing::debug;

use crate::catalog::Catalog;
use crate::rewrite::HiveRewriter;
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::{
    parse_query, FrontendError, Node, ParseError, ParserOptions, UnparseOptions, Unparser,
    UnsupportedConstruct,
};
use crate::udf::{ConversionError, UdfRegistry};
use crate::validation::{self, TypeInfo, ValidationErrors, ValidationOptions};

/// Pipeline stage, for reporting where a translation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Parse,
    Validate,
    Rewrite,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parse => "parse",
            Stage::Validate => "validate",
            Stage::Rewrite => "rewrite",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// Why a statement could not be translated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranslateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("{source}")]
    UnsupportedConstruct {
        stage: Stage,
        source: UnsupportedConstruct,
    },
}

impl TranslateError {
    /// Stage the statement was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            TranslateError::Parse(_) => Stage::Parse,
            TranslateError::Validation(_) => Stage::Validate,
            TranslateError::Conversion(_) => Stage::Rewrite,
            TranslateError::UnsupportedConstruct { stage, .. } => *stage,
        }
    }

    fn unsupported(stage: Stage, source: UnsupportedConstruct) -> Self {
        TranslateError::UnsupportedConstruct { stage, source }
    }
}

impl From<FrontendError> for TranslateError {
    fn from(error: FrontendError) -> Self {
        match error {
            FrontendError::Parse(e) => TranslateError::Parse(e),
            FrontendError::Unsupported(e) => TranslateError::unsupported(Stage::Parse, e),
        }
    }
}

/// Parsed, not yet checked against the catalog.
#[derive(Debug)]
pub struct Parsed;

/// Resolved against the catalog, with inferred types.
#[derive(Debug)]
pub struct Validated {
    types: TypeInfo,
}

/// Rewritten for `target`.
#[derive(Debug)]
pub struct Rewritten {
    target: Dialect,
}

/// One statement on its way through the pipeline.
///
/// The tree is boxed so node identities recorded in [`TypeInfo`] stay valid
/// while the statement moves between states.
#[derive(Debug)]
pub struct Statement<S> {
    node: Box<Node>,
    state: S,
}

impl<S> Statement<S> {
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        *self.node
    }
}

impl Statement<Parsed> {
    #[tracing::instrument(level = "debug", skip_all, fields(len = sql.len()))]
    pub fn parse(sql: &str, options: &ParserOptions) -> Result<Self, TranslateError> {
        let node = parse_query(sql, options)?;
        debug!(shape = %node.shape(), "Parsed statement");
        Ok(Self {
            node: Box::new(node),
            state: Parsed,
        })
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn validate(
        self,
        catalog: &Catalog,
        options: ValidationOptions,
    ) -> Result<Statement<Validated>, TranslateError> {
        let types = validation::validate(&self.node, catalog, options)?;
        Ok(Statement {
            node: self.node,
            state: Validated { types },
        })
    }

    /// Move on without validating; the rewrite then has no type information.
    pub fn assume_valid(self) -> Statement<Validated> {
        Statement {
            node: self.node,
            state: Validated {
                types: TypeInfo::new(),
            },
        }
    }
}

impl Statement<Validated> {
    pub fn types(&self) -> &TypeInfo {
        &self.state.types
    }

    #[tracing::instrument(level = "debug", skip_all, fields(%source, %target))]
    pub fn rewrite(
        self,
        registry: &UdfRegistry,
        source: Dialect,
        target: Dialect,
    ) -> Result<Statement<Rewritten>, TranslateError> {
        let rewritten = match (source, target) {
            (source, target) if source == target => None,
            (Dialect::Presto, Dialect::Hive) => {
                let rewriter = HiveRewriter::new(registry).with_types(&self.state.types);
                match rewriter.apply(&self.node)? {
                    Cow::Borrowed(_) => None,
                    Cow::Owned(node) => Some(node),
                }
            }
            _ => {
                return Err(TranslateError::unsupported(
                    Stage::Rewrite,
                    UnsupportedConstruct::Render {
                        construct: format!("{} source", source.name()),
                        dialect: target.name(),
                        detail: "no rewrite rules for this pair of dialects".to_string(),
                    },
                ))
            }
        };
        debug!(changed = rewritten.is_some(), "Rewrote statement");

        Ok(Statement {
            node: rewritten.map(Box::new).unwrap_or(self.node),
            state: Rewritten { target },
        })
    }
}

impl Statement<Rewritten> {
    pub fn target(&self) -> Dialect {
        self.state.target
    }

    #[tracing::instrument(level = "debug", skip_all, fields(target = %self.state.target))]
    pub fn render(&self, options: UnparseOptions) -> Result<String, TranslateError> {
        Unparser::with_options(self.state.target, options)
            .to_sql(&self.node)
            .map_err(|e| TranslateError::unsupported(Stage::Render, e))
    }
}

/// Translate Presto `sql` to Hive with the built-in tables and default settings.
pub fn translate(sql: &str) -> Result<String, TranslateError> {
    static DEFAULT: SharedContext = SharedContext::new();
    let ctx = DEFAULT
        .get_or_try_init(|| Ok::<_, std::convert::Infallible>(TranslationContext::default()))
        .unwrap_or_else(|never| match never {});
    ctx.translate(sql)
}
