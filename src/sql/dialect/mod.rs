//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for the target dialects.
//! Each dialect implements `SqlDialect` to handle its specific syntax:
//!
//! - Identifier quoting: `"` (Presto), `` ` `` (Hive), applied only when needed
//! - String escaping: `''` (Presto) vs `\'` (Hive)
//! - Pagination: `OFFSET m LIMIT n` vs `LIMIT n OFFSET m`
//! - Special forms: MAP constructors, `||`, null-safe equality, UNNEST
//! - Function availability
//!
//! # Usage
//!
//! ```ignore
//! use sqlbridge::sql::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Hive;
//! let quoted = dialect.render_identifier("time");  // `time`
//! ```
//!
//! # Rendering hooks
//!
//! The unparser asks the dialect first for calls, joins and WITH clauses.
//! A hook returning `Ok(None)` falls back to the generic rendering in
//! [`crate::sql::unparse`].

pub mod helpers;
mod hive;
mod presto;

pub use hive::Hive;
pub use presto::Presto;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ast::{Call, Join, TypeSpec, With};
use super::error::UnsupportedConstruct;
use super::token::{Token, TokenStream};
use super::unparse::Unparser;

/// Result of a rendering hook: `None` defers to the generic rendering.
pub type HookResult = Result<Option<TokenStream>, UnsupportedConstruct>;

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier unconditionally.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Whether `word` is reserved in this dialect (case-insensitive).
    fn is_reserved(&self, word: &str) -> bool;

    /// Whether an identifier must be quoted to survive re-parsing.
    fn identifier_needs_quoting(&self, ident: &str) -> bool {
        helpers::needs_quoting(ident, |word| self.is_reserved(word))
    }

    /// Identifier as written in output: quoted only when required.
    fn render_identifier(&self, ident: &str) -> String {
        if self.identifier_needs_quoting(ident) {
            self.quote_identifier(ident)
        } else {
            ident.to_string()
        }
    }

    /// Quote a string literal.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    /// Format a NULL literal.
    fn format_null(&self) -> &'static str {
        "NULL"
    }

    /// Type name used inside `CAST`.
    fn type_name(&self, spec: &TypeSpec) -> String {
        spec.to_string()
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Emit LIMIT/OFFSET or equivalent pagination clause.
    ///
    /// - Hive: `LIMIT n OFFSET m` (default)
    /// - Presto: `OFFSET m LIMIT n` (override)
    fn emit_limit_offset(
        &self,
        limit: Option<TokenStream>,
        offset: Option<TokenStream>,
    ) -> TokenStream {
        let mut ts = TokenStream::new();

        if let Some(lim) = &limit {
            ts.push(Token::Limit).space().append(lim);
        }

        if let Some(off) = &offset {
            if limit.is_some() {
                ts.space();
            }
            ts.push(Token::Offset).space().append(off);
        }

        ts
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Whether the function table lists `name` for this dialect.
    fn knows_function(&self, name: &str) -> bool;

    // =========================================================================
    // Rendering Hooks
    // =========================================================================

    /// Render a call in a dialect-specific way. `left_prec`/`right_prec`
    /// are the binding strengths of the surrounding context.
    fn unparse_call(
        &self,
        _unparser: &Unparser,
        _call: &Call,
        _left_prec: u16,
        _right_prec: u16,
    ) -> HookResult {
        Ok(None)
    }

    /// Render a join in a dialect-specific way.
    fn unparse_join(&self, _unparser: &Unparser, _join: &Join) -> HookResult {
        Ok(None)
    }

    /// Render a WITH clause in a dialect-specific way.
    fn unparse_with(&self, _unparser: &Unparser, _with: &With) -> HookResult {
        Ok(None)
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Presto,
    #[default]
    Hive,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Presto => &Presto,
            Dialect::Hive => &Hive,
        }
    }
}

/// Unrecognized dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown SQL dialect: {0}")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "presto" => Ok(Dialect::Presto),
            "hive" => Ok(Dialect::Hive),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn is_reserved(&self, word: &str) -> bool {
        self.dialect().is_reserved(word)
    }

    fn identifier_needs_quoting(&self, ident: &str) -> bool {
        self.dialect().identifier_needs_quoting(ident)
    }

    fn render_identifier(&self, ident: &str) -> String {
        self.dialect().render_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn format_null(&self) -> &'static str {
        self.dialect().format_null()
    }

    fn type_name(&self, spec: &TypeSpec) -> String {
        self.dialect().type_name(spec)
    }

    fn emit_limit_offset(
        &self,
        limit: Option<TokenStream>,
        offset: Option<TokenStream>,
    ) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn knows_function(&self, name: &str) -> bool {
        self.dialect().knows_function(name)
    }

    fn unparse_call(
        &self,
        unparser: &Unparser,
        call: &Call,
        left_prec: u16,
        right_prec: u16,
    ) -> HookResult {
        self.dialect()
            .unparse_call(unparser, call, left_prec, right_prec)
    }

    fn unparse_join(&self, unparser: &Unparser, join: &Join) -> HookResult {
        self.dialect().unparse_join(unparser, join)
    }

    fn unparse_with(&self, unparser: &Unparser, with: &With) -> HookResult {
        self.dialect().unparse_with(unparser, with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_ignores_case() {
        assert_eq!("PRESTO".parse::<Dialect>(), Ok(Dialect::Presto));
        assert_eq!("hive".parse::<Dialect>(), Ok(Dialect::Hive));
        assert_eq!(
            "oracle".parse::<Dialect>(),
            Err(UnknownDialect("oracle".into()))
        );
    }

    #[test]
    fn test_reserved_words_differ() {
        assert!(Dialect::Hive.is_reserved("LATERAL"));
        assert!(!Dialect::Presto.is_reserved("partition"));
        assert!(Dialect::Hive.is_reserved("partition"));
        assert!(Dialect::Presto.is_reserved("unnest"));
    }

    #[test]
    fn test_render_identifier() {
        assert_eq!(Dialect::Hive.render_identifier("trip_uuid"), "trip_uuid");
        assert_eq!(Dialect::Hive.render_identifier("$path"), "`$path`");
        assert_eq!(Dialect::Presto.render_identifier("1st"), "\"1st\"");
        assert_eq!(Dialect::Presto.render_identifier("Order"), "\"Order\"");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(Dialect::Presto.quote_string("it's"), "'it''s'");
        assert_eq!(Dialect::Hive.quote_string("it's"), "'it\\'s'");
    }

    #[test]
    fn test_limit_offset_order() {
        let n = |v: i64| {
            let mut ts = TokenStream::new();
            ts.push(Token::LitInt(v));
            ts
        };
        assert_eq!(
            Dialect::Hive
                .emit_limit_offset(Some(n(10)), Some(n(5)))
                .serialize(Dialect::Hive),
            "LIMIT 10 OFFSET 5"
        );
        assert_eq!(
            Dialect::Presto
                .emit_limit_offset(Some(n(10)), Some(n(5)))
                .serialize(Dialect::Presto),
            "OFFSET 5 LIMIT 10"
        );
    }
}
