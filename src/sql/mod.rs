//! SQL syntax and rendering.
//!
//! - [`frontend`] - parses Presto text into the syntax tree
//! - [`ast`] - the syntax tree
//! - [`operator`] - operator table with precedence and syntax class
//! - [`unparse`] - renders a tree as text in a target dialect
//! - [`dialect`] - per-dialect quoting, reserved words and rendering hooks
//! - [`token`] - token stream the unparser builds

pub mod ast;
pub mod dialect;
pub mod error;
pub mod frontend;
pub mod operator;
pub mod token;
pub mod unparse;

#[cfg(test)]
pub mod test_utils;

pub use ast::{Call, Identifier, Literal, LiteralValue, Name, Node, Span};
pub use dialect::{Dialect, SqlDialect};
pub use error::{ParseError, UnsupportedConstruct};
pub use frontend::{parse_query, Casing, FrontendError, ParserOptions};
pub use operator::{Operator, OperatorKind};
pub use token::{Token, TokenStream};
pub use unparse::{UnparseOptions, Unparser};
