//! Errors raised by the SQL front end and the unparser.

use super::ast::Span;

/// The input could not be parsed as a query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at {position}{}", excerpt_suffix(.excerpt))]
pub struct ParseError {
    pub message: String,
    pub position: Span,
    /// Offending source line followed by a caret line; empty when the
    /// position is unknown.
    pub excerpt: String,
}

fn excerpt_suffix(excerpt: &str) -> String {
    if excerpt.is_empty() {
        String::new()
    } else {
        format!("\n{}", excerpt)
    }
}

impl ParseError {
    /// Build an error pointing into `source`.
    pub fn at(message: impl Into<String>, source: &str, position: Span) -> Self {
        Self {
            message: message.into(),
            position,
            excerpt: excerpt(source, position),
        }
    }
}

/// Source line at `position` with a caret under the column.
pub fn excerpt(source: &str, position: Span) -> String {
    if !position.is_known() {
        return String::new();
    }
    let Some(line) = source.lines().nth(position.line as usize - 1) else {
        return String::new();
    };
    let pad = (position.column as usize)
        .saturating_sub(1)
        .min(line.chars().count());
    format!("{}\n{}^", line, " ".repeat(pad))
}

/// A construct with no representation on one side of the translation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedConstruct {
    /// The input uses syntax the front end does not lower.
    #[error("Unsupported SQL construct: {0}")]
    Syntax(String),

    /// The target dialect has no function of this name.
    #[error("Function {name} has no {dialect} equivalent")]
    Function { name: String, dialect: &'static str },

    /// The target dialect cannot express this shape.
    #[error("{construct} cannot be expressed in {dialect}: {detail}")]
    Render {
        construct: String,
        dialect: &'static str,
        detail: String,
    },
}
