//! Validation of parsed queries against the catalog.
//!
//! The validator resolves every table and column reference, checks function
//! calls against the source dialect's function table and flags operand type
//! mismatches. Errors are collected rather than returned at the first one,
//! so a single pass reports everything wrong with a statement.
//!
//! What validation learns about types is returned as [`TypeInfo`], which the
//! rewrite pass consults (for instance to spot integer division).

mod scope;
mod walker;

pub use walker::Validator;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::schema::StructuralType;
use crate::sql::ast::{Node, Span};
use crate::sql::dialect::Dialect;

/// A reference or expression that does not check against the catalog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Table not found: {name}")]
    UnknownTable { name: String },

    #[error("Column not found: {name}")]
    UnknownColumn { name: String },

    #[error("Column {name} is ambiguous: could be {}", .candidates.join(" or "))]
    AmbiguousColumn {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Function {name} is not available in {dialect}")]
    UnknownFunction { name: String, dialect: &'static str },

    #[error("Function {function} expects {expected} arguments, got {found} at {position}")]
    WrongArgumentCount {
        function: String,
        expected: String,
        found: usize,
        position: Span,
    },

    #[error("Type mismatch in {shape} at {position}: {reason}")]
    TypeMismatch {
        shape: String,
        reason: String,
        position: Span,
    },

    #[error("Set operation inputs have {left} and {right} columns")]
    SetOperationArity { left: usize, right: usize },

    /// A call whose operand count its operator does not accept. Only trees
    /// built by hand can contain one.
    #[error("Malformed {operator} call with {found} operands at {position}")]
    MalformedCall {
        operator: String,
        found: usize,
        position: Span,
    },
}

/// Every error found in one statement. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn first(&self) -> &ValidationError {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [only] => write!(f, "{}", only),
            errors => {
                write!(f, "{} validation errors", errors.len())?;
                for error in errors {
                    write!(f, "\n  - {}", error)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// What to do with a function the source dialect's table does not list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFunctions {
    #[default]
    Reject,
    Allow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Dialect the statement was written in.
    pub source: Dialect,
    pub case_sensitive: bool,
    pub unknown_functions: UnknownFunctions,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            source: Dialect::Presto,
            case_sensitive: false,
            unknown_functions: UnknownFunctions::Reject,
        }
    }
}

/// Inferred expression types, keyed by node identity.
///
/// Entries refer to the exact tree that was validated; looking up a node of
/// another tree (even an equal one) finds nothing.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    types: HashMap<usize, StructuralType>,
}

impl TypeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: &Node, ty: StructuralType) {
        self.types.insert(key(node), ty);
    }

    pub fn get(&self, node: &Node) -> Option<&StructuralType> {
        self.types.get(&key(node))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn key(node: &Node) -> usize {
    node as *const Node as usize
}

/// Validate `node` with a fresh [`Validator`].
pub fn validate(
    node: &Node,
    catalog: &Catalog,
    options: ValidationOptions,
) -> Result<TypeInfo, ValidationErrors> {
    Validator::new(catalog, options).validate(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_info_is_keyed_by_identity() {
        let a = Node::ident("x");
        let b = Node::ident("x");
        let mut types = TypeInfo::new();
        types.insert(&a, StructuralType::Int32);
        assert_eq!(types.get(&a), Some(&StructuralType::Int32));
        assert_eq!(types.get(&b), None);
    }

    #[test]
    fn test_errors_display() {
        let one = ValidationErrors(vec![ValidationError::UnknownTable {
            name: "nope".into(),
        }]);
        assert_eq!(one.to_string(), "Table not found: nope");

        let two = ValidationErrors(vec![
            ValidationError::UnknownTable { name: "a".into() },
            ValidationError::UnknownColumn { name: "b".into() },
        ]);
        assert_eq!(
            two.to_string(),
            "2 validation errors\n  - Table not found: a\n  - Column not found: b"
        );
    }
}
