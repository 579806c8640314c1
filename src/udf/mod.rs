//! UDF conversion registry.
//!
//! Maps a source-dialect function name to the rule that rebuilds the call
//! for the target dialect. A rule is either a plain rename or a transform
//! that checks the call's operand shape and builds the replacement itself.
//!
//! Transforms are strict: an operand shape the transform does not expect is
//! a [`ConversionError`], never a best-effort guess.
//!
//! ```
//! use sqlbridge::udf::UdfRegistry;
//!
//! let registry = UdfRegistry::presto_to_hive();
//! assert!(registry.has_rule("TO_UNIXTIME"));
//! assert!(!registry.has_rule("substr"));
//! ```

pub mod format;
mod strategies;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::rewrite::RewriteContext;
use crate::sql::ast::{Call, Span};

/// A call could not be converted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// The call's operands do not have the shape the conversion requires.
    #[error("Unexpected {function} call {shape} at {position}: {reason}")]
    UnexpectedShape {
        function: String,
        shape: String,
        position: Span,
        reason: String,
    },

    /// A translated date/time format is not a valid target pattern.
    #[error("Converted date format '{converted}' (from '{format}') is not valid: {reason}")]
    InvalidFormat {
        format: String,
        converted: String,
        reason: String,
    },

    /// A type name has no equivalent in the target dialect.
    #[error("Type {type_name} has no {dialect} equivalent")]
    UnmappableType {
        type_name: String,
        dialect: &'static str,
    },
}

impl ConversionError {
    /// Shape error for `call`, naming its function and operands.
    pub fn unexpected(call: &Call, reason: impl Into<String>) -> Self {
        ConversionError::UnexpectedShape {
            function: call.name().to_string(),
            shape: call.shape(),
            position: call.span,
            reason: reason.into(),
        }
    }
}

/// Rebuilds one call for the target dialect.
pub type TransformFn =
    Arc<dyn Fn(&dyn RewriteContext, &Call) -> Result<Call, ConversionError> + Send + Sync>;

/// How a function is converted.
#[derive(Clone)]
pub enum ConversionRule {
    /// Same operands under another name.
    Rename(&'static str),
    Transform(TransformFn),
}

impl fmt::Debug for ConversionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionRule::Rename(to) => f.debug_tuple("Rename").field(to).finish(),
            ConversionRule::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Conversion rules keyed by lower-cased function name.
#[derive(Debug, Clone, Default)]
pub struct UdfRegistry {
    rules: HashMap<String, ConversionRule>,
}

impl UdfRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for translating Presto calls into Hive.
    pub fn presto_to_hive() -> Self {
        Self::new()
            .transform("now", strategies::now)
            .transform("to_unixtime", strategies::to_unixtime)
            .transform("date_diff", strategies::date_diff)
            .transform("date_format", strategies::date_format)
            .rename("approx_percentile", "percentile_approx")
            .rename("cardinality", "size")
    }

    pub fn rename(mut self, from: &str, to: &'static str) -> Self {
        self.rules
            .insert(from.to_lowercase(), ConversionRule::Rename(to));
        self
    }

    pub fn transform<F>(mut self, from: &str, f: F) -> Self
    where
        F: Fn(&dyn RewriteContext, &Call) -> Result<Call, ConversionError> + Send + Sync + 'static,
    {
        self.rules
            .insert(from.to_lowercase(), ConversionRule::Transform(Arc::new(f)));
        self
    }

    pub fn lookup(&self, function: &str) -> Option<&ConversionRule> {
        self.rules.get(&function.to_lowercase())
    }

    pub fn has_rule(&self, function: &str) -> bool {
        self.lookup(function).is_some()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Convert `call` if a rule exists for its function name.
    ///
    /// The returned call is complete: its operands have already been
    /// rewritten through `ctx`.
    pub fn convert(
        &self,
        ctx: &dyn RewriteContext,
        call: &Call,
    ) -> Result<Option<Call>, ConversionError> {
        let Some(rule) = self.lookup(call.name()) else {
            return Ok(None);
        };
        tracing::debug!(function = call.name(), rule = ?rule, "Converting call");

        let converted = match rule {
            ConversionRule::Rename(to) => {
                let operands = call
                    .operands
                    .iter()
                    .map(|operand| ctx.rewrite(operand))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut renamed = Call::function(*to, operands).at(call.span);
                renamed.quantifier = call.quantifier;
                renamed
            }
            ConversionRule::Transform(f) => f(ctx, call)?,
        };
        tracing::trace!(from = %call.shape(), to = %converted.shape(), "Converted call");
        Ok(Some(converted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::testing::IdentityContext;
    use crate::sql::ast::{Literal, LiteralValue, Node, Quantifier};

    #[test]
    fn test_lookup_ignores_case() {
        let registry = UdfRegistry::presto_to_hive();
        assert!(registry.has_rule("Date_Diff"));
        assert!(matches!(
            registry.lookup("APPROX_PERCENTILE"),
            Some(ConversionRule::Rename("percentile_approx"))
        ));
        assert!(registry.lookup("date_parse").is_none());
    }

    #[test]
    fn test_rename_keeps_operands_and_quantifier() {
        let registry = UdfRegistry::presto_to_hive();
        let mut call = Call::function(
            "approx_percentile",
            vec![
                Node::ident("eta"),
                Node::Literal(Literal::new(LiteralValue::Decimal("0.90".into()))),
            ],
        );
        call.quantifier = Some(Quantifier::All);
        let converted = registry
            .convert(&IdentityContext, &call)
            .unwrap()
            .unwrap();
        assert_eq!(converted.name(), "percentile_approx");
        assert_eq!(converted.operands, call.operands);
        assert_eq!(converted.quantifier, Some(Quantifier::All));
    }

    #[test]
    fn test_custom_rule() {
        let registry = UdfRegistry::new().transform("answer", |_, _| {
            Ok(Call::function("forty_two", vec![]))
        });
        let call = Call::function("ANSWER", vec![]);
        let converted = registry
            .convert(&IdentityContext, &call)
            .unwrap()
            .unwrap();
        assert_eq!(converted.name(), "forty_two");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_error_names_function_and_shape() {
        let call = Call::function("date_diff", vec![Node::string("hour")]);
        let err = ConversionError::unexpected(&call, "expected 3 operands");
        assert_eq!(
            err.to_string(),
            "Unexpected date_diff call date_diff('hour') at unknown position: expected 3 operands"
        );
    }
}
