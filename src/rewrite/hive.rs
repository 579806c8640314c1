//! Presto to Hive rewrite pass.

use std::borrow::Cow;

use super::{rewrite, RewriteContext, Shuttle};
use crate::schema::StructuralType;
use crate::sql::ast::{Call, Node, TypeSpec};
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::operator::{self, OperatorKind};
use crate::udf::{ConversionError, UdfRegistry};
use crate::validation::TypeInfo;

/// Cast target renames. Parameters are dropped: Hive's STRING takes none.
const TYPE_RENAMES: &[(&str, &str)] = &[
    ("VARCHAR", "STRING"),
    ("REAL", "FLOAT"),
    ("VARBINARY", "BINARY"),
    ("BOOL", "BOOLEAN"),
];

/// Type names Hive accepts as cast targets unchanged.
const HIVE_TYPES: &[&str] = &[
    "TINYINT", "SMALLINT", "INT", "INTEGER", "BIGINT", "FLOAT", "DOUBLE", "DECIMAL",
    "NUMERIC", "BOOLEAN", "STRING", "CHAR", "DATE", "TIMESTAMP", "BINARY",
];

/// Rewrites a validated Presto tree into one Hive can render.
///
/// - calls with a conversion rule are handed to the [`UdfRegistry`]
/// - `/` over two integral operands becomes `DIV`, keeping Presto's
///   truncating semantics
/// - cast targets are mapped to Hive type names
pub struct HiveRewriter<'a> {
    registry: &'a UdfRegistry,
    types: Option<&'a TypeInfo>,
}

impl<'a> HiveRewriter<'a> {
    pub fn new(registry: &'a UdfRegistry) -> Self {
        Self {
            registry,
            types: None,
        }
    }

    /// Use inferred operand types to decide integer division.
    pub fn with_types(mut self, types: &'a TypeInfo) -> Self {
        self.types = Some(types);
        self
    }

    /// Rewrite `node`, borrowing it back when nothing needed to change.
    pub fn apply<'n>(&self, node: &'n Node) -> Result<Cow<'n, Node>, ConversionError> {
        super::walk(self, node)
    }

    fn is_integral(&self, node: &Node) -> bool {
        self.type_of(node).is_some_and(StructuralType::is_integral)
    }

    fn integer_division(&self, call: &Call) -> Result<Option<Node>, ConversionError> {
        let [left, right] = call.operands.as_slice() else {
            return Ok(None);
        };
        if !(self.is_integral(left) && self.is_integral(right)) {
            return Ok(None);
        }
        tracing::trace!(shape = %call.shape(), "Integer division");
        let operands = vec![self.rewrite(left)?, self.rewrite(right)?];
        Ok(Some(Node::Call(
            Call::new(operator::INTEGER_DIVIDE, operands).at(call.span),
        )))
    }
}

impl Shuttle for HiveRewriter<'_> {
    type Error = ConversionError;

    fn visit_call(&self, call: &Call) -> Result<Option<Node>, ConversionError> {
        match call.kind() {
            OperatorKind::OtherFunction => Ok(self.registry.convert(self, call)?.map(Node::Call)),
            OperatorKind::Divide => self.integer_division(call),
            _ => Ok(None),
        }
    }

    fn visit_type_spec(&self, spec: &TypeSpec) -> Result<Option<TypeSpec>, ConversionError> {
        if let Some((_, to)) = TYPE_RENAMES.iter().find(|(from, _)| *from == spec.name) {
            return Ok(Some(TypeSpec::new(*to)));
        }
        if HIVE_TYPES.contains(&spec.name.as_str()) {
            return Ok(None);
        }
        Err(ConversionError::UnmappableType {
            type_name: spec.to_string(),
            dialect: Dialect::Hive.name(),
        })
    }
}

impl RewriteContext for HiveRewriter<'_> {
    fn target(&self) -> Dialect {
        Dialect::Hive
    }

    fn rewrite(&self, node: &Node) -> Result<Node, ConversionError> {
        rewrite(self, node)
    }

    fn type_of(&self, node: &Node) -> Option<&StructuralType> {
        self.types.and_then(|types| types.get(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::Select;

    fn cast(value: Node, ty: TypeSpec) -> Node {
        Node::call(operator::CAST, vec![value, Node::TypeSpec(ty)])
    }

    #[test]
    fn test_varchar_becomes_string_without_params() {
        let registry = UdfRegistry::presto_to_hive();
        let mut varchar = TypeSpec::new("varchar");
        varchar.params = vec![10];
        let tree = cast(Node::ident("x"), varchar);

        let out = HiveRewriter::new(&registry).apply(&tree).unwrap();
        let cast = out.as_call().unwrap();
        assert_eq!(cast.operands[1], Node::TypeSpec(TypeSpec::new("STRING")));
    }

    #[test]
    fn test_known_types_pass_through() {
        let registry = UdfRegistry::presto_to_hive();
        let mut decimal = TypeSpec::new("DECIMAL");
        decimal.params = vec![10, 2];
        let tree = cast(Node::ident("x"), decimal);

        let out = HiveRewriter::new(&registry).apply(&tree).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_unmappable_type() {
        let registry = UdfRegistry::presto_to_hive();
        let tree = cast(Node::ident("x"), TypeSpec::new("JSON"));
        let err = HiveRewriter::new(&registry).apply(&tree).unwrap_err();
        assert_eq!(err.to_string(), "Type JSON has no hive equivalent");
    }

    #[test]
    fn test_registry_calls_nested_in_query() {
        let registry = UdfRegistry::presto_to_hive();
        let tree: Node = Select::new(vec![Node::function(
            "cardinality",
            vec![Node::function("now", vec![])],
        )])
        .into();

        let out = HiveRewriter::new(&registry).apply(&tree).unwrap();
        let Node::Select(select) = out.as_ref() else {
            panic!("expected SELECT");
        };
        let size = select.items[0].as_call().unwrap();
        assert_eq!(size.name(), "size");
        assert_eq!(size.operands[0].as_call().unwrap().name(), "current_timestamp");
    }

    #[test]
    fn test_division_without_types_is_kept() {
        let registry = UdfRegistry::presto_to_hive();
        let tree = Node::call(operator::DIVIDE, vec![Node::ident("a"), Node::ident("b")]);
        let out = HiveRewriter::new(&registry).apply(&tree).unwrap();
        assert_eq!(out.as_call().unwrap().kind(), OperatorKind::Divide);
    }

    #[test]
    fn test_integral_division_becomes_div() {
        let registry = UdfRegistry::presto_to_hive();
        let tree = Node::call(operator::DIVIDE, vec![Node::ident("a"), Node::integer(2)]);
        let Node::Call(call) = &tree else {
            unreachable!()
        };
        let mut types = TypeInfo::new();
        types.insert(&call.operands[0], StructuralType::Int32);
        types.insert(&call.operands[1], StructuralType::Int64);

        let out = HiveRewriter::new(&registry)
            .with_types(&types)
            .apply(&tree)
            .unwrap();
        assert_eq!(out.as_call().unwrap().kind(), OperatorKind::IntegerDivide);
    }
}
