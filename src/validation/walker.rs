use tracing::debug;

use super::scope::{Column, Lookup, Relation, Scope};
use super::{TypeInfo, UnknownFunctions, ValidationError, ValidationErrors, ValidationOptions};
use crate::catalog::{functions, Catalog};
use crate::schema::{StructuralType, TypeFamily};
use crate::sql::ast::{
    Call, Case, FrameBound, Identifier, Join, JoinCondition, LiteralValue, Node, OrderItem, Select,
    TypeSpec, TypedLiteralKind, Window, With,
};
use crate::sql::dialect::SqlDialect;
use crate::sql::operator::OperatorKind;

/// Walks one statement, building scopes as it descends.
pub struct Validator<'a> {
    catalog: &'a Catalog,
    options: ValidationOptions,
    /// Innermost query level last.
    scopes: Vec<Scope>,
    /// CTE names visible at each WITH level, innermost last.
    ctes: Vec<Vec<(String, Vec<Column>)>>,
    types: TypeInfo,
    errors: Vec<ValidationError>,
}

impl<'a> Validator<'a> {
    pub fn new(catalog: &'a Catalog, options: ValidationOptions) -> Self {
        Self {
            catalog,
            options,
            scopes: Vec::new(),
            ctes: Vec::new(),
            types: TypeInfo::new(),
            errors: Vec::new(),
        }
    }

    /// Validate a query, returning the types inferred for its expressions.
    pub fn validate(mut self, node: &Node) -> Result<TypeInfo, ValidationErrors> {
        let columns = self.query(node);
        debug!(
            columns = columns.len(),
            typed = self.types.len(),
            errors = self.errors.len(),
            "Validated statement"
        );
        if self.errors.is_empty() {
            Ok(self.types)
        } else {
            Err(ValidationErrors(self.errors))
        }
    }

    fn case_sensitive(&self) -> bool {
        self.options.case_sensitive
    }

    fn error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    fn malformed(&mut self, call: &Call) {
        self.error(ValidationError::MalformedCall {
            operator: call.name().to_string(),
            found: call.operands.len(),
            position: call.span,
        });
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Validate a query node and return its output columns.
    fn query(&mut self, node: &Node) -> Vec<Column> {
        match node {
            Node::Select(select) => self.select(select, &[]),
            Node::With(with) => self.with(with),
            Node::OrderBy(order_by) => {
                let columns = match &order_by.query {
                    Node::Select(select) => self.select(select, &order_by.items),
                    query => {
                        let columns = self.query(query);
                        self.scopes.push(Scope {
                            relations: vec![Relation::new("", columns.clone())],
                            aliases: Vec::new(),
                        });
                        self.order_items(&order_by.items);
                        self.scopes.pop();
                        columns
                    }
                };
                for expr in order_by.offset.iter().chain(order_by.fetch.iter()) {
                    self.expr(expr);
                }
                columns
            }
            Node::Call(call) if call.operator.is_set_operation() => {
                let [left, right] = call.operands.as_slice() else {
                    self.malformed(call);
                    return Vec::new();
                };
                let left = self.query(left);
                let right = self.query(right);
                if left.len() != right.len() {
                    self.error(ValidationError::SetOperationArity {
                        left: left.len(),
                        right: right.len(),
                    });
                }
                left
            }
            other => {
                self.expr(other);
                Vec::new()
            }
        }
    }

    fn with(&mut self, with: &With) -> Vec<Column> {
        self.ctes.push(Vec::new());
        for item in &with.items {
            let mut columns = self.query(&item.query);
            for (column, name) in columns.iter_mut().zip(&item.columns) {
                column.name = name.value.clone();
            }
            if let Some(frame) = self.ctes.last_mut() {
                frame.push((item.name.value.clone(), columns));
            }
        }
        let columns = self.query(&with.body);
        self.ctes.pop();
        columns
    }

    fn select(&mut self, select: &Select, order: &[OrderItem]) -> Vec<Column> {
        self.scopes.push(Scope::default());

        if let Some(from) = &select.from {
            self.from_item(from);
        }
        if let Some(predicate) = &select.where_clause {
            self.expr(predicate);
        }

        let mut output = Vec::new();
        for (i, item) in select.items.iter().enumerate() {
            output.extend(self.select_item(i, item));
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.aliases = output.clone();
        }

        for expr in &select.group_by {
            self.expr(expr);
        }
        if let Some(having) = &select.having {
            self.expr(having);
        }
        self.order_items(order);

        self.scopes.pop();
        output
    }

    fn select_item(&mut self, i: usize, item: &Node) -> Vec<Column> {
        match item {
            Node::Identifier(id) if id.star => self.star(id),
            Node::Call(call) if call.kind() == OperatorKind::As => {
                let [value, _, ..] = call.operands.as_slice() else {
                    self.malformed(call);
                    return Vec::new();
                };
                let ty = self.expr(value);
                let name = alias_name(call).unwrap_or_else(|| format!("_col{}", i));
                vec![Column::new(name, ty)]
            }
            Node::Identifier(id) => {
                let ty = self.expr(item);
                let name = id.last().map(|n| n.value.clone()).unwrap_or_default();
                vec![Column::new(name, ty)]
            }
            other => {
                let ty = self.expr(other);
                vec![Column::new(format!("_col{}", i), ty)]
            }
        }
    }

    /// Columns of `*` or `t.*`.
    fn star(&mut self, id: &Identifier) -> Vec<Column> {
        let case_sensitive = self.case_sensitive();
        let Some(scope) = self.scopes.last() else {
            return Vec::new();
        };
        if id.names.is_empty() {
            return scope
                .relations
                .iter()
                .flat_map(|r| r.columns.iter().cloned())
                .collect();
        }
        let columns = scope
            .relation(&id.names, case_sensitive)
            .map(|relation| relation.columns.clone());
        match columns {
            Some(columns) => columns,
            None => {
                let name = id.dotted();
                self.error(ValidationError::UnknownTable { name });
                Vec::new()
            }
        }
    }

    fn order_items(&mut self, items: &[OrderItem]) {
        for item in items {
            self.expr(&item.expr);
        }
    }

    // =========================================================================
    // FROM clause
    // =========================================================================

    /// Add the relations `node` introduces to the current scope.
    fn from_item(&mut self, node: &Node) {
        match node {
            Node::Join(join) => self.join(join),
            Node::Call(call) if call.kind() == OperatorKind::As => {
                let Some(alias) = alias_name(call) else {
                    self.expr(node);
                    return;
                };
                let [source, _, renamed @ ..] = call.operands.as_slice() else {
                    self.malformed(call);
                    return;
                };
                let mut relation = match self.relation(source, &alias) {
                    Some(relation) => relation,
                    None => return,
                };
                relation.alias = alias;
                let renamed: Vec<String> = renamed
                    .iter()
                    .filter_map(|n| n.as_identifier().and_then(Identifier::last))
                    .map(|n| n.value.clone())
                    .collect();
                relation.rename_columns(&renamed);
                self.push_relation(relation);
            }
            other => {
                let alias = match other {
                    Node::Identifier(id) => id.last().map(|n| n.value.clone()).unwrap_or_default(),
                    _ => String::new(),
                };
                if let Some(relation) = self.relation(other, &alias) {
                    self.push_relation(relation);
                }
            }
        }
    }

    fn push_relation(&mut self, relation: Relation) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.relations.push(relation);
        }
    }

    /// The relation a FROM item (without its alias) produces.
    fn relation(&mut self, node: &Node, alias: &str) -> Option<Relation> {
        match node {
            Node::Identifier(id) => Some(self.table(id, alias)),
            Node::Call(call) if call.kind() == OperatorKind::Unnest => {
                let mut columns = Vec::new();
                for operand in &call.operands {
                    match self.expr(operand) {
                        Some(StructuralType::Map(key, value)) => {
                            columns.push(Column::new("key", Some(*key)));
                            columns.push(Column::new("value", Some(*value)));
                        }
                        Some(StructuralType::Array(item)) => {
                            columns.push(Column::new(format!("_col{}", columns.len()), Some(*item)));
                        }
                        _ => columns.push(Column::new(format!("_col{}", columns.len()), None)),
                    }
                }
                Some(Relation::new(alias, columns))
            }
            query if query.is_query() => Some(Relation::new(alias, self.query(query))),
            Node::Join(join) => {
                self.join(join);
                None
            }
            other => {
                self.expr(other);
                Some(Relation::opaque(alias))
            }
        }
    }

    /// Resolve a table reference: CTE names first, then the catalog.
    fn table(&mut self, id: &Identifier, alias: &str) -> Relation {
        let case_sensitive = self.case_sensitive();
        if let [name] = id.names.as_slice() {
            let cte = self
                .ctes
                .iter()
                .rev()
                .flat_map(|frame| frame.iter().rev())
                .find(|(cte, _)| name.matches(cte, case_sensitive));
            if let Some((_, columns)) = cte {
                return Relation::new(alias, columns.clone());
            }
        }

        let catalog = self.catalog;
        let found = match id.names.as_slice() {
            [name] => catalog.table(None, &name.value),
            [namespace, name] => catalog.table(Some(&namespace.value), &name.value),
            _ => None,
        };
        match found {
            Some(table) => Relation::table(alias, table),
            None => {
                self.error(ValidationError::UnknownTable { name: id.dotted() });
                Relation::opaque(alias)
            }
        }
    }

    fn join(&mut self, join: &Join) {
        self.from_item(&join.left);
        self.from_item(&join.right);
        match &join.condition {
            JoinCondition::On(predicate) => {
                self.expr(predicate);
            }
            JoinCondition::Using(names) => {
                for name in names {
                    let case_sensitive = self.case_sensitive();
                    let found = self
                        .scopes
                        .last()
                        .map(|scope| scope.resolve(std::slice::from_ref(name), case_sensitive));
                    if matches!(found, Some(Lookup::Missing) | None) {
                        self.error(ValidationError::UnknownColumn {
                            name: name.value.clone(),
                        });
                    }
                }
            }
            JoinCondition::None => {}
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Check `node` and record its type when it can be inferred.
    fn expr(&mut self, node: &Node) -> Option<StructuralType> {
        let ty = self.infer(node);
        if let Some(ty) = &ty {
            self.types.insert(node, ty.clone());
        }
        ty
    }

    fn infer(&mut self, node: &Node) -> Option<StructuralType> {
        if node.is_query() {
            // Scalar subquery: the type of its single column.
            return self.query(node).into_iter().next().and_then(|c| c.ty);
        }
        match node {
            Node::Identifier(id) if id.star => None,
            Node::Identifier(id) => self.column(id),
            Node::Literal(lit) => literal_type(&lit.value),
            Node::Call(call) => self.call(call),
            Node::Case(case) => self.case(case),
            Node::Window(window) => {
                self.window(window);
                None
            }
            Node::NodeList(items) => {
                for item in items {
                    self.expr(item);
                }
                None
            }
            Node::Join(join) => {
                self.join(join);
                None
            }
            Node::TypeSpec(_) | Node::IntervalQualifier(_) => None,
            Node::Select(_) | Node::With(_) | Node::OrderBy(_) => None,
        }
    }

    /// Resolve a column reference, innermost scope first.
    fn column(&mut self, id: &Identifier) -> Option<StructuralType> {
        let case_sensitive = self.case_sensitive();
        let lookup = self
            .scopes
            .iter()
            .rev()
            .map(|scope| scope.resolve(&id.names, case_sensitive))
            .find(|lookup| *lookup != Lookup::Missing);
        match lookup {
            Some(Lookup::Found(ty)) => ty,
            Some(Lookup::Ambiguous(candidates)) => {
                self.error(ValidationError::AmbiguousColumn {
                    name: id.dotted(),
                    candidates,
                });
                None
            }
            Some(Lookup::Missing) | None => {
                self.error(ValidationError::UnknownColumn { name: id.dotted() });
                None
            }
        }
    }

    fn case(&mut self, case: &Case) -> Option<StructuralType> {
        if let Some(operand) = &case.operand {
            self.expr(operand);
        }
        let mut result = None;
        for (when, then) in &case.whens {
            self.expr(when);
            let ty = self.expr(then);
            result = result.or(ty);
        }
        if let Some(else_result) = &case.else_result {
            let ty = self.expr(else_result);
            result = result.or(ty);
        }
        result
    }

    fn window(&mut self, window: &Window) {
        for expr in &window.partition_by {
            self.expr(expr);
        }
        self.order_items(&window.order_by);
        if let Some(frame) = &window.frame {
            for bound in std::iter::once(&frame.start).chain(frame.end.iter()) {
                if let FrameBound::Preceding(Some(n)) | FrameBound::Following(Some(n)) = bound {
                    self.expr(n);
                }
            }
        }
    }

    fn call(&mut self, call: &Call) -> Option<StructuralType> {
        if !call.operator.arity.accepts(call.operands.len()) {
            self.malformed(call);
            return None;
        }
        match (call.kind(), call.operands.as_slice()) {
            (OperatorKind::Exists, [query]) => {
                self.query(query);
                return Some(StructuralType::Boolean);
            }
            (OperatorKind::Cast, [value, target]) => {
                self.expr(value);
                return match target {
                    Node::TypeSpec(spec) => cast_type(spec),
                    _ => None,
                };
            }
            (OperatorKind::Extract, [_, value]) => {
                self.expr(value);
                return Some(StructuralType::Int64);
            }
            (OperatorKind::As | OperatorKind::Over, [value, rest @ ..]) => {
                let ty = self.expr(value);
                for operand in rest {
                    if matches!(operand, Node::Window(_)) {
                        self.expr(operand);
                    }
                }
                return ty;
            }
            _ => {}
        }

        let operands: Vec<Option<StructuralType>> =
            call.operands.iter().map(|operand| self.expr(operand)).collect();

        match call.kind() {
            OperatorKind::OtherFunction => self.function(call, &operands),
            OperatorKind::Equals
            | OperatorKind::NotEquals
            | OperatorKind::LessThan
            | OperatorKind::GreaterThan
            | OperatorKind::LessThanOrEqual
            | OperatorKind::GreaterThanOrEqual
            | OperatorKind::NullEquals
            | OperatorKind::IsDistinctFrom
            | OperatorKind::Between
            | OperatorKind::NotBetween => {
                if let [first, rest @ ..] = operands.as_slice() {
                    for other in rest {
                        self.comparable(call, first, other);
                    }
                }
                Some(StructuralType::Boolean)
            }
            OperatorKind::And
            | OperatorKind::Or
            | OperatorKind::Not
            | OperatorKind::IsNull
            | OperatorKind::IsNotNull
            | OperatorKind::IsTrue
            | OperatorKind::IsNotTrue
            | OperatorKind::IsFalse
            | OperatorKind::IsNotFalse
            | OperatorKind::Like
            | OperatorKind::NotLike
            | OperatorKind::In
            | OperatorKind::NotIn => Some(StructuralType::Boolean),
            OperatorKind::Plus
            | OperatorKind::Minus
            | OperatorKind::Times
            | OperatorKind::Divide
            | OperatorKind::IntegerDivide
            | OperatorKind::Mod
            | OperatorKind::UnaryMinus
            | OperatorKind::UnaryPlus => self.arithmetic(call, &operands),
            OperatorKind::Concat => Some(StructuralType::String),
            OperatorKind::ArrayValueConstructor => operands
                .into_iter()
                .flatten()
                .next()
                .map(StructuralType::array),
            OperatorKind::MapValueConstructor => match operands.as_slice() {
                [Some(StructuralType::Array(key)), Some(StructuralType::Array(value))] => Some(
                    StructuralType::map(key.as_ref().clone(), value.as_ref().clone()),
                ),
                _ => None,
            },
            _ => None,
        }
    }

    fn function(
        &mut self,
        call: &Call,
        operands: &[Option<StructuralType>],
    ) -> Option<StructuralType> {
        let source = self.options.source;
        let reject = self.options.unknown_functions == UnknownFunctions::Reject;
        let unknown = || ValidationError::UnknownFunction {
            name: call.name().to_string(),
            dialect: source.name(),
        };

        let Some(def) = functions::lookup(call.name()) else {
            if reject {
                self.error(unknown());
            }
            return None;
        };
        if !def.available_in(source) && reject {
            self.error(unknown());
            return None;
        }
        if !def.accepts(operands.len()) {
            self.error(ValidationError::WrongArgumentCount {
                function: call.name().to_string(),
                expected: def.arity(),
                found: operands.len(),
                position: call.span,
            });
            return None;
        }
        def.return_type(operands)
    }

    fn arithmetic(
        &mut self,
        call: &Call,
        operands: &[Option<StructuralType>],
    ) -> Option<StructuralType> {
        for ty in operands.iter().flatten() {
            if !matches!(ty.family(), TypeFamily::Numeric | TypeFamily::Temporal) {
                self.error(ValidationError::TypeMismatch {
                    shape: call.shape(),
                    reason: format!("{} is not defined for {}", call.name(), ty),
                    position: call.span,
                });
                return None;
            }
        }

        let known: Vec<&StructuralType> = operands.iter().flatten().collect();
        if known.iter().any(|ty| ty.family() == TypeFamily::Temporal) {
            return Some(StructuralType::Timestamp);
        }
        if known.len() != operands.len() {
            return None;
        }
        if known.iter().any(|ty| **ty == StructuralType::Double) {
            Some(StructuralType::Double)
        } else if known.iter().any(|ty| **ty == StructuralType::Int64) {
            Some(StructuralType::Int64)
        } else {
            Some(StructuralType::Int32)
        }
    }

    fn comparable(
        &mut self,
        call: &Call,
        left: &Option<StructuralType>,
        right: &Option<StructuralType>,
    ) {
        let (Some(left), Some(right)) = (left, right) else {
            return;
        };
        if !families_compare(left.family(), right.family()) {
            self.error(ValidationError::TypeMismatch {
                shape: call.shape(),
                reason: format!("cannot compare {} with {}", left, right),
                position: call.span,
            });
        }
    }
}

fn families_compare(left: TypeFamily, right: TypeFamily) -> bool {
    use TypeFamily::{String, Temporal};
    left == right || matches!((left, right), (String, Temporal) | (Temporal, String))
}

fn alias_name(call: &Call) -> Option<String> {
    call.operand(1)
        .and_then(Node::as_identifier)
        .and_then(Identifier::last)
        .map(|name| name.value.clone())
}

fn literal_type(value: &LiteralValue) -> Option<StructuralType> {
    match value {
        LiteralValue::Null | LiteralValue::Interval { .. } => None,
        LiteralValue::Boolean(_) => Some(StructuralType::Boolean),
        LiteralValue::Integer(n) if i32::try_from(*n).is_ok() => Some(StructuralType::Int32),
        LiteralValue::Integer(_) => Some(StructuralType::Int64),
        LiteralValue::Decimal(_) | LiteralValue::Double(_) => Some(StructuralType::Double),
        LiteralValue::String(_) => Some(StructuralType::String),
        LiteralValue::Typed { kind, .. } => match kind {
            TypedLiteralKind::Date | TypedLiteralKind::Timestamp => {
                Some(StructuralType::Timestamp)
            }
            TypedLiteralKind::Time => Some(StructuralType::String),
        },
    }
}

fn cast_type(spec: &TypeSpec) -> Option<StructuralType> {
    let ty = match spec.name.as_str() {
        "VARCHAR" | "CHAR" | "STRING" => StructuralType::String,
        "TINYINT" | "SMALLINT" | "INT" | "INTEGER" => StructuralType::Int32,
        "BIGINT" => StructuralType::Int64,
        "DOUBLE" | "REAL" | "FLOAT" | "DECIMAL" | "NUMERIC" => StructuralType::Double,
        "BOOLEAN" | "BOOL" => StructuralType::Boolean,
        "DATE" | "TIMESTAMP" => StructuralType::Timestamp,
        _ => return None,
    };
    Some(ty)
}
