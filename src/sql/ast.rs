//! SQL syntax tree.
//!
//! A closed sum type over every node kind the engine understands. Nodes are
//! never mutated after construction; rewrites build new nodes (see
//! [`crate::rewrite`]) and rendering walks them read-only (see
//! [`crate::sql::unparse`]).

use std::fmt;

use super::operator::{self, Operator, OperatorKind};

// =============================================================================
// Positions
// =============================================================================

/// 1-based source position, kept for diagnostics only.
///
/// Positions never participate in node equality: two trees that differ only
/// in where their tokens came from compare equal.
#[derive(Debug, Clone, Copy, Default, Eq)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const UNKNOWN: Span = Span { line: 0, column: 0 };

    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl PartialEq for Span {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "line {}, column {}", self.line, self.column)
        } else {
            write!(f, "unknown position")
        }
    }
}

// =============================================================================
// Leaves
// =============================================================================

/// One component of an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub value: String,
    pub quoted: bool,
}

impl Name {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: false,
        }
    }

    pub fn quoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: true,
        }
    }

    pub fn matches(&self, other: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            self.value == other
        } else {
            self.value.eq_ignore_ascii_case(other)
        }
    }
}

/// A possibly qualified identifier, optionally ending in `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub names: Vec<Name>,
    pub star: bool,
}

impl Identifier {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            names: vec![Name::new(name)],
            star: false,
        }
    }

    pub fn compound<S: Into<String>>(parts: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: parts.into_iter().map(Name::new).collect(),
            star: false,
        }
    }

    /// `*` or `qualifier.*`.
    pub fn star(qualifier: Vec<Name>) -> Self {
        Self {
            names: qualifier,
            star: true,
        }
    }

    pub fn is_simple(&self) -> bool {
        !self.star && self.names.len() == 1
    }

    pub fn last(&self) -> Option<&Name> {
        self.names.last()
    }

    /// Dot-joined component values, without quoting.
    pub fn dotted(&self) -> String {
        let mut parts: Vec<&str> = self.names.iter().map(|n| n.value.as_str()).collect();
        if self.star {
            parts.push("*");
        }
        parts.join(".")
    }
}

/// Date/time unit used by `EXTRACT` and `INTERVAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    DayOfWeek,
    DayOfYear,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl TimeUnit {
    pub fn from_name(name: &str) -> Option<Self> {
        let unit = match name.to_ascii_uppercase().as_str() {
            "YEAR" | "YEARS" => TimeUnit::Year,
            "QUARTER" => TimeUnit::Quarter,
            "MONTH" | "MONTHS" => TimeUnit::Month,
            "WEEK" | "WEEKS" => TimeUnit::Week,
            "DAY" | "DAYS" | "DAY_OF_MONTH" => TimeUnit::Day,
            "DOW" | "DAY_OF_WEEK" | "DAYOFWEEK" => TimeUnit::DayOfWeek,
            "DOY" | "DAY_OF_YEAR" | "DAYOFYEAR" => TimeUnit::DayOfYear,
            "HOUR" | "HOURS" => TimeUnit::Hour,
            "MINUTE" | "MINUTES" => TimeUnit::Minute,
            "SECOND" | "SECONDS" => TimeUnit::Second,
            "MILLISECOND" | "MILLISECONDS" => TimeUnit::Millisecond,
            _ => return None,
        };
        Some(unit)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Year => "YEAR",
            TimeUnit::Quarter => "QUARTER",
            TimeUnit::Month => "MONTH",
            TimeUnit::Week => "WEEK",
            TimeUnit::Day => "DAY",
            TimeUnit::DayOfWeek => "DOW",
            TimeUnit::DayOfYear => "DOY",
            TimeUnit::Hour => "HOUR",
            TimeUnit::Minute => "MINUTE",
            TimeUnit::Second => "SECOND",
            TimeUnit::Millisecond => "MILLISECOND",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalQualifier {
    pub unit: TimeUnit,
}

/// Kind of a typed string literal (`DATE '2020-01-01'`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedLiteralKind {
    Date,
    Time,
    Timestamp,
}

impl TypedLiteralKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypedLiteralKind::Date => "DATE",
            TypedLiteralKind::Time => "TIME",
            TypedLiteralKind::Timestamp => "TIMESTAMP",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Integer(i64),
    /// Exact numeric, kept as written.
    Decimal(String),
    /// Approximate numeric (scientific notation).
    Double(f64),
    String(String),
    Typed {
        kind: TypedLiteralKind,
        value: String,
    },
    Interval {
        value: String,
        qualifier: IntervalQualifier,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: Span,
}

impl Literal {
    pub fn new(value: LiteralValue) -> Self {
        Self {
            value,
            span: Span::UNKNOWN,
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::new(LiteralValue::String(s.into()))
    }

    pub fn integer(n: i64) -> Self {
        Self::new(LiteralValue::Integer(n))
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Target type of a `CAST`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSpec {
    /// Upper-cased type name, e.g. `VARCHAR`.
    pub name: String,
    pub params: Vec<u32>,
}

impl TypeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
        }
    }

    pub fn with_name(&self, name: &str) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            params: self.params.clone(),
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(u32::to_string).collect();
            write!(f, "({})", params.join(", "))?;
        }
        Ok(())
    }
}

// =============================================================================
// Calls
// =============================================================================

/// `DISTINCT`/`ALL` inside an aggregate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Distinct,
    All,
}

/// An operator applied to operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub operator: Operator,
    pub operands: Vec<Node>,
    pub quantifier: Option<Quantifier>,
    pub span: Span,
}

impl Call {
    /// Build a call. The operand count must satisfy the operator's arity.
    pub fn new(operator: Operator, operands: Vec<Node>) -> Self {
        debug_assert!(
            operator.arity.accepts(operands.len()),
            "{} expects {} operands, got {}",
            operator.name,
            operator.arity,
            operands.len()
        );
        Self {
            operator,
            operands,
            quantifier: None,
            span: Span::UNKNOWN,
        }
    }

    /// A named function call.
    pub fn function(name: impl Into<std::borrow::Cow<'static, str>>, operands: Vec<Node>) -> Self {
        Self::new(Operator::function(name), operands)
    }

    pub fn kind(&self) -> OperatorKind {
        self.operator.kind
    }

    pub fn name(&self) -> &str {
        &self.operator.name
    }

    pub fn operand(&self, i: usize) -> Option<&Node> {
        self.operands.get(i)
    }

    pub fn is_function_named(&self, name: &str) -> bool {
        self.operator.is_function_named(name)
    }

    /// Same operator, quantifier and position over new operands.
    pub fn with_operands(&self, operands: Vec<Node>) -> Self {
        Self {
            operator: self.operator.clone(),
            operands,
            quantifier: self.quantifier,
            span: self.span,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Compact description of the call's operand shape, for diagnostics.
    pub fn shape(&self) -> String {
        let operands: Vec<String> = self.operands.iter().map(Node::shape).collect();
        format!("{}({})", self.operator.name, operands.join(", "))
    }
}

// =============================================================================
// Queries
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub distinct: bool,
    pub items: Vec<Node>,
    pub from: Option<Node>,
    pub where_clause: Option<Node>,
    pub group_by: Vec<Node>,
    pub having: Option<Node>,
}

impl Select {
    pub fn new(items: Vec<Node>) -> Self {
        Self {
            distinct: false,
            items,
            from: None,
            where_clause: None,
            group_by: Vec::new(),
            having: None,
        }
    }

    pub fn from(mut self, from: Node) -> Self {
        self.from = Some(from);
        self
    }

    pub fn filter(mut self, predicate: Node) -> Self {
        self.where_clause = Some(predicate);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// `a, b`
    Comma,
    Cross,
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    None,
    On(Node),
    Using(Vec<Name>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub left: Node,
    pub join_type: JoinType,
    pub condition: JoinCondition,
    pub right: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub name: Name,
    pub columns: Vec<Name>,
    pub query: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct With {
    pub items: Vec<WithItem>,
    pub body: Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullsOrder {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: Node,
    pub direction: Option<SortDir>,
    pub nulls: Option<NullsOrder>,
}

impl OrderItem {
    pub fn new(expr: Node) -> Self {
        Self {
            expr,
            direction: None,
            nulls: None,
        }
    }

    pub fn with_expr(&self, expr: Node) -> Self {
        Self {
            expr,
            direction: self.direction,
            nulls: self.nulls,
        }
    }
}

/// ORDER BY / OFFSET / LIMIT wrapped around a query.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub query: Node,
    pub items: Vec<OrderItem>,
    pub offset: Option<Node>,
    pub fetch: Option<Node>,
}

// =============================================================================
// Expressions with bespoke shape
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub operand: Option<Node>,
    pub whens: Vec<(Node, Node)>,
    pub else_result: Option<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameUnits {
    Rows,
    Range,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameBound {
    CurrentRow,
    /// `None` means UNBOUNDED.
    Preceding(Option<Node>),
    Following(Option<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    pub units: FrameUnits,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

/// Window specification; the right operand of `OVER`.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub partition_by: Vec<Node>,
    pub order_by: Vec<OrderItem>,
    pub frame: Option<WindowFrame>,
}

// =============================================================================
// Node
// =============================================================================

/// Any node of the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Identifier(Identifier),
    Literal(Literal),
    Call(Call),
    Select(Box<Select>),
    Join(Box<Join>),
    With(Box<With>),
    OrderBy(Box<OrderBy>),
    TypeSpec(TypeSpec),
    NodeList(Vec<Node>),
    IntervalQualifier(IntervalQualifier),
    Case(Box<Case>),
    Window(Box<Window>),
}

impl Node {
    pub fn ident(name: impl Into<String>) -> Node {
        Node::Identifier(Identifier::simple(name))
    }

    pub fn compound<S: Into<String>>(parts: impl IntoIterator<Item = S>) -> Node {
        Node::Identifier(Identifier::compound(parts))
    }

    pub fn string(s: impl Into<String>) -> Node {
        Node::Literal(Literal::string(s))
    }

    pub fn integer(n: i64) -> Node {
        Node::Literal(Literal::integer(n))
    }

    pub fn call(operator: Operator, operands: Vec<Node>) -> Node {
        Node::Call(Call::new(operator, operands))
    }

    pub fn function(name: &'static str, operands: Vec<Node>) -> Node {
        Node::Call(Call::function(name, operands))
    }

    /// `expr AS alias`.
    pub fn alias(self, alias: impl Into<String>) -> Node {
        Node::call(operator::AS, vec![self, Node::ident(alias)])
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Node::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Node::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Node::Identifier(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_string_literal(&self) -> Option<&str> {
        self.as_literal().and_then(Literal::as_str)
    }

    /// Whether this node is a complete query (usable as a subquery).
    pub fn is_query(&self) -> bool {
        match self {
            Node::Select(_) | Node::With(_) | Node::OrderBy(_) => true,
            Node::Call(call) => call.operator.is_set_operation(),
            _ => false,
        }
    }

    /// Short description used in error messages.
    pub fn shape(&self) -> String {
        match self {
            Node::Identifier(id) => id.dotted(),
            Node::Literal(lit) => match &lit.value {
                LiteralValue::String(s) => format!("'{}'", s),
                LiteralValue::Null => "NULL".into(),
                LiteralValue::Boolean(b) => b.to_string(),
                LiteralValue::Integer(n) => n.to_string(),
                LiteralValue::Decimal(d) => d.clone(),
                LiteralValue::Double(d) => d.to_string(),
                LiteralValue::Typed { kind, value } => format!("{} '{}'", kind.as_str(), value),
                LiteralValue::Interval { value, qualifier } => {
                    format!("INTERVAL '{}' {}", value, qualifier.unit.as_str())
                }
            },
            Node::Call(call) => call.shape(),
            Node::Select(_) | Node::With(_) | Node::OrderBy(_) => "<query>".into(),
            Node::Join(_) => "<join>".into(),
            Node::TypeSpec(spec) => spec.to_string(),
            Node::NodeList(items) => {
                let items: Vec<String> = items.iter().map(Node::shape).collect();
                format!("({})", items.join(", "))
            }
            Node::IntervalQualifier(q) => q.unit.as_str().into(),
            Node::Case(_) => "<case>".into(),
            Node::Window(_) => "<window>".into(),
        }
    }
}

impl From<Call> for Node {
    fn from(call: Call) -> Self {
        Node::Call(call)
    }
}

impl From<Select> for Node {
    fn from(select: Select) -> Self {
        Node::Select(Box::new(select))
    }
}

impl From<Join> for Node {
    fn from(join: Join) -> Self {
        Node::Join(Box::new(join))
    }
}
