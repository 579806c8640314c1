//! Operators: name, kind, syntax, arity and precedence of every callable construct.
//!
//! Precedences follow the usual Calcite table. Binary operators are left
//! associative: left precedence `p`, right precedence `p + 1`.

use std::borrow::Cow;
use std::fmt;

/// What an operator does, independent of how it is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    // Comparison
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    /// Null-safe equality (`<=>`, `IS NOT DISTINCT FROM`).
    NullEquals,
    IsDistinctFrom,

    // Logical
    And,
    Or,
    Not,

    // Arithmetic
    Plus,
    Minus,
    Times,
    Divide,
    /// Truncating integer division (`DIV`).
    IntegerDivide,
    Mod,
    Concat,
    UnaryMinus,
    UnaryPlus,

    // Predicates
    IsNull,
    IsNotNull,
    IsTrue,
    IsNotTrue,
    IsFalse,
    IsNotFalse,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    NotBetween,
    Exists,

    // Special forms
    Cast,
    Extract,
    As,
    Unnest,
    Over,
    ArrayValueConstructor,
    MapValueConstructor,

    // Set operations
    Union,
    Intersect,
    Except,

    /// Any named function call.
    OtherFunction,
}

/// How a call is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Binary,
    Prefix,
    Postfix,
    Function,
    /// A function written without parentheses (`CURRENT_DATE`).
    FunctionId,
    Special,
}

/// Number of operands an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Fixed(k) => n == k,
            Arity::AtLeast(k) => n >= k,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(k) => write!(f, "{}", k),
            Arity::AtLeast(k) => write!(f, "at least {}", k),
        }
    }
}

/// A callable construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub name: Cow<'static, str>,
    pub kind: OperatorKind,
    pub syntax: Syntax,
    pub arity: Arity,
    pub left_prec: u16,
    pub right_prec: u16,
}

/// Precedence assigned to self-delimiting constructs; never parenthesized.
pub const ATOM_PREC: u16 = 400;

impl Operator {
    pub const fn binary(name: &'static str, kind: OperatorKind, prec: u16) -> Self {
        Self::infix(name, kind, prec, Arity::Fixed(2))
    }

    /// Infix operator with a non-binary operand count (`BETWEEN`, `AS`).
    pub const fn infix(name: &'static str, kind: OperatorKind, prec: u16, arity: Arity) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind,
            syntax: Syntax::Binary,
            arity,
            left_prec: prec,
            right_prec: prec + 1,
        }
    }

    pub const fn prefix(name: &'static str, kind: OperatorKind, prec: u16) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind,
            syntax: Syntax::Prefix,
            arity: Arity::Fixed(1),
            left_prec: prec,
            right_prec: prec + 1,
        }
    }

    pub const fn postfix(name: &'static str, kind: OperatorKind, prec: u16) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind,
            syntax: Syntax::Postfix,
            arity: Arity::Fixed(1),
            left_prec: prec,
            right_prec: prec + 1,
        }
    }

    pub const fn special(name: &'static str, kind: OperatorKind, arity: Arity) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind,
            syntax: Syntax::Special,
            arity,
            left_prec: ATOM_PREC,
            right_prec: ATOM_PREC,
        }
    }

    /// A named function call with any number of operands.
    pub fn function(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            kind: OperatorKind::OtherFunction,
            syntax: Syntax::Function,
            arity: Arity::AtLeast(0),
            left_prec: ATOM_PREC,
            right_prec: ATOM_PREC,
        }
    }

    /// A niladic function written without parentheses.
    pub fn function_id(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            syntax: Syntax::FunctionId,
            arity: Arity::Fixed(0),
            ..Self::function(name)
        }
    }

    pub fn is_function(&self) -> bool {
        self.kind == OperatorKind::OtherFunction
    }

    /// Whether this is a named function call matching `name`, ignoring case.
    pub fn is_function_named(&self, name: &str) -> bool {
        self.is_function() && self.name.eq_ignore_ascii_case(name)
    }

    pub fn is_set_operation(&self) -> bool {
        matches!(
            self.kind,
            OperatorKind::Union | OperatorKind::Intersect | OperatorKind::Except
        )
    }
}

pub const OR: Operator = Operator::binary("OR", OperatorKind::Or, 22);
pub const AND: Operator = Operator::binary("AND", OperatorKind::And, 24);
pub const NOT: Operator = Operator::prefix("NOT", OperatorKind::Not, 26);

pub const IS_NULL: Operator = Operator::postfix("IS NULL", OperatorKind::IsNull, 28);
pub const IS_NOT_NULL: Operator = Operator::postfix("IS NOT NULL", OperatorKind::IsNotNull, 28);
pub const IS_TRUE: Operator = Operator::postfix("IS TRUE", OperatorKind::IsTrue, 28);
pub const IS_NOT_TRUE: Operator = Operator::postfix("IS NOT TRUE", OperatorKind::IsNotTrue, 28);
pub const IS_FALSE: Operator = Operator::postfix("IS FALSE", OperatorKind::IsFalse, 28);
pub const IS_NOT_FALSE: Operator =
    Operator::postfix("IS NOT FALSE", OperatorKind::IsNotFalse, 28);

pub const EQUALS: Operator = Operator::binary("=", OperatorKind::Equals, 30);
pub const NOT_EQUALS: Operator = Operator::binary("<>", OperatorKind::NotEquals, 30);
pub const LESS_THAN: Operator = Operator::binary("<", OperatorKind::LessThan, 30);
pub const GREATER_THAN: Operator = Operator::binary(">", OperatorKind::GreaterThan, 30);
pub const LESS_THAN_OR_EQUAL: Operator =
    Operator::binary("<=", OperatorKind::LessThanOrEqual, 30);
pub const GREATER_THAN_OR_EQUAL: Operator =
    Operator::binary(">=", OperatorKind::GreaterThanOrEqual, 30);
pub const NULL_EQUALS: Operator = Operator::binary("<=>", OperatorKind::NullEquals, 30);
pub const IS_DISTINCT_FROM: Operator =
    Operator::binary("IS DISTINCT FROM", OperatorKind::IsDistinctFrom, 30);

pub const LIKE: Operator = Operator::binary("LIKE", OperatorKind::Like, 32);
pub const NOT_LIKE: Operator = Operator::binary("NOT LIKE", OperatorKind::NotLike, 32);
pub const IN: Operator = Operator::binary("IN", OperatorKind::In, 32);
pub const NOT_IN: Operator = Operator::binary("NOT IN", OperatorKind::NotIn, 32);
pub const BETWEEN: Operator =
    Operator::infix("BETWEEN", OperatorKind::Between, 32, Arity::Fixed(3));
pub const NOT_BETWEEN: Operator =
    Operator::infix("NOT BETWEEN", OperatorKind::NotBetween, 32, Arity::Fixed(3));

pub const PLUS: Operator = Operator::binary("+", OperatorKind::Plus, 40);
pub const MINUS: Operator = Operator::binary("-", OperatorKind::Minus, 40);
pub const TIMES: Operator = Operator::binary("*", OperatorKind::Times, 60);
pub const DIVIDE: Operator = Operator::binary("/", OperatorKind::Divide, 60);
pub const INTEGER_DIVIDE: Operator = Operator::binary("DIV", OperatorKind::IntegerDivide, 60);
pub const MOD: Operator = Operator::binary("%", OperatorKind::Mod, 60);
pub const CONCAT: Operator = Operator::binary("||", OperatorKind::Concat, 60);
pub const UNARY_MINUS: Operator = Operator::prefix("-", OperatorKind::UnaryMinus, 80);
pub const UNARY_PLUS: Operator = Operator::prefix("+", OperatorKind::UnaryPlus, 80);

pub const EXISTS: Operator = Operator::special("EXISTS", OperatorKind::Exists, Arity::Fixed(1));
pub const CAST: Operator = Operator::special("CAST", OperatorKind::Cast, Arity::Fixed(2));
pub const TRY_CAST: Operator = Operator::special("TRY_CAST", OperatorKind::Cast, Arity::Fixed(2));
pub const EXTRACT: Operator = Operator::special("EXTRACT", OperatorKind::Extract, Arity::Fixed(2));
pub const UNNEST: Operator = Operator::special("UNNEST", OperatorKind::Unnest, Arity::AtLeast(1));
pub const ARRAY_VALUE_CONSTRUCTOR: Operator = Operator::special(
    "ARRAY",
    OperatorKind::ArrayValueConstructor,
    Arity::AtLeast(0),
);
pub const MAP_VALUE_CONSTRUCTOR: Operator = Operator::special(
    "MAP",
    OperatorKind::MapValueConstructor,
    Arity::AtLeast(0),
);

/// `expr AS alias [(col, ...)]`.
pub const AS: Operator = Operator::infix("AS", OperatorKind::As, 20, Arity::AtLeast(2));
pub const OVER: Operator = Operator::binary("OVER", OperatorKind::Over, 20);

pub const UNION: Operator = Operator::binary("UNION", OperatorKind::Union, 14);
pub const UNION_ALL: Operator = Operator::binary("UNION ALL", OperatorKind::Union, 14);
pub const EXCEPT: Operator = Operator::binary("EXCEPT", OperatorKind::Except, 14);
pub const EXCEPT_ALL: Operator = Operator::binary("EXCEPT ALL", OperatorKind::Except, 14);
pub const INTERSECT: Operator = Operator::binary("INTERSECT", OperatorKind::Intersect, 18);
pub const INTERSECT_ALL: Operator =
    Operator::binary("INTERSECT ALL", OperatorKind::Intersect, 18);
