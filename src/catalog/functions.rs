//! Built-in function table.
//!
//! Each entry records which dialects provide the function, how many operands
//! it takes and how its result type is derived. Lookups are case-insensitive.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::schema::StructuralType;
use crate::sql::dialect::Dialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Scalar,
    Aggregate,
    Window,
    /// Produces rows rather than a value (`explode`).
    Generator,
}

/// How a call's result type is derived.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnRule {
    Fixed(StructuralType),
    /// Same type as the operand at this index.
    Operand(usize),
    /// Element type of the array operand at this index.
    Element(usize),
    Unknown,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: &'static str,
    pub kind: FunctionKind,
    pub min_args: usize,
    /// `None` means variadic.
    pub max_args: Option<usize>,
    pub returns: ReturnRule,
    pub dialects: &'static [Dialect],
    /// Names of equivalent functions in other dialects.
    pub synonyms: &'static [&'static str],
}

impl FunctionDef {
    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min_args && self.max_args.map_or(true, |max| n <= max)
    }

    pub fn available_in(&self, dialect: Dialect) -> bool {
        self.dialects.contains(&dialect)
    }

    /// Result type given the operand types, when it can be determined.
    pub fn return_type(&self, operands: &[Option<StructuralType>]) -> Option<StructuralType> {
        match &self.returns {
            ReturnRule::Fixed(ty) => Some(ty.clone()),
            ReturnRule::Operand(i) => operands.get(*i).cloned().flatten(),
            ReturnRule::Element(i) => match operands.get(*i) {
                Some(Some(StructuralType::Array(item))) => Some(item.as_ref().clone()),
                _ => None,
            },
            ReturnRule::Unknown => None,
        }
    }

    /// Human-readable operand count, e.g. `2`, `1..3` or `1+`.
    pub fn arity(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{}..{}", self.min_args, max),
            None => format!("{}+", self.min_args),
        }
    }
}

const BOTH: &[Dialect] = &[Dialect::Presto, Dialect::Hive];
const PRESTO: &[Dialect] = &[Dialect::Presto];
const HIVE: &[Dialect] = &[Dialect::Hive];

fn def(
    name: &'static str,
    kind: FunctionKind,
    min_args: usize,
    max_args: Option<usize>,
    returns: ReturnRule,
    dialects: &'static [Dialect],
) -> FunctionDef {
    FunctionDef {
        name,
        kind,
        min_args,
        max_args,
        returns,
        dialects,
        synonyms: &[],
    }
}

fn scalar(
    name: &'static str,
    min_args: usize,
    max_args: usize,
    returns: ReturnRule,
    dialects: &'static [Dialect],
) -> FunctionDef {
    def(name, FunctionKind::Scalar, min_args, Some(max_args), returns, dialects)
}

fn aggregate(name: &'static str, returns: ReturnRule) -> FunctionDef {
    def(name, FunctionKind::Aggregate, 1, Some(1), returns, BOTH)
}

fn window(name: &'static str, min_args: usize, max_args: usize) -> FunctionDef {
    def(
        name,
        FunctionKind::Window,
        min_args,
        Some(max_args),
        ReturnRule::Operand(0),
        BOTH,
    )
}

fn with_synonyms(mut def: FunctionDef, synonyms: &'static [&'static str]) -> FunctionDef {
    def.synonyms = synonyms;
    def
}

use FunctionKind::*;
use ReturnRule::{Element, Fixed, Operand, Unknown};
use StructuralType::{Boolean as BOOL, Double as DOUBLE, Int64 as BIGINT, String as STRING};
use StructuralType::Timestamp as TIMESTAMP;

static FUNCTIONS: Lazy<Vec<FunctionDef>> = Lazy::new(|| {
    vec![
        // Standard aggregates
        def("count", Aggregate, 0, Some(1), Fixed(BIGINT), BOTH),
        aggregate("sum", Operand(0)),
        aggregate("avg", Fixed(DOUBLE)),
        aggregate("min", Operand(0)),
        aggregate("max", Operand(0)),
        // Window functions
        def("row_number", Window, 0, Some(0), Fixed(BIGINT), BOTH),
        def("rank", Window, 0, Some(0), Fixed(BIGINT), BOTH),
        def("dense_rank", Window, 0, Some(0), Fixed(BIGINT), BOTH),
        window("lag", 1, 3),
        window("lead", 1, 3),
        window("first_value", 1, 1),
        window("last_value", 1, 1),
        // Standard scalars
        def("coalesce", Scalar, 1, None, Operand(0), BOTH),
        def("greatest", Scalar, 1, None, Operand(0), BOTH),
        def("least", Scalar, 1, None, Operand(0), BOTH),
        scalar("nullif", 2, 2, Operand(0), BOTH),
        scalar("if", 2, 3, Operand(1), BOTH),
        scalar("abs", 1, 1, Operand(0), BOTH),
        scalar("round", 1, 2, Operand(0), BOTH),
        scalar("floor", 1, 1, Fixed(BIGINT), BOTH),
        scalar("ceil", 1, 1, Fixed(BIGINT), BOTH),
        scalar("lower", 1, 1, Fixed(STRING), BOTH),
        scalar("upper", 1, 1, Fixed(STRING), BOTH),
        scalar("trim", 1, 1, Fixed(STRING), BOTH),
        scalar("length", 1, 1, Fixed(BIGINT), BOTH),
        scalar("substr", 2, 3, Fixed(STRING), BOTH),
        scalar("replace", 2, 3, Fixed(STRING), BOTH),
        scalar("regexp_replace", 2, 3, Fixed(STRING), BOTH),
        def("concat", Scalar, 1, None, Fixed(STRING), BOTH),
        scalar("date_format", 2, 2, Fixed(STRING), BOTH),
        scalar("date_trunc", 2, 2, Fixed(TIMESTAMP), BOTH),
        scalar("from_unixtime", 1, 2, Unknown, BOTH),
        scalar("current_date", 0, 0, Fixed(TIMESTAMP), BOTH),
        with_synonyms(
            scalar("current_timestamp", 0, 0, Fixed(TIMESTAMP), BOTH),
            &["now"],
        ),
        // Presto
        with_synonyms(
            scalar("now", 0, 0, Fixed(TIMESTAMP), PRESTO),
            &["current_timestamp"],
        ),
        scalar("from_iso8601_timestamp", 1, 1, Fixed(TIMESTAMP), PRESTO),
        with_synonyms(
            scalar("to_unixtime", 1, 1, Fixed(DOUBLE), PRESTO),
            &["unix_timestamp"],
        ),
        scalar("date_parse", 2, 2, Fixed(TIMESTAMP), PRESTO),
        scalar("to_timestamp_tz", 3, 3, Fixed(TIMESTAMP), PRESTO),
        scalar("at_timezone", 2, 2, Fixed(TIMESTAMP), PRESTO),
        scalar("date_diff", 3, 3, Fixed(BIGINT), PRESTO),
        scalar("great_circle_distance", 4, 4, Fixed(DOUBLE), PRESTO),
        scalar("contains", 2, 2, Fixed(BOOL), PRESTO),
        with_synonyms(scalar("cardinality", 1, 1, Fixed(BIGINT), PRESTO), &["size"]),
        with_synonyms(
            def("approx_percentile", Aggregate, 2, Some(3), Fixed(DOUBLE), PRESTO),
            &["percentile_approx"],
        ),
        def("min_by", Aggregate, 2, Some(2), Operand(0), PRESTO),
        def("max_by", Aggregate, 2, Some(2), Operand(0), PRESTO),
        // Hive
        with_synonyms(
            def("percentile_approx", Aggregate, 2, Some(3), Fixed(DOUBLE), HIVE),
            &["approx_percentile"],
        ),
        with_synonyms(
            scalar("unix_timestamp", 0, 2, Fixed(BIGINT), HIVE),
            &["to_unixtime"],
        ),
        with_synonyms(scalar("size", 1, 1, Fixed(BIGINT), HIVE), &["cardinality"]),
        scalar("date_add", 2, 2, Fixed(TIMESTAMP), HIVE),
        scalar("date_sub", 2, 2, Fixed(TIMESTAMP), HIVE),
        scalar("from_utc_timestamp", 2, 2, Fixed(TIMESTAMP), HIVE),
        scalar("get_hexagon_addr", 3, 3, Fixed(STRING), HIVE),
        scalar("esri.st_contains", 2, 2, Fixed(BOOL), HIVE),
        scalar("esri.st_point", 2, 2, Fixed(STRING), HIVE),
        scalar("esri.st_geomfromtext", 1, 1, Fixed(STRING), HIVE),
        def("explode", Generator, 1, Some(1), Element(0), HIVE),
    ]
});

static BY_NAME: Lazy<HashMap<&'static str, &'static FunctionDef>> =
    Lazy::new(|| FUNCTIONS.iter().map(|f| (f.name, f)).collect());

/// Look up a function by name, ignoring case.
pub fn lookup(name: &str) -> Option<&'static FunctionDef> {
    BY_NAME.get(name.to_ascii_lowercase().as_str()).copied()
}

/// Whether `dialect` provides a function named `name`.
pub fn is_available(name: &str, dialect: Dialect) -> bool {
    lookup(name).is_some_and(|f| f.available_in(dialect))
}

/// Name of the function equivalent to `name` in `dialect`.
///
/// Returns `name`'s own entry name when `dialect` already provides it.
pub fn equivalent(name: &str, dialect: Dialect) -> Option<&'static str> {
    let def = lookup(name)?;
    if def.available_in(dialect) {
        return Some(def.name);
    }
    def.synonyms
        .iter()
        .filter_map(|synonym| lookup(synonym))
        .find(|candidate| candidate.available_in(dialect))
        .map(|candidate| candidate.name)
}

/// All functions provided by `dialect`.
pub fn all(dialect: Dialect) -> impl Iterator<Item = &'static FunctionDef> {
    FUNCTIONS.iter().filter(move |f| f.available_in(dialect))
}
