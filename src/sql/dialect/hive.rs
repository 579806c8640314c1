//! Hive SQL dialect.
//!
//! Hive differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - Backslash escapes inside string literals
//! - `concat()` instead of `||`, `array()`/`map()` constructors
//! - No UNNEST: `CROSS JOIN UNNEST(x) AS t (c)` becomes `LATERAL VIEW explode(x) t AS c`
//! - No TRY_CAST; no DOW date part
//! - `<=>` for null-safe equality

use once_cell::sync::Lazy;
use std::collections::HashSet;

use super::helpers;
use super::{HookResult, SqlDialect};
use crate::catalog::functions;
use crate::sql::ast::{Call, Join, JoinCondition, JoinType, Node, TimeUnit, With};
use crate::sql::dialect::Dialect;
use crate::sql::error::UnsupportedConstruct;
use crate::sql::operator::{self, OperatorKind};
use crate::sql::token::{Token, TokenStream};
use crate::sql::unparse::Unparser;

static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    helpers::reserved_set(&[
        "array", "bigint", "binary", "boolean", "conf", "cube", "database", "exchange",
        "extended", "following", "function", "grouping", "import", "lateral", "less", "macro",
        "map", "more", "none", "out", "over", "partition", "percent", "preceding", "range",
        "reads", "reduce", "rollup", "row", "tablesample", "transform", "trigger", "truncate",
        "unbounded", "uniquejoin", "window",
    ])
});

/// Hive SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Hive;

impl SqlDialect for Hive {
    fn name(&self) -> &'static str {
        "hive"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn is_reserved(&self, word: &str) -> bool {
        helpers::is_reserved_in(word, &RESERVED)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)

    fn knows_function(&self, name: &str) -> bool {
        functions::is_available(name, Dialect::Hive)
    }

    fn unparse_call(
        &self,
        unparser: &Unparser,
        call: &Call,
        left_prec: u16,
        right_prec: u16,
    ) -> HookResult {
        match call.kind() {
            OperatorKind::OtherFunction => from_utc_timestamp(unparser, call),
            OperatorKind::Extract => day_of_week(unparser, call),
            OperatorKind::Concat => {
                let args = unparser.operands(&call.operands)?;
                Ok(Some(unparser.function_tokens("concat", &args)))
            }
            OperatorKind::ArrayValueConstructor => {
                let args = unparser.operands(&call.operands)?;
                Ok(Some(unparser.function_tokens("array", &args)))
            }
            OperatorKind::Cast if call.name() != operator::CAST.name => {
                // TRY_CAST degrades to CAST; Hive's CAST already yields NULL on failure
                let cast = Call::new(operator::CAST, call.operands.clone());
                unparser.default_call(&cast, left_prec, right_prec).map(Some)
            }
            OperatorKind::IsDistinctFrom => {
                let same = Node::call(operator::NULL_EQUALS, call.operands.clone());
                let negated = Call::new(operator::NOT, vec![same]);
                unparser.default_call(&negated, left_prec, right_prec).map(Some)
            }
            OperatorKind::Unnest => Err(self.unsupported(
                "UNNEST",
                "only CROSS JOIN UNNEST(expr) AS alias (column) has a LATERAL VIEW form",
            )),
            OperatorKind::As if call.operands.len() > 2 => Err(self.unsupported(
                "column alias list",
                "Hive cannot rename the columns of a relation",
            )),
            _ => Ok(None),
        }
    }

    fn unparse_join(&self, unparser: &Unparser, join: &Join) -> HookResult {
        let Some((array, alias, column)) = lateral_view_parts(join) else {
            return Ok(None);
        };

        let mut ts = unparser.from_item(&join.left)?;
        let explode = unparser.function_tokens("explode", &[unparser.expr(array)?]);
        ts.space()
            .push(Token::Lateral)
            .space()
            .push(Token::View)
            .space()
            .append(&explode)
            .space()
            .push(Token::Ident(alias.to_string()))
            .space()
            .push(Token::As)
            .space()
            .push(Token::Ident(column.to_string()));
        Ok(Some(ts))
    }

    fn unparse_with(&self, unparser: &Unparser, with: &With) -> HookResult {
        // A set operation as WITH body must be parenthesized for Hive's parser.
        unparser.with_clause(with, 100).map(Some)
    }
}

impl Hive {
    fn unsupported(&self, construct: &str, detail: &str) -> UnsupportedConstruct {
        UnsupportedConstruct::Render {
            construct: construct.to_string(),
            dialect: self.name(),
            detail: detail.to_string(),
        }
    }
}

/// `to_timestamp_tz(date_parse(x, fmt), 'UTC', tz)` => `from_utc_timestamp(x, tz)`.
///
/// Any other shape defers to the generic rendering.
fn from_utc_timestamp(unparser: &Unparser, call: &Call) -> HookResult {
    if !call.is_function_named("to_timestamp_tz") || call.operands.len() != 3 {
        return Ok(None);
    }
    let Some(parse) = call.operands[0].as_call() else {
        return Ok(None);
    };
    if parse.kind() != OperatorKind::OtherFunction
        || !parse.is_function_named("date_parse")
        || parse.operands.len() != 2
    {
        return Ok(None);
    }
    match call.operands[1].as_string_literal() {
        Some(zone) if zone.eq_ignore_ascii_case("utc") => {}
        _ => return Ok(None),
    }

    let args = [
        unparser.expr(&parse.operands[0])?,
        unparser.expr(&call.operands[2])?,
    ];
    Ok(Some(unparser.function_tokens("from_utc_timestamp", &args)))
}

/// `EXTRACT(DOW FROM x)` => `from_unixtime(unix_timestamp(x), 'u')`.
fn day_of_week(unparser: &Unparser, call: &Call) -> HookResult {
    let is_dow = matches!(
        call.operands.first(),
        Some(Node::IntervalQualifier(q)) if q.unit == TimeUnit::DayOfWeek
    );
    if !is_dow || call.operands.len() != 2 {
        return Ok(None);
    }

    let seconds = unparser.function_tokens("unix_timestamp", &[unparser.expr(&call.operands[1])?]);
    let mut pattern = TokenStream::new();
    pattern.push(Token::LitString("u".into()));
    Ok(Some(
        unparser.function_tokens("from_unixtime", &[seconds, pattern]),
    ))
}

/// Pieces of `left CROSS JOIN UNNEST(array) AS alias (column)`.
fn lateral_view_parts(join: &Join) -> Option<(&Node, &str, &str)> {
    if !matches!(join.join_type, JoinType::Cross | JoinType::Comma)
        || join.condition != JoinCondition::None
    {
        return None;
    }
    let alias = join.right.as_call()?;
    if alias.kind() != OperatorKind::As || alias.operands.len() != 3 {
        return None;
    }
    let unnest = alias.operands[0].as_call()?;
    if unnest.kind() != OperatorKind::Unnest || unnest.operands.len() != 1 {
        return None;
    }
    let table = alias.operands[1].as_identifier().filter(|id| id.is_simple())?;
    let column = alias.operands[2].as_identifier().filter(|id| id.is_simple())?;
    Some((
        &unnest.operands[0],
        &table.names[0].value,
        &column.names[0].value,
    ))
}
