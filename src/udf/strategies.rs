//! Presto to Hive conversion strategies.
//!
//! Each strategy documents the exact operand shape it accepts. Operands that
//! are carried over into the replacement are rewritten through the context.

use super::format::convert_time_format;
use super::ConversionError;
use crate::rewrite::RewriteContext;
use crate::sql::ast::{Call, Literal, Node};
use crate::sql::operator::{self, OperatorKind};

const UNIX_TIMESTAMP: &str = "unix_timestamp";

/// `now()` => `current_timestamp()`.
pub(super) fn now(_ctx: &dyn RewriteContext, call: &Call) -> Result<Call, ConversionError> {
    if !call.operands.is_empty() {
        return Err(ConversionError::unexpected(call, "now() takes no operands"));
    }
    Ok(Call::function("current_timestamp", vec![]).at(call.span))
}

/// `to_unixtime(date_parse(x, fmt))` => `unix_timestamp(x, fmt')`;
/// `to_unixtime(f(..))` => `unix_timestamp(f(..))`.
pub(super) fn to_unixtime(ctx: &dyn RewriteContext, call: &Call) -> Result<Call, ConversionError> {
    let [Node::Call(inner)] = call.operands.as_slice() else {
        return Err(ConversionError::unexpected(
            call,
            "expected a single function call operand",
        ));
    };
    if inner.kind() != OperatorKind::OtherFunction {
        return Err(ConversionError::unexpected(
            call,
            format!("operand {} is not a function call", inner.name()),
        ));
    }

    let converted = if inner.is_function_named("date_parse") {
        unix_timestamp_of_date_parse(ctx, call, inner)?
    } else {
        Call::function(UNIX_TIMESTAMP, vec![ctx.rewrite(&call.operands[0])?])
    };
    Ok(converted.at(call.span))
}

/// `date_diff('second', date_parse(a, fa), date_parse(b, fb))`
/// => `unix_timestamp(b, fb') - unix_timestamp(a, fa')`.
///
/// The result subtracts the start from the end, so the operands swap.
pub(super) fn date_diff(ctx: &dyn RewriteContext, call: &Call) -> Result<Call, ConversionError> {
    let [unit, start, end] = call.operands.as_slice() else {
        return Err(ConversionError::unexpected(call, "expected 3 operands"));
    };
    match unit.as_string_literal() {
        Some("second") => {}
        Some(other) => {
            return Err(ConversionError::unexpected(
                call,
                format!("unit '{}' is not supported, only 'second'", other),
            ))
        }
        None => {
            return Err(ConversionError::unexpected(
                call,
                "first operand must be a string literal",
            ))
        }
    }

    let parsed = |operand: &Node| match operand.as_call() {
        Some(inner) if inner.is_function_named("date_parse") => {
            unix_timestamp_of_date_parse(ctx, call, inner)
        }
        _ => Err(ConversionError::unexpected(
            call,
            format!("operand {} is not a date_parse call", operand.shape()),
        )),
    };
    let start = parsed(start)?;
    let end = parsed(end)?;

    Ok(Call::new(operator::MINUS, vec![Node::Call(end), Node::Call(start)]).at(call.span))
}

/// `date_format(ts, 'presto format')` => `date_format(ts, 'hive pattern')`.
pub(super) fn date_format(ctx: &dyn RewriteContext, call: &Call) -> Result<Call, ConversionError> {
    let [timestamp, format] = call.operands.as_slice() else {
        return Err(ConversionError::unexpected(call, "expected 2 operands"));
    };
    let Some(format) = format.as_string_literal() else {
        return Err(ConversionError::unexpected(
            call,
            "format must be a string literal",
        ));
    };

    let pattern = convert_time_format(format)?;
    let timestamp = ctx.rewrite(timestamp)?;
    Ok(call.with_operands(vec![timestamp, pattern_literal(&call.operands[1], pattern)]))
}

/// `date_parse(x, fmt)` => `unix_timestamp(x, fmt')`.
fn unix_timestamp_of_date_parse(
    ctx: &dyn RewriteContext,
    outer: &Call,
    date_parse: &Call,
) -> Result<Call, ConversionError> {
    let [value, format] = date_parse.operands.as_slice() else {
        return Err(ConversionError::unexpected(
            outer,
            "date_parse expects 2 operands",
        ));
    };
    let Some(text) = format.as_string_literal() else {
        return Err(ConversionError::unexpected(
            outer,
            "date_parse format must be a string literal",
        ));
    };

    let pattern = convert_time_format(text)?;
    Ok(Call::function(
        UNIX_TIMESTAMP,
        vec![ctx.rewrite(value)?, pattern_literal(format, pattern)],
    )
    .at(date_parse.span))
}

/// String literal carrying `pattern`, positioned where `original` was.
fn pattern_literal(original: &Node, pattern: String) -> Node {
    match original {
        Node::Literal(lit) => Node::Literal(Literal::string(pattern).at(lit.span)),
        _ => Node::string(pattern),
    }
}
