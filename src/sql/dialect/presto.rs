//! Presto SQL dialect.
//!
//! Presto differences from ANSI:
//! - Double-quote identifier quoting, applied only to reserved words and odd names
//! - `MAP(ARRAY[k, ...], ARRAY[v, ...])` map constructor
//! - `IS NOT DISTINCT FROM` instead of `<=>`
//! - `OFFSET ... LIMIT ...` for pagination
//! - No `DIV`: integer division is `/` on integral operands

use once_cell::sync::Lazy;
use std::collections::HashSet;

use super::helpers;
use super::{HookResult, SqlDialect};
use crate::catalog::functions;
use crate::sql::ast::Call;
use crate::sql::dialect::Dialect;
use crate::sql::error::UnsupportedConstruct;
use crate::sql::operator::{self, OperatorKind};
use crate::sql::token::{Token, TokenStream};
use crate::sql::unparse::Unparser;

static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    helpers::reserved_set(&[
        "cube", "grouping", "localtime", "localtimestamp", "normalize", "recursive", "rollup",
        "uescape", "unnest",
    ])
});

/// Presto SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Presto;

impl SqlDialect for Presto {
    fn name(&self) -> &'static str {
        "presto"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn is_reserved(&self, word: &str) -> bool {
        helpers::is_reserved_in(word, &RESERVED)
    }

    fn emit_limit_offset(
        &self,
        limit: Option<TokenStream>,
        offset: Option<TokenStream>,
    ) -> TokenStream {
        let mut ts = TokenStream::new();

        if let Some(off) = &offset {
            ts.push(Token::Offset).space().append(off);
        }

        if let Some(lim) = &limit {
            if offset.is_some() {
                ts.space();
            }
            ts.push(Token::Limit).space().append(lim);
        }

        ts
    }

    fn knows_function(&self, name: &str) -> bool {
        functions::is_available(name, Dialect::Presto)
    }

    fn unparse_call(
        &self,
        unparser: &Unparser,
        call: &Call,
        left_prec: u16,
        right_prec: u16,
    ) -> HookResult {
        match call.kind() {
            OperatorKind::MapValueConstructor => map_constructor(unparser, call).map(Some),
            OperatorKind::NullEquals => unparser
                .binary(
                    &operator::NULL_EQUALS,
                    "IS NOT DISTINCT FROM",
                    &call.operands,
                    left_prec,
                    right_prec,
                )
                .map(Some),
            OperatorKind::IntegerDivide => unparser
                .binary(
                    &operator::INTEGER_DIVIDE,
                    operator::DIVIDE.name.as_ref(),
                    &call.operands,
                    left_prec,
                    right_prec,
                )
                .map(Some),
            _ => Ok(None),
        }
    }
}

/// `MAP(ARRAY[k1, k2], ARRAY[v1, v2])` from alternating key/value operands.
fn map_constructor(unparser: &Unparser, call: &Call) -> Result<TokenStream, UnsupportedConstruct> {
    if call.operands.len() % 2 != 0 {
        return Err(UnsupportedConstruct::Render {
            construct: "MAP".into(),
            dialect: Presto.name(),
            detail: format!(
                "expected alternating keys and values, got {} operands",
                call.operands.len()
            ),
        });
    }

    let mut keys = Vec::new();
    let mut values = Vec::new();
    for pair in call.operands.chunks(2) {
        keys.push(unparser.expr(&pair[0])?);
        values.push(unparser.expr(&pair[1])?);
    }

    let array = |items: &[TokenStream]| {
        let mut ts = TokenStream::new();
        ts.keyword("ARRAY")
            .push(Token::LBracket)
            .comma_separated(items)
            .push(Token::RBracket);
        ts
    };
    let mut ts = TokenStream::new();
    ts.keyword("MAP")
        .lparen()
        .append(&array(keys.as_slice()))
        .comma()
        .space()
        .append(&array(values.as_slice()))
        .rparen();
    Ok(ts)
}
