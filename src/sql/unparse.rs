//! Unparser: renders a syntax tree as SQL text for a target dialect.
//!
//! Operators are parenthesized by comparing their precedences with the
//! binding strengths of the surrounding context. A node rendered with context
//! `(lp, rp)` is wrapped when `lp > op.left_prec`, or when
//! `op.right_prec <= rp` and `rp != 0`. Operands of a binary operator are
//! rendered with `(lp, op.left_prec)` on the left and `(op.right_prec, rp)`
//! on the right, so left-associative chains stay flat.
//!
//! Dialects get the first chance at calls, joins and WITH clauses through
//! the hooks on [`SqlDialect`].

use std::borrow::Cow;

use super::ast::{
    Call, Case, FrameBound, FrameUnits, Identifier, Join, JoinCondition, JoinType, Literal,
    LiteralValue, Node, NullsOrder, OrderBy, OrderItem, Quantifier, Select, SortDir, Window, With,
};
use super::dialect::{Dialect, SqlDialect};
use super::error::UnsupportedConstruct;
use super::operator::{Operator, OperatorKind, Syntax};
use super::token::{Token, TokenStream};

type Result<T> = std::result::Result<T, UnsupportedConstruct>;

/// Rendering switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnparseOptions {
    /// Start each clause on a new line.
    pub pretty: bool,
    /// Reject functions the target dialect does not list.
    pub check_functions: bool,
}

impl Default for UnparseOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            check_functions: true,
        }
    }
}

/// Renders nodes for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct Unparser {
    dialect: Dialect,
    options: UnparseOptions,
}

fn needs_parens(op: &Operator, left_prec: u16, right_prec: u16) -> bool {
    left_prec > op.left_prec || (op.right_prec <= right_prec && right_prec != 0)
}

impl Unparser {
    pub fn new(dialect: Dialect) -> Self {
        Self::with_options(dialect, UnparseOptions::default())
    }

    pub fn with_options(dialect: Dialect, options: UnparseOptions) -> Self {
        Self { dialect, options }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn options(&self) -> UnparseOptions {
        self.options
    }

    /// Render a complete statement.
    pub fn to_sql(&self, node: &Node) -> Result<String> {
        Ok(self.node(node, 0, 0)?.serialize(self.dialect))
    }

    /// Render `node` in a context with the given binding strengths.
    pub fn node(&self, node: &Node, left_prec: u16, right_prec: u16) -> Result<TokenStream> {
        match node {
            Node::Identifier(id) => Ok(self.identifier(id)),
            Node::Literal(lit) => Ok(self.literal(lit)),
            Node::Call(call) => self.call(call, left_prec, right_prec),
            Node::Select(select) => self.select(select),
            Node::Join(join) => self.join(join),
            Node::With(with) => self.with(with),
            Node::OrderBy(order_by) => self.order_by(order_by),
            Node::TypeSpec(spec) => {
                let mut ts = TokenStream::new();
                ts.keyword(self.dialect.type_name(spec));
                Ok(ts)
            }
            Node::NodeList(items) => {
                let items = self.operands(items)?;
                let mut ts = TokenStream::new();
                ts.comma_separated(&items);
                Ok(ts.parenthesized())
            }
            Node::IntervalQualifier(q) => {
                let mut ts = TokenStream::new();
                ts.keyword(q.unit.as_str());
                Ok(ts)
            }
            Node::Case(case) => self.case(case),
            Node::Window(window) => Ok(self.window(window)?.parenthesized()),
        }
    }

    /// Render a standalone expression; subqueries get parentheses.
    pub fn expr(&self, node: &Node) -> Result<TokenStream> {
        self.operand(node, 0, 0)
    }

    /// Render each node as a standalone expression.
    pub fn operands(&self, nodes: &[Node]) -> Result<Vec<TokenStream>> {
        nodes.iter().map(|node| self.expr(node)).collect()
    }

    /// Render an operand of an operator; subqueries get parentheses.
    fn operand(&self, node: &Node, left_prec: u16, right_prec: u16) -> Result<TokenStream> {
        if node.is_query() {
            Ok(self.node(node, 0, 0)?.parenthesized())
        } else {
            self.node(node, left_prec, right_prec)
        }
    }

    /// Render a FROM-clause item.
    pub fn from_item(&self, node: &Node) -> Result<TokenStream> {
        self.operand(node, 0, 0)
    }

    /// `name(arg, ...)` from already rendered arguments.
    pub fn function_tokens(&self, name: &str, args: &[TokenStream]) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::FunctionName(name.to_string()))
            .lparen()
            .comma_separated(args)
            .rparen();
        ts
    }

    /// Fail when function checking is on and the dialect lacks `name`.
    pub fn check_function(&self, name: &str) -> Result<()> {
        if self.options.check_functions && !self.dialect.knows_function(name) {
            return Err(UnsupportedConstruct::Function {
                name: name.to_string(),
                dialect: self.dialect.name(),
            });
        }
        Ok(())
    }

    fn clause_break(&self, ts: &mut TokenStream) {
        if self.options.pretty {
            ts.newline();
        } else {
            ts.space();
        }
    }

    fn malformed(&self, op: &Operator, count: usize) -> UnsupportedConstruct {
        UnsupportedConstruct::Render {
            construct: op.name.to_string(),
            dialect: self.dialect.name(),
            detail: format!("expected {} operands, got {}", op.arity, count),
        }
    }

    // =========================================================================
    // Leaves
    // =========================================================================

    fn identifier(&self, id: &Identifier) -> TokenStream {
        let mut ts = TokenStream::new();
        for (i, name) in id.names.iter().enumerate() {
            if i > 0 {
                ts.push(Token::Dot);
            }
            ts.push(Token::Ident(name.value.clone()));
        }
        if id.star {
            if !id.names.is_empty() {
                ts.push(Token::Dot);
            }
            ts.push(Token::Star);
        }
        ts
    }

    fn literal(&self, lit: &Literal) -> TokenStream {
        let mut ts = TokenStream::new();
        match &lit.value {
            LiteralValue::Null => ts.push(Token::Null),
            LiteralValue::Boolean(b) => ts.push(Token::LitBool(*b)),
            LiteralValue::Integer(n) => ts.push(Token::LitInt(*n)),
            LiteralValue::Decimal(text) => ts.push(Token::LitNumeric(text.clone())),
            LiteralValue::Double(f) => ts.push(Token::LitFloat(*f)),
            LiteralValue::String(s) => ts.push(Token::LitString(s.clone())),
            LiteralValue::Typed { kind, value } => ts
                .keyword(kind.as_str())
                .space()
                .push(Token::LitString(value.clone())),
            LiteralValue::Interval { value, qualifier } => ts
                .push(Token::Interval)
                .space()
                .push(Token::LitString(value.clone()))
                .space()
                .keyword(qualifier.unit.as_str()),
        };
        ts
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// Render a call, letting the dialect intercept it first.
    pub fn call(&self, call: &Call, left_prec: u16, right_prec: u16) -> Result<TokenStream> {
        if let Some(ts) = self
            .dialect
            .unparse_call(self, call, left_prec, right_prec)?
        {
            return Ok(ts);
        }
        self.default_call(call, left_prec, right_prec)
    }

    /// Generic rendering of a call, ignoring dialect hooks.
    pub fn default_call(&self, call: &Call, left_prec: u16, right_prec: u16) -> Result<TokenStream> {
        let op = &call.operator;
        match op.kind {
            OperatorKind::OtherFunction => self.function(call),
            OperatorKind::Union | OperatorKind::Intersect | OperatorKind::Except => {
                self.set_operation(call, left_prec, right_prec)
            }
            OperatorKind::Between | OperatorKind::NotBetween => {
                self.between(call, left_prec, right_prec)
            }
            OperatorKind::As => self.alias(call, left_prec),
            OperatorKind::Over => self.over(call),
            OperatorKind::Exists => {
                let [query] = call.operands.as_slice() else {
                    return Err(self.malformed(op, call.operands.len()));
                };
                let mut ts = TokenStream::new();
                ts.keyword(op.name.clone())
                    .space()
                    .append(&self.node(query, 0, 0)?.parenthesized());
                Ok(ts)
            }
            OperatorKind::Cast => self.special(call, Token::As),
            OperatorKind::Extract => self.special(call, Token::From),
            OperatorKind::ArrayValueConstructor => {
                let items = self.operands(&call.operands)?;
                let mut ts = TokenStream::new();
                ts.keyword(op.name.clone())
                    .push(Token::LBracket)
                    .comma_separated(&items)
                    .push(Token::RBracket);
                Ok(ts)
            }
            _ => match op.syntax {
                Syntax::Binary => self.binary(op, &op.name, &call.operands, left_prec, right_prec),
                Syntax::Prefix => self.prefix(op, &call.operands, left_prec, right_prec),
                Syntax::Postfix => self.postfix(op, &call.operands, left_prec, right_prec),
                Syntax::Function | Syntax::FunctionId | Syntax::Special => {
                    let args = self.operands(&call.operands)?;
                    let mut ts = TokenStream::new();
                    ts.keyword(op.name.clone())
                        .lparen()
                        .comma_separated(&args)
                        .rparen();
                    Ok(ts)
                }
            },
        }
    }

    /// `left <spelling> right` with the precedences of `op`.
    pub fn binary(
        &self,
        op: &Operator,
        spelling: &str,
        operands: &[Node],
        left_prec: u16,
        right_prec: u16,
    ) -> Result<TokenStream> {
        let [left, right] = operands else {
            return Err(self.malformed(op, operands.len()));
        };
        let wrap = needs_parens(op, left_prec, right_prec);
        let (left_prec, right_prec) = if wrap { (0, 0) } else { (left_prec, right_prec) };

        let mut ts = self.operand(left, left_prec, op.left_prec)?;
        ts.space()
            .push(Token::Operator(Cow::Owned(spelling.to_string())))
            .space()
            .append(&self.operand(right, op.right_prec, right_prec)?);
        Ok(if wrap { ts.parenthesized() } else { ts })
    }

    fn prefix(
        &self,
        op: &Operator,
        operands: &[Node],
        left_prec: u16,
        right_prec: u16,
    ) -> Result<TokenStream> {
        let [operand] = operands else {
            return Err(self.malformed(op, operands.len()));
        };
        let wrap = needs_parens(op, left_prec, right_prec);
        let right_prec = if wrap { 0 } else { right_prec };

        let mut ts = TokenStream::new();
        ts.push(Token::Operator(op.name.clone()));
        // `- -1` must not collapse into a `--` comment
        let word = op.name.chars().all(|c| c.is_ascii_alphabetic());
        if word || starts_with_minus(operand) {
            ts.space();
        }
        ts.append(&self.operand(operand, op.right_prec, right_prec)?);
        Ok(if wrap { ts.parenthesized() } else { ts })
    }

    fn postfix(
        &self,
        op: &Operator,
        operands: &[Node],
        left_prec: u16,
        right_prec: u16,
    ) -> Result<TokenStream> {
        let [operand] = operands else {
            return Err(self.malformed(op, operands.len()));
        };
        let wrap = needs_parens(op, left_prec, right_prec);
        let left_prec = if wrap { 0 } else { left_prec };

        // Neither target grammar chains a predicate onto a comparison.
        let mut ts = match operand.as_call() {
            Some(inner) if matches!(inner.operator.syntax, Syntax::Binary | Syntax::Prefix) => {
                self.node(operand, 0, 0)?.parenthesized()
            }
            _ => self.operand(operand, left_prec, op.left_prec)?,
        };
        ts.space().push(Token::Operator(op.name.clone()));
        Ok(if wrap { ts.parenthesized() } else { ts })
    }

    fn between(&self, call: &Call, left_prec: u16, right_prec: u16) -> Result<TokenStream> {
        let op = &call.operator;
        let [value, low, high] = call.operands.as_slice() else {
            return Err(self.malformed(op, call.operands.len()));
        };
        let wrap = needs_parens(op, left_prec, right_prec);
        let (left_prec, right_prec) = if wrap { (0, 0) } else { (left_prec, right_prec) };

        let mut ts = self.operand(value, left_prec, op.left_prec)?;
        ts.space()
            .push(Token::Operator(op.name.clone()))
            .space()
            .append(&self.operand(low, op.right_prec, op.left_prec)?)
            .space()
            .push(Token::And)
            .space()
            .append(&self.operand(high, op.right_prec, right_prec)?);
        Ok(if wrap { ts.parenthesized() } else { ts })
    }

    /// `expr AS alias [(col, ...)]`.
    fn alias(&self, call: &Call, left_prec: u16) -> Result<TokenStream> {
        let op = &call.operator;
        let [expr, alias, columns @ ..] = call.operands.as_slice() else {
            return Err(self.malformed(op, call.operands.len()));
        };

        let mut ts = self.operand(expr, left_prec, op.left_prec)?;
        ts.space()
            .push(Token::As)
            .space()
            .append(&self.node(alias, 0, 0)?);
        if !columns.is_empty() {
            let columns = self.operands(columns)?;
            let mut list = TokenStream::new();
            list.comma_separated(&columns);
            ts.space().append(&list.parenthesized());
        }
        Ok(ts)
    }

    /// `call OVER (window)`.
    fn over(&self, call: &Call) -> Result<TokenStream> {
        let op = &call.operator;
        let [function, window] = call.operands.as_slice() else {
            return Err(self.malformed(op, call.operands.len()));
        };
        let mut ts = self.node(function, 0, 0)?;
        ts.space().push(Token::Over).space();
        match window {
            Node::Window(window) => ts.append(&self.window(window)?.parenthesized()),
            other => ts.append(&self.node(other, 0, 0)?),
        };
        Ok(ts)
    }

    /// `NAME(a <separator> b)` for CAST and EXTRACT.
    fn special(&self, call: &Call, separator: Token) -> Result<TokenStream> {
        let op = &call.operator;
        let [first, second] = call.operands.as_slice() else {
            return Err(self.malformed(op, call.operands.len()));
        };
        let mut ts = TokenStream::new();
        ts.keyword(op.name.clone())
            .lparen()
            .append(&self.expr(first)?)
            .space()
            .push(separator)
            .space()
            .append(&self.expr(second)?)
            .rparen();
        Ok(ts)
    }

    fn function(&self, call: &Call) -> Result<TokenStream> {
        self.check_function(call.name())?;
        let mut ts = TokenStream::new();
        if call.operator.syntax == Syntax::FunctionId && call.operands.is_empty() {
            ts.push(Token::FunctionName(call.name().to_string()));
            return Ok(ts);
        }
        let args = self.operands(&call.operands)?;
        ts.push(Token::FunctionName(call.name().to_string())).lparen();
        if call.quantifier == Some(Quantifier::Distinct) {
            ts.push(Token::Distinct).space();
        }
        ts.comma_separated(&args).rparen();
        Ok(ts)
    }

    fn set_operation(&self, call: &Call, left_prec: u16, right_prec: u16) -> Result<TokenStream> {
        let op = &call.operator;
        let [left, right] = call.operands.as_slice() else {
            return Err(self.malformed(op, call.operands.len()));
        };
        let wrap = needs_parens(op, left_prec, right_prec);
        let (left_prec, right_prec) = if wrap { (0, 0) } else { (left_prec, right_prec) };

        let mut ts = self.set_operand(left, left_prec, op.left_prec)?;
        self.clause_break(&mut ts);
        ts.push(Token::Operator(op.name.clone()));
        self.clause_break(&mut ts);
        ts.append(&self.set_operand(right, op.right_prec, right_prec)?);
        Ok(if wrap { ts.parenthesized() } else { ts })
    }

    fn set_operand(&self, node: &Node, left_prec: u16, right_prec: u16) -> Result<TokenStream> {
        match node {
            Node::With(_) | Node::OrderBy(_) => Ok(self.node(node, 0, 0)?.parenthesized()),
            _ => self.node(node, left_prec, right_prec),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn select(&self, select: &Select) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(Token::Select).space();
        if select.distinct {
            ts.push(Token::Distinct).space();
        }
        ts.comma_separated(&self.operands(&select.items)?);

        if let Some(from) = &select.from {
            self.clause_break(&mut ts);
            ts.push(Token::From).space().append(&self.from_item(from)?);
        }
        if let Some(predicate) = &select.where_clause {
            self.clause_break(&mut ts);
            ts.push(Token::Where).space().append(&self.expr(predicate)?);
        }
        if !select.group_by.is_empty() {
            self.clause_break(&mut ts);
            ts.push(Token::GroupBy)
                .space()
                .comma_separated(&self.operands(&select.group_by)?);
        }
        if let Some(predicate) = &select.having {
            self.clause_break(&mut ts);
            ts.push(Token::Having).space().append(&self.expr(predicate)?);
        }
        Ok(ts)
    }

    /// Render a join, letting the dialect intercept it first.
    pub fn join(&self, join: &Join) -> Result<TokenStream> {
        if let Some(ts) = self.dialect.unparse_join(self, join)? {
            return Ok(ts);
        }
        self.default_join(join)
    }

    fn default_join(&self, join: &Join) -> Result<TokenStream> {
        let mut ts = self.from_item(&join.left)?;
        if join.join_type == JoinType::Comma {
            ts.comma();
        }
        self.clause_break(&mut ts);
        match join.join_type {
            JoinType::Comma => {}
            JoinType::Cross => {
                ts.push(Token::Cross).space().push(Token::Join).space();
            }
            JoinType::Inner => {
                ts.push(Token::Inner).space().push(Token::Join).space();
            }
            JoinType::Left => {
                ts.push(Token::Left).space().push(Token::Join).space();
            }
            JoinType::Right => {
                ts.push(Token::Right).space().push(Token::Join).space();
            }
            JoinType::Full => {
                ts.push(Token::Full).space().push(Token::Join).space();
            }
        }

        let right = match &join.right {
            Node::Join(_) => self.node(&join.right, 0, 0)?.parenthesized(),
            other => self.from_item(other)?,
        };
        ts.append(&right);

        match &join.condition {
            JoinCondition::None => {}
            JoinCondition::On(predicate) => {
                ts.space()
                    .push(Token::On)
                    .space()
                    .append(&self.expr(predicate)?);
            }
            JoinCondition::Using(names) => {
                let mut list = TokenStream::new();
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        list.comma().space();
                    }
                    list.push(Token::Ident(name.value.clone()));
                }
                ts.space().push(Token::Using).space().append(&list.parenthesized());
            }
        }
        Ok(ts)
    }

    fn with(&self, with: &With) -> Result<TokenStream> {
        if let Some(ts) = self.dialect.unparse_with(self, with)? {
            return Ok(ts);
        }
        self.with_clause(with, 0)
    }

    /// `WITH name [(cols)] AS (query), ... body`, with the body rendered at
    /// `body_prec` on both sides.
    pub fn with_clause(&self, with: &With, body_prec: u16) -> Result<TokenStream> {
        let mut items = Vec::with_capacity(with.items.len());
        for item in &with.items {
            let mut ts = TokenStream::new();
            ts.push(Token::Ident(item.name.value.clone()));
            if !item.columns.is_empty() {
                let mut list = TokenStream::new();
                for (i, column) in item.columns.iter().enumerate() {
                    if i > 0 {
                        list.comma().space();
                    }
                    list.push(Token::Ident(column.value.clone()));
                }
                ts.space().append(&list.parenthesized());
            }
            ts.space()
                .push(Token::As)
                .space()
                .append(&self.node(&item.query, 0, 0)?.parenthesized());
            items.push(ts);
        }

        let mut ts = TokenStream::new();
        ts.push(Token::With).space().comma_separated(&items);
        self.clause_break(&mut ts);
        ts.append(&self.node(&with.body, body_prec, body_prec)?);
        Ok(ts)
    }

    fn order_by(&self, order_by: &OrderBy) -> Result<TokenStream> {
        let mut ts = match &order_by.query {
            query @ (Node::With(_) | Node::OrderBy(_)) => self.node(query, 0, 0)?.parenthesized(),
            query => self.node(query, 0, 0)?,
        };

        if !order_by.items.is_empty() {
            self.clause_break(&mut ts);
            ts.push(Token::OrderBy)
                .space()
                .append(&self.order_items(&order_by.items)?);
        }

        let fetch = order_by.fetch.as_ref().map(|n| self.expr(n)).transpose()?;
        let offset = order_by.offset.as_ref().map(|n| self.expr(n)).transpose()?;
        let paging = self.dialect.emit_limit_offset(fetch, offset);
        if !paging.is_empty() {
            self.clause_break(&mut ts);
            ts.append(&paging);
        }
        Ok(ts)
    }

    fn order_items(&self, items: &[OrderItem]) -> Result<TokenStream> {
        let mut rendered = Vec::with_capacity(items.len());
        for item in items {
            let mut ts = self.expr(&item.expr)?;
            match item.direction {
                Some(SortDir::Asc) => {
                    ts.space().push(Token::Asc);
                }
                Some(SortDir::Desc) => {
                    ts.space().push(Token::Desc);
                }
                None => {}
            }
            match item.nulls {
                Some(NullsOrder::First) => {
                    ts.space().push(Token::NullsFirst);
                }
                Some(NullsOrder::Last) => {
                    ts.space().push(Token::NullsLast);
                }
                None => {}
            }
            rendered.push(ts);
        }
        let mut ts = TokenStream::new();
        ts.comma_separated(&rendered);
        Ok(ts)
    }

    // =========================================================================
    // Bespoke expressions
    // =========================================================================

    fn case(&self, case: &Case) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(Token::Case);
        if let Some(operand) = &case.operand {
            ts.space().append(&self.expr(operand)?);
        }
        for (condition, result) in &case.whens {
            ts.space()
                .push(Token::When)
                .space()
                .append(&self.expr(condition)?)
                .space()
                .push(Token::Then)
                .space()
                .append(&self.expr(result)?);
        }
        if let Some(otherwise) = &case.else_result {
            ts.space()
                .push(Token::Else)
                .space()
                .append(&self.expr(otherwise)?);
        }
        ts.space().push(Token::End);
        Ok(ts)
    }

    fn window(&self, window: &Window) -> Result<TokenStream> {
        let mut parts = Vec::new();
        if !window.partition_by.is_empty() {
            let mut ts = TokenStream::new();
            ts.push(Token::PartitionBy)
                .space()
                .comma_separated(&self.operands(&window.partition_by)?);
            parts.push(ts);
        }
        if !window.order_by.is_empty() {
            let mut ts = TokenStream::new();
            ts.push(Token::OrderBy)
                .space()
                .append(&self.order_items(&window.order_by)?);
            parts.push(ts);
        }
        if let Some(frame) = &window.frame {
            let mut ts = TokenStream::new();
            ts.push(match frame.units {
                FrameUnits::Rows => Token::Rows,
                FrameUnits::Range => Token::Range,
            })
            .space();
            match &frame.end {
                Some(end) => {
                    ts.keyword("BETWEEN")
                        .space()
                        .append(&self.frame_bound(&frame.start)?)
                        .space()
                        .push(Token::And)
                        .space()
                        .append(&self.frame_bound(end)?);
                }
                None => {
                    ts.append(&self.frame_bound(&frame.start)?);
                }
            }
            parts.push(ts);
        }

        let mut ts = TokenStream::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                ts.space();
            }
            ts.append(part);
        }
        Ok(ts)
    }

    fn frame_bound(&self, bound: &FrameBound) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        match bound {
            FrameBound::CurrentRow => {
                ts.push(Token::CurrentRow);
            }
            FrameBound::Preceding(None) => {
                ts.push(Token::Unbounded).space().push(Token::Preceding);
            }
            FrameBound::Following(None) => {
                ts.push(Token::Unbounded).space().push(Token::Following);
            }
            FrameBound::Preceding(Some(n)) => {
                ts.append(&self.expr(n)?).space().push(Token::Preceding);
            }
            FrameBound::Following(Some(n)) => {
                ts.append(&self.expr(n)?).space().push(Token::Following);
            }
        }
        Ok(ts)
    }
}

fn starts_with_minus(node: &Node) -> bool {
    match node {
        Node::Call(call) => call.kind() == OperatorKind::UnaryMinus,
        Node::Literal(lit) => match &lit.value {
            LiteralValue::Integer(n) => *n < 0,
            LiteralValue::Double(f) => *f < 0.0,
            LiteralValue::Decimal(text) => text.starts_with('-'),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::{IntervalQualifier, Name, TimeUnit, WithItem};
    use crate::sql::operator;
    use crate::sql::test_utils::validate_sql;
    use insta::assert_snapshot;

    fn hive(node: &Node) -> String {
        Unparser::new(Dialect::Hive).to_sql(node).unwrap()
    }

    fn presto(node: &Node) -> String {
        Unparser::new(Dialect::Presto).to_sql(node).unwrap()
    }

    fn select_from(items: Vec<Node>, from: &str) -> Node {
        Select::new(items).from(Node::ident(from)).into()
    }

    #[test]
    fn test_precedence_parenthesizes_only_when_needed() {
        let a_plus_b = Node::call(operator::PLUS, vec![Node::ident("a"), Node::ident("b")]);
        let times = Node::call(operator::TIMES, vec![a_plus_b.clone(), Node::ident("c")]);
        assert_eq!(presto(&times), "(a + b) * c");

        let chain = Node::call(operator::MINUS, vec![a_plus_b.clone(), Node::ident("c")]);
        assert_eq!(presto(&chain), "a + b - c");

        let right_nested = Node::call(
            operator::MINUS,
            vec![
                Node::ident("a"),
                Node::call(operator::MINUS, vec![Node::ident("b"), Node::ident("c")]),
            ],
        );
        assert_eq!(presto(&right_nested), "a - (b - c)");
    }

    #[test]
    fn test_logical_operators() {
        let and = Node::call(operator::AND, vec![Node::ident("x"), Node::ident("y")]);
        let or = Node::call(operator::OR, vec![and.clone(), Node::ident("z")]);
        assert_eq!(hive(&or), "x AND y OR z");

        let not = Node::call(operator::NOT, vec![and]);
        assert_eq!(hive(&not), "NOT (x AND y)");

        let negated = Node::call(operator::UNARY_MINUS, vec![Node::integer(-1)]);
        assert_eq!(hive(&negated), "- -1");
    }

    #[test]
    fn test_postfix_wraps_comparison() {
        let eq = Node::call(operator::EQUALS, vec![Node::ident("a"), Node::ident("b")]);
        let is_null = Node::call(operator::IS_NULL, vec![eq]);
        assert_eq!(hive(&is_null), "(a = b) IS NULL");
        let plain = Node::call(operator::IS_NOT_NULL, vec![Node::ident("a")]);
        assert_eq!(hive(&plain), "a IS NOT NULL");
    }

    #[test]
    fn test_select_renders_compact() {
        let select: Node = Select::new(vec![Node::ident("a"), Node::ident("time").alias("t")])
            .from(Node::compound(["dwh", "trips"]))
            .filter(Node::call(
                operator::GREATER_THAN,
                vec![Node::ident("b"), Node::integer(3)],
            ))
            .into();
        assert_snapshot!(hive(&select), @"SELECT a, `time` AS t FROM dwh.trips WHERE b > 3");
        assert_snapshot!(presto(&select), @r#"SELECT a, "time" AS t FROM dwh.trips WHERE b > 3"#);
        validate_sql(&hive(&select), Dialect::Hive).unwrap();
    }

    #[test]
    fn test_pretty_breaks_clauses() {
        let select = select_from(vec![Node::ident("a")], "t");
        let options = UnparseOptions {
            pretty: true,
            check_functions: true,
        };
        let sql = Unparser::with_options(Dialect::Hive, options)
            .to_sql(&select)
            .unwrap();
        assert_eq!(sql, "SELECT a\nFROM t");
    }

    #[test]
    fn test_union_under_with_is_parenthesized_for_hive() {
        let union = Node::call(
            operator::UNION_ALL,
            vec![
                select_from(vec![Node::ident("a")], "x"),
                select_from(vec![Node::ident("a")], "y"),
            ],
        );
        let with = Node::With(Box::new(With {
            items: vec![WithItem {
                name: Name::new("x"),
                columns: vec![],
                query: select_from(vec![Node::ident("a")], "t"),
            }],
            body: union,
        }));
        assert_snapshot!(
            hive(&with),
            @"WITH x AS (SELECT a FROM t) (SELECT a FROM x UNION ALL SELECT a FROM y)"
        );
        assert_snapshot!(
            presto(&with),
            @"WITH x AS (SELECT a FROM t) SELECT a FROM x UNION ALL SELECT a FROM y"
        );
    }

    #[test]
    fn test_lateral_view_for_cross_join_unnest() {
        let unnest = Node::call(operator::UNNEST, vec![Node::compound(["table1", "arr"])]);
        let right = Node::call(
            operator::AS,
            vec![unnest, Node::ident("t"), Node::ident("c")],
        );
        let join = Node::from(Join {
            left: Node::ident("table1"),
            join_type: JoinType::Cross,
            condition: JoinCondition::None,
            right,
        });
        let select: Node = Select::new(vec![Node::ident("c")]).from(join.clone()).into();

        let sql = hive(&select);
        assert_snapshot!(sql, @"SELECT c FROM table1 LATERAL VIEW explode(table1.arr) t AS c");
        validate_sql(&sql, Dialect::Hive).unwrap();

        assert_snapshot!(
            presto(&select),
            @"SELECT c FROM table1 CROSS JOIN UNNEST(table1.arr) AS t (c)"
        );
    }

    #[test]
    fn test_unnest_outside_lateral_view_is_rejected_by_hive() {
        let unnest = Node::call(operator::UNNEST, vec![Node::ident("arr")]);
        let select: Node = Select::new(vec![Node::ident("c")])
            .from(unnest.alias("t"))
            .into();
        let err = Unparser::new(Dialect::Hive).to_sql(&select).unwrap_err();
        assert!(matches!(err, UnsupportedConstruct::Render { .. }));
    }

    #[test]
    fn test_map_constructor() {
        let map = Node::call(
            operator::MAP_VALUE_CONSTRUCTOR,
            vec![Node::string("k"), Node::integer(1), Node::string("j"), Node::integer(2)],
        );
        assert_eq!(hive(&map), "MAP('k', 1, 'j', 2)");
        assert_eq!(presto(&map), "MAP(ARRAY['k', 'j'], ARRAY[1, 2])");

        let odd = Node::call(operator::MAP_VALUE_CONSTRUCTOR, vec![Node::string("k")]);
        assert!(Unparser::new(Dialect::Presto).to_sql(&odd).is_err());
    }

    #[test]
    fn test_null_safe_equality() {
        let eq = Node::call(operator::NULL_EQUALS, vec![Node::ident("a"), Node::ident("b")]);
        assert_eq!(hive(&eq), "a <=> b");
        assert_eq!(presto(&eq), "a IS NOT DISTINCT FROM b");
    }

    #[test]
    fn test_integer_division() {
        let div = Node::call(operator::INTEGER_DIVIDE, vec![Node::ident("a"), Node::ident("b")]);
        assert_eq!(hive(&div), "a DIV b");
        assert_eq!(presto(&div), "a / b");
    }

    #[test]
    fn test_concat_and_array() {
        let concat = Node::call(operator::CONCAT, vec![Node::ident("a"), Node::string("x")]);
        assert_eq!(hive(&concat), "concat(a, 'x')");
        assert_eq!(presto(&concat), "a || 'x'");

        let array = Node::call(operator::ARRAY_VALUE_CONSTRUCTOR, vec![Node::integer(1)]);
        assert_eq!(hive(&array), "array(1)");
        assert_eq!(presto(&array), "ARRAY[1]");
    }

    #[test]
    fn test_extract_day_of_week() {
        let dow = Node::call(
            operator::EXTRACT,
            vec![
                Node::IntervalQualifier(IntervalQualifier {
                    unit: TimeUnit::DayOfWeek,
                }),
                Node::ident("ts"),
            ],
        );
        assert_eq!(hive(&dow), "from_unixtime(unix_timestamp(ts), 'u')");
        assert_eq!(presto(&dow), "EXTRACT(DOW FROM ts)");
    }

    #[test]
    fn test_to_timestamp_tz_becomes_from_utc_timestamp() {
        let parse = Node::function(
            "date_parse",
            vec![Node::ident("s"), Node::string("%Y-%m-%d")],
        );
        let call = Node::function(
            "to_timestamp_tz",
            vec![parse, Node::string("UTC"), Node::string("America/New_York")],
        );
        assert_eq!(
            hive(&call),
            "from_utc_timestamp(s, 'America/New_York')"
        );
    }

    #[test]
    fn test_unknown_function_rejected_when_checking() {
        let call = Node::function("date_parse", vec![Node::ident("s"), Node::string("%Y")]);
        let err = Unparser::new(Dialect::Hive).to_sql(&call).unwrap_err();
        assert_eq!(
            err,
            UnsupportedConstruct::Function {
                name: "date_parse".into(),
                dialect: "hive",
            }
        );

        let lenient = UnparseOptions {
            pretty: false,
            check_functions: false,
        };
        let sql = Unparser::with_options(Dialect::Hive, lenient)
            .to_sql(&call)
            .unwrap();
        assert_eq!(sql, "date_parse(s, '%Y')");
    }

    #[test]
    fn test_order_by_paging_order() {
        let query = Node::OrderBy(Box::new(OrderBy {
            query: select_from(vec![Node::ident("a")], "t"),
            items: vec![OrderItem {
                expr: Node::ident("a"),
                direction: Some(SortDir::Desc),
                nulls: Some(NullsOrder::Last),
            }],
            offset: Some(Node::integer(5)),
            fetch: Some(Node::integer(10)),
        }));
        assert_eq!(
            hive(&query),
            "SELECT a FROM t ORDER BY a DESC NULLS LAST LIMIT 10 OFFSET 5"
        );
        assert_eq!(
            presto(&query),
            "SELECT a FROM t ORDER BY a DESC NULLS LAST OFFSET 5 LIMIT 10"
        );
    }

    #[test]
    fn test_subquery_operands_are_parenthesized() {
        let sub = select_from(vec![Node::ident("id")], "u");
        let in_list = Node::call(operator::IN, vec![Node::ident("id"), sub.clone()]);
        assert_eq!(presto(&in_list), "id IN (SELECT id FROM u)");

        let derived: Node = Select::new(vec![Node::ident("id")])
            .from(sub.alias("s"))
            .into();
        assert_eq!(presto(&derived), "SELECT id FROM (SELECT id FROM u) AS s");
    }
}
