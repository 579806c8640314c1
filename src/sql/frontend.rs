//! SQL front end: parses Presto query text into the syntax tree.
//!
//! Parsing is delegated to sqlparser; this module lowers its AST into
//! [`Node`]s, rejecting constructs the engine cannot carry. Positions are
//! attached to literals and function calls on a best-effort basis by
//! scanning the source text in lowering order.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlparser::ast as sql;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use super::ast::{
    Call, Case, FrameBound, FrameUnits, Identifier, IntervalQualifier, Join, JoinCondition,
    JoinType, Literal, LiteralValue, Name, Node, NullsOrder, OrderBy, OrderItem, Quantifier,
    Select, SortDir, Span, TimeUnit, TypeSpec, TypedLiteralKind, Window, WindowFrame, With,
    WithItem,
};
use super::error::{ParseError, UnsupportedConstruct};
use super::operator::{self, Operator};

/// Case normalization applied to identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Casing {
    #[default]
    Unchanged,
    Upper,
    Lower,
}

impl Casing {
    fn apply(&self, value: &str) -> String {
        match self {
            Casing::Unchanged => value.to_string(),
            Casing::Upper => value.to_uppercase(),
            Casing::Lower => value.to_lowercase(),
        }
    }
}

/// Identifier handling at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Casing of unquoted identifiers.
    pub casing: Casing,
    /// Casing of quoted identifiers.
    pub quoted_casing: Casing,
    /// Whether name resolution distinguishes case.
    pub case_sensitive: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            casing: Casing::Unchanged,
            quoted_casing: Casing::Unchanged,
            case_sensitive: false,
        }
    }
}

/// Why the front end rejected its input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrontendError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedConstruct),
}

type Result<T> = std::result::Result<T, FrontendError>;

static POSITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*at Line: (\d+), Column: (\d+)").expect("static position pattern"));

/// Parse a single query.
pub fn parse_query(source: &str, options: &ParserOptions) -> Result<Node> {
    let statements =
        Parser::parse_sql(&GenericDialect {}, source).map_err(|e| parse_error(source, e))?;

    let [statement] = statements.as_slice() else {
        return Err(ParseError::at(
            format!("Expected exactly one statement, found {}", statements.len()),
            source,
            Span::UNKNOWN,
        )
        .into());
    };
    let sql::Statement::Query(query) = statement else {
        return Err(UnsupportedConstruct::Syntax(format!(
            "statement other than a query: {}",
            first_words(&statement.to_string())
        ))
        .into());
    };

    Lowering::new(source, *options).query(query)
}

fn parse_error(source: &str, error: sqlparser::parser::ParserError) -> FrontendError {
    let text = error.to_string();
    let text = text.strip_prefix("sql parser error: ").unwrap_or(&text);
    let (message, position) = match POSITION.captures(text) {
        Some(caps) => {
            let line = caps[1].parse().unwrap_or(0);
            let column = caps[2].parse().unwrap_or(0);
            (POSITION.replace(text, "").into_owned(), Span::new(line, column))
        }
        None => (text.to_string(), Span::UNKNOWN),
    };
    let position = if position.is_known() {
        position
    } else {
        end_of(source)
    };
    ParseError::at(message, source, position).into()
}

/// Position just past the last character of the last non-empty line.
///
/// sqlparser reports no position (or 0:0) when it runs out of input.
fn end_of(source: &str) -> Span {
    let Some((index, last)) = source
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .last()
    else {
        return Span::UNKNOWN;
    };
    Span::new(index as u32 + 1, last.trim_end().chars().count() as u32 + 1)
}

fn first_words(text: &str) -> String {
    text.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
}

fn unsupported(what: impl fmt::Display) -> FrontendError {
    UnsupportedConstruct::Syntax(what.to_string()).into()
}

// =============================================================================
// Positions
// =============================================================================

/// Finds token positions by scanning forward through the source.
struct Locator<'s> {
    source: &'s str,
    folded: String,
    cursor: usize,
}

impl<'s> Locator<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            folded: source.to_ascii_lowercase(),
            cursor: 0,
        }
    }

    /// Position of the next occurrence of `needle`, ignoring ASCII case.
    fn find(&mut self, needle: &str) -> Span {
        let needle = needle.to_ascii_lowercase();
        match self.folded[self.cursor..].find(&needle) {
            Some(offset) => {
                self.cursor += offset;
                self.span_at(self.cursor)
            }
            None => Span::UNKNOWN,
        }
    }

    fn span_at(&self, offset: usize) -> Span {
        let before = &self.source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Span::new(line as u32, column as u32)
    }
}

// =============================================================================
// Lowering
// =============================================================================

struct Lowering<'s> {
    options: ParserOptions,
    locator: Locator<'s>,
}

impl<'s> Lowering<'s> {
    fn new(source: &'s str, options: ParserOptions) -> Self {
        Self {
            options,
            locator: Locator::new(source),
        }
    }

    fn name(&self, ident: &sql::Ident) -> Name {
        if ident.quote_style.is_some() {
            Name::quoted(self.options.quoted_casing.apply(&ident.value))
        } else {
            Name::new(self.options.casing.apply(&ident.value))
        }
    }

    fn names(&self, idents: &[sql::Ident]) -> Vec<Name> {
        idents.iter().map(|ident| self.name(ident)).collect()
    }

    fn identifier(&self, idents: &[sql::Ident]) -> Node {
        Node::Identifier(Identifier {
            names: self.names(idents),
            star: false,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn query(&mut self, query: &sql::Query) -> Result<Node> {
        let mut items = Vec::new();
        if let Some(with) = &query.with {
            if with.recursive {
                return Err(unsupported("WITH RECURSIVE"));
            }
            for cte in &with.cte_tables {
                items.push(WithItem {
                    name: self.name(&cte.alias.name),
                    columns: self.alias_columns(&cte.alias)?,
                    query: self.query(&cte.query)?,
                });
            }
        }

        let mut body = self.set_expr(&query.body)?;

        let order_items = match &query.order_by {
            Some(order_by) => self.order_items(&order_by.exprs)?,
            None => Vec::new(),
        };
        let offset = query
            .offset
            .as_ref()
            .map(|offset| self.expr(&offset.value))
            .transpose()?;
        let mut fetch = query.limit.as_ref().map(|e| self.expr(e)).transpose()?;
        if let Some(clause) = &query.fetch {
            if clause.percent || clause.with_ties {
                return Err(unsupported("FETCH with PERCENT or WITH TIES"));
            }
            fetch = match &clause.quantity {
                Some(quantity) => Some(self.expr(quantity)?),
                None => Some(Node::integer(1)),
            };
        }

        if !order_items.is_empty() || offset.is_some() || fetch.is_some() {
            body = Node::OrderBy(Box::new(OrderBy {
                query: body,
                items: order_items,
                offset,
                fetch,
            }));
        }
        if !items.is_empty() {
            body = Node::With(Box::new(With { items, body }));
        }
        Ok(body)
    }

    fn set_expr(&mut self, body: &sql::SetExpr) -> Result<Node> {
        match body {
            sql::SetExpr::Select(select) => self.select(select),
            sql::SetExpr::Query(query) => self.query(query),
            sql::SetExpr::SetOperation {
                op,
                set_quantifier,
                left,
                right,
            } => {
                let all = match set_quantifier {
                    sql::SetQuantifier::All => true,
                    sql::SetQuantifier::Distinct | sql::SetQuantifier::None => false,
                    other => return Err(unsupported(format!("set quantifier {}", other))),
                };
                let operator = match (op, all) {
                    (sql::SetOperator::Union, false) => operator::UNION,
                    (sql::SetOperator::Union, true) => operator::UNION_ALL,
                    (sql::SetOperator::Except, false) => operator::EXCEPT,
                    (sql::SetOperator::Except, true) => operator::EXCEPT_ALL,
                    (sql::SetOperator::Intersect, false) => operator::INTERSECT,
                    (sql::SetOperator::Intersect, true) => operator::INTERSECT_ALL,
                };
                let left = self.set_expr(left)?;
                let right = self.set_expr(right)?;
                Ok(Node::call(operator, vec![left, right]))
            }
            sql::SetExpr::Values(_) => Err(unsupported("VALUES")),
            other => Err(unsupported(first_words(&other.to_string()))),
        }
    }

    fn select(&mut self, select: &sql::Select) -> Result<Node> {
        let distinct = match &select.distinct {
            None => false,
            Some(sql::Distinct::Distinct) => true,
            Some(sql::Distinct::On(_)) => return Err(unsupported("DISTINCT ON")),
        };
        if select.top.is_some() {
            return Err(unsupported("TOP"));
        }
        if !select.lateral_views.is_empty() {
            return Err(unsupported("LATERAL VIEW"));
        }
        if select.qualify.is_some() {
            return Err(unsupported("QUALIFY"));
        }
        if !select.named_window.is_empty() {
            return Err(unsupported("WINDOW clause"));
        }

        let mut items = Vec::with_capacity(select.projection.len());
        for item in &select.projection {
            items.push(self.select_item(item)?);
        }

        let mut from = None;
        for table in &select.from {
            let right = self.table_with_joins(table)?;
            from = Some(match from {
                None => right,
                Some(left) => Node::from(Join {
                    left,
                    join_type: JoinType::Comma,
                    condition: JoinCondition::None,
                    right,
                }),
            });
        }

        let where_clause = select.selection.as_ref().map(|e| self.expr(e)).transpose()?;

        let group_by = match &select.group_by {
            sql::GroupByExpr::Expressions(exprs, modifiers) => {
                if !modifiers.is_empty() {
                    return Err(unsupported("GROUP BY modifiers"));
                }
                self.exprs(exprs)?
            }
            sql::GroupByExpr::All(_) => return Err(unsupported("GROUP BY ALL")),
        };

        let having = select.having.as_ref().map(|e| self.expr(e)).transpose()?;

        Ok(Node::from(Select {
            distinct,
            items,
            from,
            where_clause,
            group_by,
            having,
        }))
    }

    fn select_item(&mut self, item: &sql::SelectItem) -> Result<Node> {
        match item {
            sql::SelectItem::UnnamedExpr(expr) => self.expr(expr),
            sql::SelectItem::ExprWithAlias { expr, alias } => {
                let expr = self.expr(expr)?;
                Ok(Node::call(
                    operator::AS,
                    vec![expr, Node::Identifier(Identifier {
                        names: vec![self.name(alias)],
                        star: false,
                    })],
                ))
            }
            sql::SelectItem::Wildcard(_) => Ok(Node::Identifier(Identifier::star(vec![]))),
            sql::SelectItem::QualifiedWildcard(qualifier, _) => {
                let text = qualifier.to_string();
                let qualifier = text.trim_end_matches(".*");
                Ok(Node::Identifier(Identifier::star(
                    qualifier.split('.').map(name_from_text).collect(),
                )))
            }
        }
    }

    fn table_with_joins(&mut self, table: &sql::TableWithJoins) -> Result<Node> {
        let mut node = self.table_factor(&table.relation)?;
        for join in &table.joins {
            let (join_type, constraint) = match &join.join_operator {
                sql::JoinOperator::Inner(c) => (JoinType::Inner, Some(c)),
                sql::JoinOperator::LeftOuter(c) => (JoinType::Left, Some(c)),
                sql::JoinOperator::RightOuter(c) => (JoinType::Right, Some(c)),
                sql::JoinOperator::FullOuter(c) => (JoinType::Full, Some(c)),
                sql::JoinOperator::CrossJoin => (JoinType::Cross, None),
                other => return Err(unsupported(format!("join operator {:?}", other))),
            };
            let right = self.table_factor(&join.relation)?;
            let condition = match constraint {
                None | Some(sql::JoinConstraint::None) => JoinCondition::None,
                Some(sql::JoinConstraint::On(expr)) => JoinCondition::On(self.expr(expr)?),
                Some(sql::JoinConstraint::Using(columns)) => JoinCondition::Using(
                    columns
                        .iter()
                        .map(|c| name_from_text(&c.to_string()))
                        .collect(),
                ),
                Some(sql::JoinConstraint::Natural) => return Err(unsupported("NATURAL JOIN")),
            };
            node = Node::from(Join {
                left: node,
                join_type,
                condition,
                right,
            });
        }
        Ok(node)
    }

    fn table_factor(&mut self, factor: &sql::TableFactor) -> Result<Node> {
        match factor {
            sql::TableFactor::Table {
                name, alias, args, ..
            } => {
                if args.is_some() {
                    return Err(unsupported(format!("table function {}", name)));
                }
                let table = self.identifier(&name.0);
                self.aliased(table, alias.as_ref())
            }
            sql::TableFactor::Derived {
                lateral,
                subquery,
                alias,
                ..
            } => {
                if *lateral {
                    return Err(unsupported("LATERAL subquery"));
                }
                let query = self.query(subquery)?;
                self.aliased(query, alias.as_ref())
            }
            sql::TableFactor::UNNEST {
                alias,
                array_exprs,
                with_offset,
                with_ordinality,
                ..
            } => {
                if *with_offset || *with_ordinality {
                    return Err(unsupported("UNNEST WITH ORDINALITY"));
                }
                let unnest = Node::call(operator::UNNEST, self.exprs(array_exprs)?);
                self.aliased(unnest, alias.as_ref())
            }
            sql::TableFactor::NestedJoin {
                table_with_joins,
                alias,
                ..
            } => {
                if alias.is_some() {
                    return Err(unsupported("alias on a parenthesized join"));
                }
                self.table_with_joins(table_with_joins)
            }
            other => Err(unsupported(format!("FROM item {}", other))),
        }
    }

    /// `node AS alias [(col, ...)]`, or `node` itself without an alias.
    fn aliased(&self, node: Node, alias: Option<&sql::TableAlias>) -> Result<Node> {
        let Some(alias) = alias else {
            return Ok(node);
        };
        let mut operands = vec![node, Node::Identifier(Identifier {
            names: vec![self.name(&alias.name)],
            star: false,
        })];
        for column in self.alias_columns(alias)? {
            operands.push(Node::Identifier(Identifier {
                names: vec![column],
                star: false,
            }));
        }
        Ok(Node::call(operator::AS, operands))
    }

    fn alias_columns(&self, alias: &sql::TableAlias) -> Result<Vec<Name>> {
        alias
            .columns
            .iter()
            .map(|column| {
                let text = column.to_string();
                let mut words = text.split_whitespace();
                match (words.next(), words.next()) {
                    (Some(name), None) => Ok(self.cased(name_from_text(name))),
                    _ => Err(unsupported(format!("typed alias column {}", text))),
                }
            })
            .collect()
    }

    fn cased(&self, name: Name) -> Name {
        let casing = if name.quoted {
            self.options.quoted_casing
        } else {
            self.options.casing
        };
        Name {
            value: casing.apply(&name.value),
            quoted: name.quoted,
        }
    }

    fn order_items(&mut self, exprs: &[sql::OrderByExpr]) -> Result<Vec<OrderItem>> {
        let mut items = Vec::with_capacity(exprs.len());
        for order in exprs {
            items.push(OrderItem {
                expr: self.expr(&order.expr)?,
                direction: order
                    .asc
                    .map(|asc| if asc { SortDir::Asc } else { SortDir::Desc }),
                nulls: order.nulls_first.map(|first| {
                    if first {
                        NullsOrder::First
                    } else {
                        NullsOrder::Last
                    }
                }),
            });
        }
        Ok(items)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn exprs(&mut self, exprs: &[sql::Expr]) -> Result<Vec<Node>> {
        let mut nodes = Vec::with_capacity(exprs.len());
        for expr in exprs {
            nodes.push(self.expr(expr)?);
        }
        Ok(nodes)
    }

    fn expr(&mut self, expr: &sql::Expr) -> Result<Node> {
        match expr {
            sql::Expr::Identifier(ident) => Ok(self.identifier(std::slice::from_ref(ident))),
            sql::Expr::CompoundIdentifier(idents) => Ok(self.identifier(idents)),
            sql::Expr::Value(value) => self.value(value).map(Node::Literal),
            sql::Expr::TypedString { data_type, value } => {
                let kind = match data_type.to_string().to_ascii_uppercase().as_str() {
                    "DATE" => TypedLiteralKind::Date,
                    "TIME" => TypedLiteralKind::Time,
                    "TIMESTAMP" => TypedLiteralKind::Timestamp,
                    other => return Err(unsupported(format!("{} literal", other))),
                };
                let span = self.locator.find(kind.as_str());
                let text = value.to_string();
                let value = text.trim_matches('\'').to_string();
                Ok(Node::Literal(
                    Literal::new(LiteralValue::Typed { kind, value }).at(span),
                ))
            }
            sql::Expr::Interval(interval) => self.interval(interval),
            sql::Expr::Nested(inner) => self.expr(inner),
            sql::Expr::BinaryOp { left, op, right } => {
                let operator = binary_operator(op)?;
                let left = self.expr(left)?;
                let right = self.expr(right)?;
                Ok(Node::call(operator, vec![left, right]))
            }
            sql::Expr::UnaryOp { op, expr } => match op {
                sql::UnaryOperator::Not => Ok(Node::call(operator::NOT, vec![self.expr(expr)?])),
                sql::UnaryOperator::Plus => {
                    Ok(Node::call(operator::UNARY_PLUS, vec![self.expr(expr)?]))
                }
                sql::UnaryOperator::Minus => match expr.as_ref() {
                    sql::Expr::Value(sql::Value::Number(text, _)) => {
                        let span = self.locator.find(text);
                        Ok(Node::Literal(
                            Literal::new(number(&format!("-{}", text))?).at(span),
                        ))
                    }
                    other => Ok(Node::call(operator::UNARY_MINUS, vec![self.expr(other)?])),
                },
                other => Err(unsupported(format!("unary operator {}", other))),
            },
            sql::Expr::IsNull(inner) => self.postfix(operator::IS_NULL, inner),
            sql::Expr::IsNotNull(inner) => self.postfix(operator::IS_NOT_NULL, inner),
            sql::Expr::IsTrue(inner) => self.postfix(operator::IS_TRUE, inner),
            sql::Expr::IsNotTrue(inner) => self.postfix(operator::IS_NOT_TRUE, inner),
            sql::Expr::IsFalse(inner) => self.postfix(operator::IS_FALSE, inner),
            sql::Expr::IsNotFalse(inner) => self.postfix(operator::IS_NOT_FALSE, inner),
            sql::Expr::IsDistinctFrom(left, right) => {
                let operands = vec![self.expr(left)?, self.expr(right)?];
                Ok(Node::call(operator::IS_DISTINCT_FROM, operands))
            }
            sql::Expr::IsNotDistinctFrom(left, right) => {
                let operands = vec![self.expr(left)?, self.expr(right)?];
                Ok(Node::call(operator::NULL_EQUALS, operands))
            }
            sql::Expr::InList {
                expr,
                list,
                negated,
            } => {
                let value = self.expr(expr)?;
                let list = Node::NodeList(self.exprs(list)?);
                let op = if *negated { operator::NOT_IN } else { operator::IN };
                Ok(Node::call(op, vec![value, list]))
            }
            sql::Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                let value = self.expr(expr)?;
                let query = self.query(subquery)?;
                let op = if *negated { operator::NOT_IN } else { operator::IN };
                Ok(Node::call(op, vec![value, query]))
            }
            sql::Expr::Between {
                expr,
                negated,
                low,
                high,
            } => {
                let operands = vec![self.expr(expr)?, self.expr(low)?, self.expr(high)?];
                let op = if *negated {
                    operator::NOT_BETWEEN
                } else {
                    operator::BETWEEN
                };
                Ok(Node::call(op, operands))
            }
            sql::Expr::Like {
                negated,
                expr,
                pattern,
                escape_char,
                ..
            } => {
                if escape_char.is_some() {
                    return Err(unsupported("LIKE ... ESCAPE"));
                }
                let operands = vec![self.expr(expr)?, self.expr(pattern)?];
                let op = if *negated {
                    operator::NOT_LIKE
                } else {
                    operator::LIKE
                };
                Ok(Node::call(op, operands))
            }
            sql::Expr::Cast {
                kind,
                expr,
                data_type,
                ..
            } => {
                let op = match kind {
                    sql::CastKind::Cast | sql::CastKind::DoubleColon => operator::CAST,
                    sql::CastKind::TryCast | sql::CastKind::SafeCast => operator::TRY_CAST,
                };
                let value = self.expr(expr)?;
                let target = type_spec(&data_type.to_string())?;
                Ok(Node::call(op, vec![value, Node::TypeSpec(target)]))
            }
            sql::Expr::Extract { field, expr, .. } => {
                let text = field.to_string();
                let unit = TimeUnit::from_name(&text)
                    .ok_or_else(|| unsupported(format!("EXTRACT field {}", text)))?;
                let value = self.expr(expr)?;
                Ok(Node::call(
                    operator::EXTRACT,
                    vec![Node::IntervalQualifier(IntervalQualifier { unit }), value],
                ))
            }
            sql::Expr::Ceil { expr, field } => self.rounding("ceil", expr, field),
            sql::Expr::Floor { expr, field } => self.rounding("floor", expr, field),
            sql::Expr::Substring {
                expr,
                substring_from,
                substring_for,
                ..
            } => {
                let span = self.locator.find("substr");
                let mut operands = vec![self.expr(expr)?];
                if let Some(from) = substring_from {
                    operands.push(self.expr(from)?);
                }
                if let Some(length) = substring_for {
                    operands.push(self.expr(length)?);
                }
                Ok(Node::Call(Call::function("substr", operands).at(span)))
            }
            sql::Expr::Trim {
                expr,
                trim_where: None,
                trim_what: None,
                trim_characters: None,
            } => {
                let span = self.locator.find("trim");
                let operand = self.expr(expr)?;
                Ok(Node::Call(Call::function("trim", vec![operand]).at(span)))
            }
            sql::Expr::Function(function) => self.function(function),
            sql::Expr::Case {
                operand,
                conditions,
                results,
                else_result,
            } => {
                let operand = operand.as_ref().map(|e| self.expr(e)).transpose()?;
                let mut whens = Vec::with_capacity(conditions.len());
                for (condition, result) in conditions.iter().zip(results) {
                    whens.push((self.expr(condition)?, self.expr(result)?));
                }
                let else_result = else_result.as_ref().map(|e| self.expr(e)).transpose()?;
                Ok(Node::Case(Box::new(Case {
                    operand,
                    whens,
                    else_result,
                })))
            }
            sql::Expr::Exists { subquery, negated } => {
                let exists = Node::call(operator::EXISTS, vec![self.query(subquery)?]);
                if *negated {
                    Ok(Node::call(operator::NOT, vec![exists]))
                } else {
                    Ok(exists)
                }
            }
            sql::Expr::Subquery(query) => self.query(query),
            sql::Expr::Array(array) => Ok(Node::call(
                operator::ARRAY_VALUE_CONSTRUCTOR,
                self.exprs(&array.elem)?,
            )),
            other => Err(unsupported(format!("expression {}", other))),
        }
    }

    fn postfix(&mut self, op: Operator, inner: &sql::Expr) -> Result<Node> {
        Ok(Node::call(op, vec![self.expr(inner)?]))
    }

    fn rounding(
        &mut self,
        name: &'static str,
        expr: &sql::Expr,
        field: &sql::CeilFloorKind,
    ) -> Result<Node> {
        if !matches!(
            field,
            sql::CeilFloorKind::DateTimeField(sql::DateTimeField::NoDateTime)
        ) {
            return Err(unsupported(format!("{} with a date part or scale", name)));
        }
        let span = self.locator.find(name);
        let operand = self.expr(expr)?;
        Ok(Node::Call(Call::function(name, vec![operand]).at(span)))
    }

    fn value(&mut self, value: &sql::Value) -> Result<Literal> {
        let (value, needle) = match value {
            sql::Value::Number(text, _) => (number(text)?, text.clone()),
            sql::Value::SingleQuotedString(s) | sql::Value::EscapedStringLiteral(s) => (
                LiteralValue::String(s.clone()),
                format!("'{}'", s.replace('\'', "''")),
            ),
            sql::Value::Boolean(b) => (LiteralValue::Boolean(*b), b.to_string()),
            sql::Value::Null => (LiteralValue::Null, "null".to_string()),
            other => return Err(unsupported(format!("literal {}", other))),
        };
        let span = self.locator.find(&needle);
        Ok(Literal::new(value).at(span))
    }

    fn interval(&mut self, interval: &sql::Interval) -> Result<Node> {
        if interval.last_field.is_some() {
            return Err(unsupported("INTERVAL with a field range"));
        }
        let field = interval
            .leading_field
            .as_ref()
            .ok_or_else(|| unsupported("INTERVAL without a unit"))?;
        let unit = TimeUnit::from_name(&field.to_string())
            .ok_or_else(|| unsupported(format!("INTERVAL unit {}", field)))?;
        let value = match interval.value.as_ref() {
            sql::Expr::Value(sql::Value::SingleQuotedString(s)) => s.clone(),
            sql::Expr::Value(sql::Value::Number(n, _)) => n.clone(),
            other => return Err(unsupported(format!("INTERVAL value {}", other))),
        };
        let span = self.locator.find("interval");
        Ok(Node::Literal(
            Literal::new(LiteralValue::Interval {
                value,
                qualifier: IntervalQualifier { unit },
            })
            .at(span),
        ))
    }

    fn function(&mut self, function: &sql::Function) -> Result<Node> {
        let name = function
            .name
            .0
            .iter()
            .map(|ident| ident.value.as_str())
            .collect::<Vec<_>>()
            .join(".");
        if function.filter.is_some() {
            return Err(unsupported(format!("FILTER on {}", name)));
        }
        if function.null_treatment.is_some() {
            return Err(unsupported(format!("IGNORE/RESPECT NULLS on {}", name)));
        }
        if !function.within_group.is_empty() {
            return Err(unsupported(format!("WITHIN GROUP on {}", name)));
        }

        let span = self.locator.find(&name);
        let (operator, operands, quantifier) = match &function.args {
            sql::FunctionArguments::None => (Operator::function_id(name.clone()), vec![], None),
            sql::FunctionArguments::Subquery(_) => {
                return Err(unsupported(format!("subquery argument to {}", name)))
            }
            sql::FunctionArguments::List(list) => {
                if !list.clauses.is_empty() {
                    return Err(unsupported(format!("argument clauses on {}", name)));
                }
                let quantifier = match list.duplicate_treatment {
                    Some(sql::DuplicateTreatment::Distinct) => Some(Quantifier::Distinct),
                    Some(sql::DuplicateTreatment::All) => Some(Quantifier::All),
                    None => None,
                };
                let mut operands = Vec::with_capacity(list.args.len());
                for arg in &list.args {
                    operands.push(self.function_arg(&name, arg)?);
                }
                (Operator::function(name.clone()), operands, quantifier)
            }
        };

        if let Some(map) = map_constructor(&name, &operands) {
            return Ok(map);
        }

        let mut call = Call::new(operator, operands).at(span);
        call.quantifier = quantifier;
        let call = Node::Call(call);

        match &function.over {
            None => Ok(call),
            Some(sql::WindowType::WindowSpec(spec)) => {
                if spec.window_name.is_some() {
                    return Err(unsupported("named window reference"));
                }
                let window = Window {
                    partition_by: self.exprs(&spec.partition_by)?,
                    order_by: self.order_items(&spec.order_by)?,
                    frame: spec
                        .window_frame
                        .as_ref()
                        .map(|frame| self.window_frame(frame))
                        .transpose()?,
                };
                Ok(Node::call(
                    operator::OVER,
                    vec![call, Node::Window(Box::new(window))],
                ))
            }
            Some(sql::WindowType::NamedWindow(window)) => {
                Err(unsupported(format!("named window {}", window)))
            }
        }
    }

    fn function_arg(&mut self, function: &str, arg: &sql::FunctionArg) -> Result<Node> {
        match arg {
            sql::FunctionArg::Unnamed(sql::FunctionArgExpr::Expr(expr)) => self.expr(expr),
            sql::FunctionArg::Unnamed(sql::FunctionArgExpr::Wildcard) => {
                Ok(Node::Identifier(Identifier::star(vec![])))
            }
            sql::FunctionArg::Unnamed(sql::FunctionArgExpr::QualifiedWildcard(qualifier)) => {
                Ok(Node::Identifier(Identifier::star(self.names(&qualifier.0))))
            }
            other => Err(unsupported(format!("argument {} to {}", other, function))),
        }
    }

    fn window_frame(&mut self, frame: &sql::WindowFrame) -> Result<WindowFrame> {
        let units = match frame.units {
            sql::WindowFrameUnits::Rows => FrameUnits::Rows,
            sql::WindowFrameUnits::Range => FrameUnits::Range,
            sql::WindowFrameUnits::Groups => return Err(unsupported("GROUPS frame")),
        };
        let start = self.frame_bound(&frame.start_bound)?;
        let end = frame
            .end_bound
            .as_ref()
            .map(|bound| self.frame_bound(bound))
            .transpose()?;
        Ok(WindowFrame { units, start, end })
    }

    fn frame_bound(&mut self, bound: &sql::WindowFrameBound) -> Result<FrameBound> {
        Ok(match bound {
            sql::WindowFrameBound::CurrentRow => FrameBound::CurrentRow,
            sql::WindowFrameBound::Preceding(None) => FrameBound::Preceding(None),
            sql::WindowFrameBound::Following(None) => FrameBound::Following(None),
            sql::WindowFrameBound::Preceding(Some(n)) => {
                FrameBound::Preceding(Some(self.expr(n)?))
            }
            sql::WindowFrameBound::Following(Some(n)) => {
                FrameBound::Following(Some(self.expr(n)?))
            }
        })
    }
}

fn binary_operator(op: &sql::BinaryOperator) -> Result<Operator> {
    use sql::BinaryOperator as B;
    Ok(match op {
        B::Plus => operator::PLUS,
        B::Minus => operator::MINUS,
        B::Multiply => operator::TIMES,
        B::Divide => operator::DIVIDE,
        B::Modulo => operator::MOD,
        B::MyIntegerDivide => operator::INTEGER_DIVIDE,
        B::StringConcat => operator::CONCAT,
        B::Eq => operator::EQUALS,
        B::NotEq => operator::NOT_EQUALS,
        B::Lt => operator::LESS_THAN,
        B::Gt => operator::GREATER_THAN,
        B::LtEq => operator::LESS_THAN_OR_EQUAL,
        B::GtEq => operator::GREATER_THAN_OR_EQUAL,
        B::Spaceship => operator::NULL_EQUALS,
        B::And => operator::AND,
        B::Or => operator::OR,
        other => return Err(unsupported(format!("operator {}", other))),
    })
}

/// Numeric literal: integers fit `i64`, exponents are approximate, the rest exact.
///
/// An approximate literal outside the `f64` range has no spelling in either
/// dialect and is rejected.
fn number(text: &str) -> Result<LiteralValue> {
    if text.contains(['e', 'E']) {
        if let Ok(value) = text.parse::<f64>() {
            if !value.is_finite() {
                return Err(unsupported(format!("numeric literal {} out of DOUBLE range", text)));
            }
            return Ok(LiteralValue::Double(value));
        }
    }
    if !text.contains('.') {
        if let Ok(value) = text.parse::<i64>() {
            return Ok(LiteralValue::Integer(value));
        }
    }
    Ok(LiteralValue::Decimal(text.to_string()))
}

/// `VARCHAR(10)` => name `VARCHAR`, params `[10]`.
fn type_spec(text: &str) -> Result<TypeSpec> {
    if text.contains(['<', '[']) {
        return Err(unsupported(format!("CAST to {}", text)));
    }
    let (name, params) = match text.split_once('(') {
        Some((name, rest)) => (name, rest.trim_end_matches(')')),
        None => (text, ""),
    };
    let mut spec = TypeSpec::new(name.trim());
    for param in params.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let value = param
            .parse()
            .map_err(|_| unsupported(format!("CAST to {}", text)))?;
        spec.params.push(value);
    }
    Ok(spec)
}

/// Name from display text, removing identifier quotes.
fn name_from_text(text: &str) -> Name {
    let quoted = [('"', '"'), ('`', '`'), ('[', ']')]
        .iter()
        .find(|(open, close)| text.len() >= 2 && text.starts_with(*open) && text.ends_with(*close));
    match quoted {
        Some(_) => Name::quoted(&text[1..text.len() - 1]),
        None => Name::new(text),
    }
}

/// `MAP(ARRAY[k, ...], ARRAY[v, ...])` as a map constructor over
/// alternating keys and values.
fn map_constructor(name: &str, operands: &[Node]) -> Option<Node> {
    if !name.eq_ignore_ascii_case("map") {
        return None;
    }
    let [Node::Call(keys), Node::Call(values)] = operands else {
        return None;
    };
    let is_array = |call: &Call| call.kind() == operator::ARRAY_VALUE_CONSTRUCTOR.kind;
    if !is_array(keys) || !is_array(values) || keys.operands.len() != values.operands.len() {
        return None;
    }
    let entries = keys
        .operands
        .iter()
        .zip(&values.operands)
        .flat_map(|(k, v)| [k.clone(), v.clone()])
        .collect();
    Some(Node::call(operator::MAP_VALUE_CONSTRUCTOR, entries))
}
