//! SQL Tokens - the atomic units of SQL output.
//!
//! Tokens are dialect-agnostic representations that serialize
//! to dialect-specific strings.

use std::borrow::Cow;

use super::dialect::{Dialect, SqlDialect};

/// SQL Token - every element the unparser emits.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    From,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Asc,
    Desc,
    NullsFirst,
    NullsLast,
    Limit,
    Offset,
    As,
    On,
    Using,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    Lateral,
    View,
    Distinct,
    All,
    With,
    Case,
    When,
    Then,
    Else,
    End,
    And,
    Interval,
    Over,
    PartitionBy,
    Rows,
    Range,
    Unbounded,
    Preceding,
    Following,
    CurrentRow,
    Null,

    // === Punctuation ===
    Comma,
    Dot,
    Star,
    LParen,
    RParen,
    LBracket,
    RBracket,

    /// Operator spelling taken from the operator table (`=`, `IS NULL`, `DIV`).
    Operator(Cow<'static, str>),

    // === Whitespace / Formatting ===
    Space,
    Newline,
    Indent(usize),

    // === Dynamic Content ===
    /// Identifier component; quoted only when the dialect requires it.
    Ident(String),
    /// Integer literal
    LitInt(i64),
    /// Approximate numeric literal
    LitFloat(f64),
    /// Exact numeric literal, kept as written
    LitNumeric(String),
    /// String literal
    LitString(String),
    /// Boolean literal
    LitBool(bool),

    /// Function name, rendered as written.
    FunctionName(String),

    /// Keyword text supplied by a dialect (type names, date-part names).
    Keyword(Cow<'static, str>),
}

impl Token {
    /// Serialize this token to a string for the given dialect.
    pub fn serialize(&self, dialect: Dialect) -> String {
        match self {
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::GroupBy => "GROUP BY".into(),
            Token::Having => "HAVING".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Asc => "ASC".into(),
            Token::Desc => "DESC".into(),
            Token::NullsFirst => "NULLS FIRST".into(),
            Token::NullsLast => "NULLS LAST".into(),
            Token::Limit => "LIMIT".into(),
            Token::Offset => "OFFSET".into(),
            Token::As => "AS".into(),
            Token::On => "ON".into(),
            Token::Using => "USING".into(),
            Token::Join => "JOIN".into(),
            Token::Inner => "INNER".into(),
            Token::Left => "LEFT".into(),
            Token::Right => "RIGHT".into(),
            Token::Full => "FULL".into(),
            Token::Outer => "OUTER".into(),
            Token::Cross => "CROSS".into(),
            Token::Lateral => "LATERAL".into(),
            Token::View => "VIEW".into(),
            Token::Distinct => "DISTINCT".into(),
            Token::All => "ALL".into(),
            Token::With => "WITH".into(),
            Token::Case => "CASE".into(),
            Token::When => "WHEN".into(),
            Token::Then => "THEN".into(),
            Token::Else => "ELSE".into(),
            Token::End => "END".into(),
            Token::And => "AND".into(),
            Token::Interval => "INTERVAL".into(),
            Token::Over => "OVER".into(),
            Token::PartitionBy => "PARTITION BY".into(),
            Token::Rows => "ROWS".into(),
            Token::Range => "RANGE".into(),
            Token::Unbounded => "UNBOUNDED".into(),
            Token::Preceding => "PRECEDING".into(),
            Token::Following => "FOLLOWING".into(),
            Token::CurrentRow => "CURRENT ROW".into(),
            Token::Null => dialect.format_null().into(),

            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::LBracket => "[".into(),
            Token::RBracket => "]".into(),

            Token::Operator(op) => op.to_string(),

            Token::Space => " ".into(),
            Token::Newline => "\n".into(),
            Token::Indent(n) => "  ".repeat(*n),

            Token::Ident(name) => dialect.render_identifier(name),
            Token::LitInt(n) => n.to_string(),
            Token::LitFloat(f) => approximate_literal(*f),
            Token::LitNumeric(text) => text.clone(),
            Token::LitString(s) => dialect.quote_string(s),
            Token::LitBool(b) => dialect.format_bool(*b).into(),

            Token::FunctionName(name) => name.clone(),
            Token::Keyword(kw) => kw.to_string(),
        }
    }
}

/// Scientific notation for a DOUBLE literal (`1500.0` => `1.5E3`).
///
/// Both dialects read a plain decimal point as an exact DECIMAL, so the
/// exponent is always written.
fn approximate_literal(value: f64) -> String {
    let mut buffer = ryu::Buffer::new();
    let text = buffer.format(value);
    if text.contains(['e', 'E']) || !value.is_finite() {
        return text.replace('e', "E");
    }

    let (sign, body) = match text.strip_prefix('-') {
        Some(body) => ("-", body),
        None => ("", text),
    };
    let (int, frac) = body.split_once('.').unwrap_or((body, ""));
    let digits = format!("{}{}", int, frac);
    let leading = digits.bytes().take_while(|&b| b == b'0').count();
    if leading == digits.len() {
        return format!("{}0E0", sign);
    }

    let exponent = int.len() as i64 - 1 - leading as i64;
    let significant = digits[leading..].trim_end_matches('0');
    let (head, tail) = significant.split_at(1);
    if tail.is_empty() {
        format!("{}{}E{}", sign, head, exponent)
    } else {
        format!("{}{}.{}E{}", sign, head, tail, exponent)
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Extend with multiple tokens.
    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Serialize all tokens to a SQL string.
    pub fn serialize(&self, dialect: Dialect) -> String {
        self.tokens.iter().map(|t| t.serialize(dialect)).collect()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
    pub fn keyword(&mut self, kw: impl Into<Cow<'static, str>>) -> &mut Self {
        self.push(Token::Keyword(kw.into()))
    }

    /// Wrap the current contents in parentheses.
    pub fn parenthesized(mut self) -> Self {
        self.tokens.insert(0, Token::LParen);
        self.tokens.push(Token::RParen);
        self
    }

    /// Append `items` separated by `, `.
    pub fn comma_separated<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a TokenStream>,
    ) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.comma().space();
            }
            self.append(item);
        }
        self
    }
}
