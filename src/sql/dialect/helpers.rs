//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Presto
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: Hive
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

static PLAIN_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier pattern")
});

/// Whether an identifier must be quoted: it contains a reserved character
/// (anything outside `[A-Za-z0-9_]`, e.g. `$`), starts with a digit, or is a
/// reserved word of the dialect.
pub fn needs_quoting(ident: &str, is_reserved: impl Fn(&str) -> bool) -> bool {
    !PLAIN_IDENTIFIER.is_match(ident) || is_reserved(ident)
}

/// Case-insensitive membership in a lower-cased reserved-word set.
pub fn is_reserved_in(word: &str, reserved: &HashSet<&'static str>) -> bool {
    reserved.contains(word.to_ascii_lowercase().as_str())
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
/// Used by: Presto
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with single quotes and backslash escapes.
/// Used by: Hive, which reads `''` as two adjacent literals
pub fn quote_string_backslash(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as literal TRUE/FALSE.
/// Used by: Presto, Hive
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

// =============================================================================
// Reserved Words
// =============================================================================

/// SQL-92 reserved words, lower-cased.
pub const SQL92_RESERVED: &[&str] = &[
    "absolute", "action", "add", "all", "allocate", "alter", "and", "any", "are", "as", "asc",
    "assertion", "at", "authorization", "avg", "begin", "between", "bit", "bit_length", "both",
    "by", "cascade", "cascaded", "case", "cast", "catalog", "char", "character",
    "character_length", "char_length", "check", "close", "coalesce", "collate", "collation",
    "column", "commit", "connect", "connection", "constraint", "constraints", "continue",
    "convert", "corresponding", "count", "create", "cross", "current", "current_date",
    "current_time", "current_timestamp", "current_user", "cursor", "date", "day", "deallocate",
    "dec", "decimal", "declare", "default", "deferrable", "deferred", "delete", "desc",
    "describe", "descriptor", "diagnostics", "disconnect", "distinct", "domain", "double", "drop",
    "else", "end", "end-exec", "escape", "except", "exception", "exec", "execute", "exists",
    "external", "extract", "false", "fetch", "first", "float", "for", "foreign", "found", "from",
    "full", "get", "global", "go", "goto", "grant", "group", "having", "hour", "identity",
    "immediate", "in", "indicator", "initially", "inner", "input", "insensitive", "insert", "int",
    "integer", "intersect", "interval", "into", "is", "isolation", "join", "key", "language",
    "last", "leading", "left", "level", "like", "local", "lower", "match", "max", "min", "minute",
    "module", "month", "names", "national", "natural", "nchar", "next", "no", "not", "null",
    "nullif", "numeric", "octet_length", "of", "on", "only", "open", "option", "or", "order",
    "outer", "output", "overlaps", "pad", "partial", "position", "precision", "prepare",
    "preserve", "primary", "prior", "privileges", "procedure", "public", "read", "real",
    "references", "relative", "restrict", "revoke", "right", "rollback", "rows", "schema",
    "scroll", "second", "section", "select", "session", "session_user", "set", "size",
    "smallint", "some", "space", "sql", "sqlcode", "sqlerror", "sqlstate", "substring", "sum",
    "system_user", "table", "temporary", "then", "time", "timestamp", "timezone_hour",
    "timezone_minute", "to", "trailing", "transaction", "translate", "translation", "trim",
    "true", "union", "unique", "unknown", "update", "upper", "usage", "user", "using", "value",
    "values", "varchar", "varying", "view", "when", "whenever", "where", "with", "work", "write",
    "year", "zone",
];

/// Build a reserved-word set from SQL-92 plus dialect extras.
pub fn reserved_set(extra: &[&'static str]) -> HashSet<&'static str> {
    SQL92_RESERVED.iter().chain(extra.iter()).copied().collect()
}
