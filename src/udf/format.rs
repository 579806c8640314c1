//! Date/time format translation.
//!
//! Presto formats use MySQL-style `%` specifiers; Hive expects Java
//! `SimpleDateFormat` patterns.

use super::ConversionError;

/// Specifier substitutions, applied in order.
const SPECIFIERS: &[(&str, &str)] = &[
    ("%Y", "yyyy"),
    ("%m", "MM"),
    ("%d", "dd"),
    ("%H", "HH"),
    ("%i", "mm"),
    ("%s", "ss"),
];

/// Letters `SimpleDateFormat` accepts as pattern characters.
const PATTERN_LETTERS: &str = "GyYMLwWDdFEuaHkKhmsSzZX";

/// Translate a Presto format string into a Hive pattern.
///
/// ```
/// use sqlbridge::udf::format::convert_time_format;
///
/// assert_eq!(
///     convert_time_format("%Y-%m-%d %H:%i:%s").unwrap(),
///     "yyyy-MM-dd HH:mm:ss"
/// );
/// ```
pub fn convert_time_format(format: &str) -> Result<String, ConversionError> {
    let converted = SPECIFIERS
        .iter()
        .fold(format.to_string(), |acc, (from, to)| acc.replace(from, to));
    validate_pattern(&converted).map_err(|reason| ConversionError::InvalidFormat {
        format: format.to_string(),
        converted: converted.clone(),
        reason,
    })?;
    Ok(converted)
}

/// Check `pattern` the way `SimpleDateFormat` would when compiling it.
fn validate_pattern(pattern: &str) -> Result<(), String> {
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            // `''` is a literal quote; otherwise skip to the closing quote.
            if chars.peek() == Some(&'\'') {
                chars.next();
                continue;
            }
            loop {
                match chars.next() {
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                    }
                    Some('\'') => break,
                    Some(_) => {}
                    None => return Err("unterminated quote".to_string()),
                }
            }
        } else if c.is_ascii_alphabetic() && !PATTERN_LETTERS.contains(c) {
            return Err(format!("illegal pattern character '{}'", c));
        }
    }
    Ok(())
}
