//! The only path from structured values and names to SQL text.
//!
//! Quote characters embedded in a value or identifier are *not* escaped:
//! `escape_value(&"it's".into())` yields `'it's'`. Callers must keep the
//! quote characters out of payloads.

use crate::types::SqlValue;

/// Quote wrapped around string literals.
pub const VALUE_QUOTE: char = '\'';
/// Quote wrapped around table and column names.
pub const IDENTIFIER_QUOTE: char = '`';
/// Literal emitted for absent values.
pub const NULL_LITERAL: &str = "NULL";

/// Renders a value as a SQL literal or expression.
pub fn escape_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => NULL_LITERAL.to_string(),
        SqlValue::Text(s) => format!("{VALUE_QUOTE}{s}{VALUE_QUOTE}"),
        SqlValue::Int32(i) => i.to_string(),
        SqlValue::Int64(i) => i.to_string(),
        // SQL has no literal for NaN or infinities
        SqlValue::Real(f) if !f.is_finite() => NULL_LITERAL.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        SqlValue::Geometry(geom) => geom.to_sql(),
    }
}

/// Wraps a table or column name in identifier quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("{IDENTIFIER_QUOTE}{name}{IDENTIFIER_QUOTE}")
}
