//! String literal restoration.
//!
//! The MySQL tokenizer unescapes string literals, while restoring a literal
//! through `Display` only doubles single quotes. Rewritten values therefore
//! get their backslash escapes back before restoration.

use sqlparser::ast::{Expr, Value};

/// Re-applies MySQL backslash escapes, leaving quotes to the restorer.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x1a' => out.push_str("\\Z"),
            other => out.push(other),
        }
    }
    out
}

/// A single-quoted literal that restores to `s`.
pub fn string_literal(s: &str) -> Expr {
    Expr::Value(Value::SingleQuotedString(escape(s)))
}

/// The string carried by a literal, if the expression is one.
pub fn string_value(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Value(Value::SingleQuotedString(s) | Value::DoubleQuotedString(s)) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a\\b"), "a\\\\b");
        assert_eq!(escape("line\nbreak\ttab\r\0\x1a"), "line\\nbreak\\ttab\\r\\0\\Z");
        assert_eq!(escape("it's"), "it's");
    }

    #[test]
    fn test_string_literal_restores_quotes() {
        assert_eq!(string_literal("it's\n").to_string(), "'it''s\\n'");
    }

    #[test]
    fn test_string_value() {
        assert_eq!(string_value(&string_literal("x")), Some("x"));
        assert_eq!(string_value(&Expr::Value(Value::Null)), None);
    }
}
