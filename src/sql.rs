//! SQL text helpers for BigQuery Standard SQL.
//!
//! Tool arguments are spliced into query text, so every string passes
//! through [`quote`] or [`like_contains`], and anything used as a column
//! name must pass [`identifier`].

use crate::error::{AnalyticsError, Result};

/// Render `value` as a single-quoted string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

/// Render a `LIKE` pattern literal matching any text that contains `value`.
///
/// `%` and `_` in `value` match themselves.
pub fn like_contains(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    quote(&pattern)
}

/// Accept `value` only if it is a bare column identifier.
pub fn identifier(value: &str) -> Result<&str> {
    let mut chars = value.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid && value.len() <= 300 {
        Ok(value)
    } else {
        Err(AnalyticsError::InvalidParameter(format!(
            "'{}' is not a valid column name",
            value
        )))
    }
}

/// Builds fully-qualified table references under a dataset prefix.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    prefix: String,
}

impl QueryBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `core.patient` -> `` `my-project.core.patient` ``
    pub fn table(&self, name: &str) -> String {
        format!("`{}{}`", self.prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain() {
        assert_eq!(quote("Medicare"), "'Medicare'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_quote_escapes_breakout() {
        assert_eq!(quote("x' OR '1'='1"), r"'x\' OR \'1\'=\'1'");
        assert_eq!(quote(r"back\slash"), r"'back\\slash'");
        assert_eq!(quote("two\nlines"), r"'two\nlines'");
    }

    #[test]
    fn test_like_contains() {
        assert_eq!(like_contains("heart"), "'%heart%'");
        // LIKE sees `\%`, the literal needs that backslash doubled.
        assert_eq!(like_contains("50%"), r"'%50\\%%'");
        assert_eq!(like_contains("a_b"), r"'%a\\_b%'");
        assert_eq!(like_contains("it's"), r"'%it\'s%'");
    }

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("adh_diabetes").unwrap(), "adh_diabetes");
        assert_eq!(identifier("_col1").unwrap(), "_col1");
        assert!(identifier("").is_err());
        assert!(identifier("1col").is_err());
        assert!(identifier("cqm_130; DROP TABLE x").is_err());
        assert!(identifier("a-b").is_err());
    }

    #[test]
    fn test_table() {
        assert_eq!(QueryBuilder::default().table("core.patient"), "`core.patient`");
        assert_eq!(
            QueryBuilder::new("tuva-demo.").table("core.patient"),
            "`tuva-demo.core.patient`"
        );
    }
}
