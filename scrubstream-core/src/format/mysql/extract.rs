//! Pulling the values of named columns out of a dump.

use std::sync::Arc;

use sqlparser::ast::Statement;
use tracing::debug;

use super::restore::string_value;
use super::schema::SchemaContext;
use super::scrub::parse_line;
use super::state::rewrite_values;
use crate::Result;

/// Collects string values whose candidate names include a wanted name.
#[derive(Debug, Clone)]
pub struct Extractor {
    names: Vec<String>,
    context: Arc<SchemaContext>,
}

impl Extractor {
    /// Creates an extractor for exact names such as `email` or `users.email`.
    pub fn new(names: Vec<String>, context: Arc<SchemaContext>) -> Self {
        Self { names, context }
    }

    fn wanted(&self, names: &[String]) -> bool {
        names.iter().any(|name| self.names.contains(name))
    }

    /// Returns the wanted values of every INSERT on the line, in order.
    pub fn extract_line(&self, line: &str) -> Result<Vec<String>> {
        let mut found = Vec::new();
        let statements = match parse_line(line) {
            Ok(statements) => statements,
            Err(e) => {
                debug!("Skipping line: {}", e);
                return Ok(found);
            }
        };

        for statement in statements {
            if let Statement::Insert(mut insert) = statement {
                rewrite_values(&mut insert, &self.context, |names, expr| {
                    if self.wanted(names) {
                        if let Some(value) = string_value(&expr) {
                            found.push(value.to_string());
                        }
                    }
                    expr
                })?;
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_by_column_and_qualified_name() {
        let context = SchemaContext::from_sql("CREATE TABLE users (id INT, name TEXT, email TEXT);");
        let extractor = Extractor::new(
            vec!["users.name".to_string(), "email".to_string()],
            Arc::new(context),
        );

        let values = extractor
            .extract_line("INSERT INTO users VALUES (1,'Joe','joe@foo.com'),(2,'Ann',NULL);")
            .unwrap();
        assert_eq!(values, vec!["Joe", "joe@foo.com", "Ann"]);

        assert!(extractor.extract_line("-- comment").unwrap().is_empty());
        assert!(extractor.extract_line("SELECT 1;").unwrap().is_empty());
        assert!(extractor.extract_line("'joe@foo.com' is not SQL").unwrap().is_empty());
    }
}
