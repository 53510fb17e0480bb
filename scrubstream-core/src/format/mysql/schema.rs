//! Table layouts learned from CREATE TABLE statements.

use std::collections::HashMap;
use std::path::Path;

use sqlparser::ast::Statement;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use tracing::{debug, info};

use crate::{Result, ScrubError};

/// Column lists by table, used to name values of INSERTs that omit them.
///
/// Filled before scrubbing starts; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    tables: HashMap<String, Vec<String>>,
}

impl SchemaContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from a SQL corpus.
    pub fn from_sql(sql: &str) -> Self {
        let mut context = Self::new();
        context.scan(sql);
        context
    }

    /// Scans a SQL file into the context.
    pub fn scan_file(&mut self, path: &Path) -> Result<usize> {
        let sql = std::fs::read(path)
            .map_err(|e| ScrubError::io(format!("reading context {}", path.display()), e))?;
        let found = self.scan(&String::from_utf8_lossy(&sql));
        info!("✓ Found {} table definitions in {}", found, path.display());
        Ok(found)
    }

    /// Records the columns of every CREATE TABLE statement in `sql`.
    ///
    /// Statements are parsed one at a time; those that fail to parse are
    /// skipped. A later definition of the same table replaces an earlier one.
    /// Returns the number of tables recorded.
    pub fn scan(&mut self, sql: &str) -> usize {
        let dialect = MySqlDialect {};
        let mut found = 0;

        for chunk in split_statements(sql) {
            let statements = match Parser::parse_sql(&dialect, chunk) {
                Ok(statements) => statements,
                Err(e) => {
                    debug!("Skipping unparseable context statement: {}", e);
                    continue;
                }
            };

            for statement in statements {
                if let Statement::CreateTable(create) = statement {
                    let Some(table) = create.name.0.last() else {
                        continue;
                    };
                    let columns = create
                        .columns
                        .iter()
                        .map(|column| column.name.value.to_lowercase())
                        .collect();
                    self.tables.insert(table.value.to_lowercase(), columns);
                    found += 1;
                }
            }
        }

        found
    }

    /// Ordered column names of a table, if known.
    pub fn table_columns(&self, table: &str) -> Option<&[String]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    /// Number of known tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no table is known.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Splits SQL text on top-level semicolons.
///
/// Semicolons inside quoted strings, quoted identifiers and comments do not
/// split. Each chunk keeps its terminating semicolon; blank chunks are
/// dropped.
pub fn split_statements(sql: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut state = Lexeme::Code;
    let mut start = 0;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match state {
            Lexeme::Code => match c {
                '\'' | '"' | '`' => state = Lexeme::Quoted(c),
                '#' => state = Lexeme::LineComment,
                '-' if chars.peek().is_some_and(|&(_, n)| n == '-') => {
                    chars.next();
                    state = Lexeme::LineComment;
                }
                '/' if chars.peek().is_some_and(|&(_, n)| n == '*') => {
                    chars.next();
                    state = Lexeme::BlockComment;
                }
                ';' => {
                    let end = i + c.len_utf8();
                    let chunk = &sql[start..end];
                    if !chunk.trim().trim_end_matches(';').trim().is_empty() {
                        chunks.push(chunk);
                    }
                    start = end;
                }
                _ => {}
            },
            Lexeme::Quoted(quote) => {
                if c == '\\' && quote != '`' {
                    chars.next();
                } else if c == quote {
                    state = Lexeme::Code;
                }
            }
            Lexeme::LineComment => {
                if c == '\n' {
                    state = Lexeme::Code;
                }
            }
            Lexeme::BlockComment => {
                if c == '*' && chars.peek().is_some_and(|&(_, n)| n == '/') {
                    chars.next();
                    state = Lexeme::Code;
                }
            }
        }
    }

    let rest = &sql[start..];
    if !rest.trim().is_empty() {
        chunks.push(rest);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"
-- Table structure for table `users`; with a semicolon
DROP TABLE IF EXISTS `users`;
CREATE TABLE `Users` (
  `id` int NOT NULL,
  `Name` varchar(255) DEFAULT 'a;b',
  `email` varchar(255) NOT NULL,
  PRIMARY KEY (`id`)
);
/* block; comment */
CREATE TABLE orders (id INT, user_id INT, note TEXT);
THIS IS NOT SQL;
"#;

    #[test]
    fn test_split_statements_respects_quotes_and_comments() {
        let chunks = split_statements("SELECT 'a;b'; -- c;d\nSELECT `x;y`; /* ; */ SELECT 1");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "SELECT 'a;b';");
        assert!(chunks[1].trim_start().starts_with("-- c;d"));
        assert!(chunks[2].trim().ends_with("SELECT 1"));
    }

    #[test]
    fn test_split_statements_handles_escaped_quotes() {
        let chunks = split_statements(r"INSERT INTO t VALUES ('it\'s; fine'); SELECT 2;");
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].ends_with("fine');"));
    }

    #[test]
    fn test_scan_records_create_table_columns() {
        let context = SchemaContext::from_sql(DUMP);
        assert_eq!(context.len(), 2);
        assert_eq!(
            context.table_columns("users").unwrap(),
            ["id", "name", "email"]
        );
        assert_eq!(
            context.table_columns("orders").unwrap(),
            ["id", "user_id", "note"]
        );
        assert!(context.table_columns("missing").is_none());
    }

    #[test]
    fn test_scan_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("schema.sql");
        std::fs::write(&path, DUMP).unwrap();

        let mut context = SchemaContext::new();
        assert_eq!(context.scan_file(&path).unwrap(), 2);
        assert!(context.scan_file(&dir.path().join("nope.sql")).is_err());
    }
}
