//! Line-oriented scrubbing of MySQL dumps.

use std::sync::Arc;

use sqlparser::ast::{Expr, Insert, Statement, Value};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::{Parser, ParserError};
use tracing::{debug, error};

use super::restore::{string_literal, string_value};
use super::schema::SchemaContext;
use super::state::rewrite_values;
use crate::pipeline::LineProcessor;
use crate::scrubbing::Scrubber;
use crate::{Result, ScrubError};

/// Which kinds of input survive into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Emit (scrubbed) INSERT statements.
    pub inserts: bool,
    /// Emit statements other than INSERT, including `;`-terminated lines the
    /// parser skips or rejects such as `/*!40101 ... */` directives and
    /// `DELIMITER ;;`.
    pub misc: bool,
    /// Emit lines that hold no statement (comments, blank lines, free text).
    pub comments: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            inserts: true,
            misc: true,
            comments: true,
        }
    }
}

impl FormatOptions {
    /// Creates options that keep everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to keep or drop INSERT statements.
    pub fn with_inserts(mut self, inserts: bool) -> Self {
        self.inserts = inserts;
        self
    }

    /// Builder method to keep or drop other statements.
    pub fn with_misc(mut self, misc: bool) -> Self {
        self.misc = misc;
        self
    }

    /// Builder method to keep or drop comment lines.
    pub fn with_comments(mut self, comments: bool) -> Self {
        self.comments = comments;
        self
    }
}

/// Parses one line of a dump into its statements, possibly none.
///
/// # Errors
/// Returns [`ScrubError::Parse`] when the parser rejects the line. The
/// context names the kind of failure only: parser messages quote the
/// offending tokens, which may be sensitive.
pub(crate) fn parse_line(line: &str) -> Result<Vec<Statement>> {
    Parser::parse_sql(&MySqlDialect {}, line).map_err(|e| {
        ScrubError::parse(match e {
            ParserError::TokenizerError(_) => "line cannot be tokenized as SQL",
            ParserError::ParserError(_) => "line is not a supported SQL statement",
            ParserError::RecursionLimitExceeded => "statement nests too deeply",
        })
    })
}

/// True for a line that yielded no statement but still reads as one:
/// terminated by `;` and not commented out. Versioned `/*!...*/` comments
/// are statements to MySQL.
fn is_statement_like(line: &str) -> bool {
    let text = line.trim();
    let commented = text.starts_with("--")
        || text.starts_with('#')
        || (text.starts_with("/*") && !text.starts_with("/*!"));
    !commented && text.ends_with(';')
}

/// Scrubs the string values of INSERT statements, one line at a time.
///
/// Each worker owns one; the scrubber and schema context are shared.
#[derive(Debug, Clone)]
pub struct StatementScrubber {
    scrubber: Scrubber,
    context: Arc<SchemaContext>,
    options: FormatOptions,
}

impl StatementScrubber {
    /// Creates a statement scrubber.
    pub fn new(scrubber: Scrubber, context: Arc<SchemaContext>, options: FormatOptions) -> Self {
        Self {
            scrubber,
            context,
            options,
        }
    }

    /// Rewrites the string values of one INSERT.
    ///
    /// Erased values become `NULL`; other string values are scrubbed.
    /// Non-string values are left alone.
    pub fn rewrite_insert(&self, mut insert: Insert) -> Result<Insert> {
        rewrite_values(&mut insert, &self.context, |names, expr| {
            let Some(value) = string_value(&expr) else {
                return expr;
            };
            if self.scrubber.erase_string(value, names) {
                Expr::Value(Value::Null)
            } else {
                string_literal(&self.scrubber.scrub_string(value, names))
            }
        })?;
        Ok(insert)
    }

    fn keep(line: &str, enabled: bool) -> String {
        if enabled {
            line.to_string()
        } else {
            String::new()
        }
    }

    /// Scrubs one line of input, returning the text to emit (possibly empty).
    ///
    /// Lines without INSERT statements are emitted verbatim or dropped
    /// according to the [`FormatOptions`]; lines with INSERTs are restored
    /// statement by statement, each terminated by `;` and a newline.
    /// Lines that yield no statement follow `misc` when they read as one
    /// and `comments` otherwise.
    ///
    /// # Errors
    /// Returns [`ScrubError::Structure`] when an INSERT's rows cannot be
    /// attributed to columns reliably.
    pub fn scrub_line(&self, line: &str) -> Result<String> {
        let statements = parse_line(line).unwrap_or_else(|e| {
            debug!("Passing line through: {}", e);
            Vec::new()
        });

        if statements.is_empty() {
            let switch = if is_statement_like(line) {
                self.options.misc
            } else {
                self.options.comments
            };
            return Ok(Self::keep(line, switch));
        }
        if !statements.iter().any(|s| matches!(s, Statement::Insert(_))) {
            return Ok(Self::keep(line, self.options.misc));
        }

        let mut out = String::with_capacity(line.len());
        for statement in statements {
            let restored = match statement {
                Statement::Insert(insert) if self.options.inserts => {
                    Statement::Insert(self.rewrite_insert(insert)?)
                }
                Statement::Insert(_) => continue,
                other if self.options.misc => other,
                _ => continue,
            };
            out.push_str(&restored.to_string());
            out.push_str(";\n");
        }
        Ok(out)
    }
}

impl LineProcessor for StatementScrubber {
    /// Drops lines that fail structurally, logging them by number.
    fn process(&mut self, number: u64, line: &str) -> String {
        match self.scrub_line(line) {
            Ok(out) => out,
            Err(e) => {
                error!("Dropping line {}: {}", number, e);
                String::new()
            }
        }
    }
}
