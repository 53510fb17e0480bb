//! Column identity of values inside a single INSERT statement.

use sqlparser::ast::{Expr, Insert, SetExpr, Values};
use tracing::warn;

use super::schema::SchemaContext;
use crate::{Result, ScrubError};

/// Tracks which column the next value of an INSERT belongs to.
///
/// Created per statement, advanced once per visited value position in
/// row-major order, then discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertState {
    table_name: String,
    column_names: Vec<String>,
    row_length: usize,
    value_index: usize,
}

impl InsertState {
    /// Creates a state for a statement whose rows are `row_length` wide.
    pub fn new(table_name: impl Into<String>, column_names: Vec<String>, row_length: usize) -> Self {
        Self {
            table_name: table_name.into(),
            column_names,
            row_length,
            value_index: 0,
        }
    }

    /// Lower-cased table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Known column names; empty when neither given nor inferable.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of values visited so far across all rows.
    pub fn value_index(&self) -> usize {
        self.value_index
    }

    /// Position of the next value within its row.
    pub fn column_index(&self) -> usize {
        if self.row_length == 0 {
            self.value_index
        } else {
            self.value_index % self.row_length
        }
    }

    /// Candidate names for the next value, most specific first.
    ///
    /// - `column`, when column names are known
    /// - `table.column`, when column names are known
    /// - `table.index`, always
    ///
    /// Empty when the table name is unknown.
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(3);
        if self.table_name.is_empty() {
            return names;
        }

        let index = self.column_index();
        if let Some(column) = self.column_names.get(index) {
            names.push(column.clone());
            names.push(format!("{}.{}", self.table_name, column));
        }
        names.push(format!("{}.{}", self.table_name, index));
        names
    }

    /// Moves on to the next value position.
    pub fn advance(&mut self) {
        self.value_index = self.value_index.saturating_add(1);
    }
}

fn lower_name(name: &sqlparser::ast::ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.to_lowercase())
        .unwrap_or_default()
}

fn values_of(insert: &Insert) -> Option<&Values> {
    match insert.source.as_deref().map(|query| &*query.body) {
        Some(SetExpr::Values(values)) => Some(values),
        _ => None,
    }
}

fn values_of_mut(insert: &mut Insert) -> Option<&mut Values> {
    match insert.source.as_deref_mut().map(|query| &mut *query.body) {
        Some(SetExpr::Values(values)) => Some(values),
        _ => None,
    }
}

/// Builds the tracker for an INSERT with a VALUES list.
///
/// Returns `None` for inserts without literal rows (`INSERT ... SELECT`).
///
/// # Errors
/// - rows of different widths
/// - explicit column list whose length differs from the row width
pub fn insert_state(insert: &Insert, context: &SchemaContext) -> Result<Option<InsertState>> {
    let Some(values) = values_of(insert) else {
        return Ok(None);
    };

    let table_name = lower_name(&insert.table_name);
    let row_length = values.rows.first().map_or(0, Vec::len);
    if let Some(row) = values.rows.iter().position(|row| row.len() != row_length) {
        return Err(ScrubError::structure(format!(
            "row {} of INSERT into '{}' has {} values, expected {}",
            row,
            table_name,
            values.rows.get(row).map_or(0, Vec::len),
            row_length
        )));
    }

    let column_names = if insert.columns.is_empty() {
        match context.table_columns(&table_name) {
            Some(columns) if columns.len() == row_length => columns.to_vec(),
            Some(columns) => {
                warn!(
                    "Table '{}' has {} known columns but rows have {} values; using positions only",
                    table_name,
                    columns.len(),
                    row_length
                );
                Vec::new()
            }
            None => Vec::new(),
        }
    } else {
        if insert.columns.len() != row_length {
            return Err(ScrubError::structure(format!(
                "INSERT into '{}' names {} columns but rows have {} values",
                table_name,
                insert.columns.len(),
                row_length
            )));
        }
        insert
            .columns
            .iter()
            .map(|ident| ident.value.to_lowercase())
            .collect()
    };

    Ok(Some(InsertState::new(table_name, column_names, row_length)))
}

/// Rebuilds every value of an INSERT through `visit`, in row-major order.
///
/// `visit` receives the candidate names of each value and returns its
/// replacement. Inserts without literal rows are left untouched.
pub fn rewrite_values<F>(insert: &mut Insert, context: &SchemaContext, mut visit: F) -> Result<()>
where
    F: FnMut(&[String], Expr) -> Expr,
{
    let Some(mut state) = insert_state(insert, context)? else {
        return Ok(());
    };
    let Some(values) = values_of_mut(insert) else {
        return Ok(());
    };

    let rows = std::mem::take(&mut values.rows);
    values.rows = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|expr| {
                    let names = state.names();
                    state.advance();
                    visit(&names, expr)
                })
                .collect()
        })
        .collect();
    Ok(())
}
