use crate::codec::{escape_value, quote_identifier};
use crate::types::SqlValue;

/// Builder for a single-row INSERT statement.
///
/// Columns keep the order in which they were added.
#[derive(Debug, Clone)]
pub struct Insert {
    table: String,
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Insert {
    /// Start an INSERT into `table`.
    pub fn into_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Add a column and its value.
    pub fn value(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.columns.push(column.into());
        self.values.push(value.into());
        self
    }

    /// Add several column/value pairs.
    pub fn values(mut self, pairs: &[(&str, SqlValue)]) -> Self {
        for (column, value) in pairs {
            self.columns.push((*column).to_string());
            self.values.push(value.clone());
        }
        self
    }

    /// Build the SQL statement text, without a trailing semicolon.
    pub fn build_sql(&self) -> String {
        let mut sql = String::with_capacity(64 + self.columns.len() * 32);

        sql.push_str("INSERT INTO ");
        sql.push_str(&quote_identifier(&self.table));

        if self.columns.is_empty() {
            sql.push_str(" DEFAULT VALUES");
            return sql;
        }

        // Column list
        sql.push_str(" (");
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&quote_identifier(column));
        }

        // VALUES clause
        sql.push_str(") VALUES (");
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&escape_value(value));
        }
        sql.push(')');

        sql
    }
}
