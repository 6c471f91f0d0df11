use std::sync::Arc;

use crate::error::{Result, SpatialError};

/// A single row result from a query.
/// Values are text or NULL, in the column order of the result header.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Row {
    /// Creates a new Row from shared column names and values.
    /// Callers guarantee `values.len() == columns.len()`.
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<Option<String>>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Gets a value by column name.
    ///
    /// When the result carries the same column name more than once, the
    /// last occurrence wins.
    pub fn get(&self, column: &str) -> Result<Option<&str>> {
        self.columns
            .iter()
            .rposition(|name| name == column)
            .map(|i| self.values[i].as_deref())
            .ok_or_else(|| SpatialError::ColumnNotFound(column.to_string()))
    }

    /// Gets a value by position.
    pub fn value(&self, index: usize) -> Option<Option<&str>> {
        self.values.get(index).map(Option::as_deref)
    }

    /// Returns the value of the first column.
    pub fn first(&self) -> Option<Option<&str>> {
        self.value(0)
    }

    /// Returns all column names in this row, in header order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Iterates `(column, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }

    pub fn into_values(self) -> Vec<Option<String>> {
        self.values
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of a query execution, containing zero or more rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Arc<[String]>,
    rows: Vec<Row>,
}

impl ResultSet {
    /// Builds a result set, checking every row against the header width.
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        let columns: Arc<[String]> = columns.into();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, values)| {
                if values.len() != columns.len() {
                    return Err(SpatialError::Parse {
                        reason: format!(
                            "row {i} has {} cell(s), header has {}",
                            values.len(),
                            columns.len()
                        ),
                        sample: String::new(),
                    });
                }
                Ok(Row::new(Arc::clone(&columns), values))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns, rows })
    }

    pub fn empty() -> Self {
        Self {
            columns: Arc::from(Vec::new()),
            rows: Vec::new(),
        }
    }

    /// Extracts a single row from the result.
    /// Returns an error if the result contains zero or more than one row.
    pub fn single_row(self) -> Result<Row> {
        let actual = self.rows.len();
        match <[Row; 1]>::try_from(self.rows) {
            Ok([row]) => Ok(row),
            Err(_) => Err(SpatialError::UnexpectedRowCount {
                expected: 1,
                actual,
            }),
        }
    }

    /// Consumes the result, returning its first row if any.
    pub fn into_first(self) -> Option<Row> {
        self.rows.into_iter().next()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Returns all rows from the result.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Returns a reference to the rows without consuming the result.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the column names from this result.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows in this result.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if this result contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
