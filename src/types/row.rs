use std::collections::HashMap;

use crate::error::{PgRepoError, Result};
use crate::types::{FromSqlValue, SqlValue};

/// Driver-agnostic raw result from a database query.
#[derive(Debug, Clone, Default)]
pub struct RawQueryResult {
    /// Column names in order
    pub columns: Vec<String>,
    /// Rows, where each row is a vector of values in column order
    pub rows: Vec<Vec<SqlValue>>,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Splits the result into rows addressable by column name.
    pub fn into_rows(self) -> Vec<Row> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|values| Row::new(&columns, values))
            .collect()
    }
}

/// A single row result from a query.
/// Values are accessed by column name.
#[derive(Debug, Clone)]
pub struct Row {
    values: HashMap<String, SqlValue>,
}

impl Row {
    /// Creates a new Row from column names and values.
    pub fn new(columns: &[String], values: Vec<SqlValue>) -> Self {
        let values = columns
            .iter()
            .zip(values)
            .map(|(col, val)| (col.clone(), val))
            .collect();
        Self { values }
    }

    /// Gets the raw value of a column.
    pub fn value(&self, column: &str) -> Result<&SqlValue> {
        self.values
            .get(column)
            .ok_or_else(|| PgRepoError::ColumnNotFound(column.to_string()))
    }

    /// Gets a column value decoded into `V`.
    pub fn get<V: FromSqlValue>(&self, column: &str) -> Result<V> {
        let value = self.value(column)?;
        V::from_sql_value(value).ok_or_else(|| PgRepoError::TypeMismatch {
            column: column.to_string(),
            expected: V::EXPECTED,
            found: value.kind().to_string(),
        })
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
