//! Query result types for CQLMap
//!
//! A [`ResultSet`] is what a [`RowStore`](crate::storage::RowStore)
//! returns for a `SELECT`: column metadata in select order plus the rows.
//! Rows share the column list through an `Arc` so projecting a row into a
//! name→value map does not copy metadata per row.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::CqlType;
use crate::types::Value;

/// Information about a column in the result set
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,
    /// Column data type
    pub cql_type: CqlType,
}

impl ColumnSpec {
    /// Create a new column spec
    pub fn new(name: impl Into<String>, cql_type: CqlType) -> Self {
        Self {
            name: name.into(),
            cql_type,
        }
    }
}

/// Individual row in a result set
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[ColumnSpec]>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row; `values` must line up with `columns`
    pub fn new(columns: Arc<[ColumnSpec]>, values: Vec<Value>) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(Error::internal(format!(
                "row has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, values })
    }

    /// Column metadata, in select order
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Get a value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .and_then(|i| self.values.get(i))
    }

    /// Get a value by position
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Number of columns in the row
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in select order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Take the values out of the row
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Column name → value, one entry per selected column
    pub fn into_map(self) -> HashMap<String, Value> {
        self.columns
            .iter()
            .map(|c| c.name.clone())
            .zip(self.values)
            .collect()
    }
}

/// Rows returned by a `SELECT`
#[derive(Debug, Clone)]
pub struct ResultSet {
    columns: Arc<[ColumnSpec]>,
    rows: Vec<Row>,
}

impl ResultSet {
    /// Create an empty result with the given columns
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns: columns.into(),
            rows: Vec::new(),
        }
    }

    /// Append a row of values in column order
    pub fn push(&mut self, values: Vec<Value>) -> Result<()> {
        self.rows.push(Row::new(Arc::clone(&self.columns), values)?);
        Ok(())
    }

    /// Column metadata
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get the number of rows in the result
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a specific row by index
    pub fn get_row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Create result iterator
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Take the rows out of the result
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
