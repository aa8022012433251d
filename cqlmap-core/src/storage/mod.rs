//! Row storage for CQLMap
//!
//! [`RowStore`] is the seam between the repository and whatever actually
//! holds the rows. It speaks in whole rows laid out in schema column order
//! and in bound `SELECT`s; it knows nothing about entities or projection
//! shapes. [`MemoryStore`] is the bundled implementation.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::query::{BoundSelect, ResultSet};
use crate::schema::TableSchema;
use crate::types::Value;

/// Row-shaped storage backend
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Create a table; an existing table is an error unless `if_not_exists`
    async fn create_table(&self, schema: &TableSchema, if_not_exists: bool) -> Result<()>;

    /// Drop a table and its rows; a missing table is an error unless `if_exists`
    async fn drop_table(&self, table: &str, if_exists: bool) -> Result<()>;

    /// Names of all tables, sorted
    async fn table_names(&self) -> Result<Vec<String>>;

    /// Insert or replace the row with the same partition key
    ///
    /// `values` follow the table's column order.
    async fn upsert(&self, table: &str, values: Vec<Value>) -> Result<()>;

    /// Run a bound `SELECT`
    async fn select(&self, query: &BoundSelect) -> Result<ResultSet>;

    /// Delete the row with the given partition key; `true` if it existed
    async fn delete(&self, table: &str, key: &Value) -> Result<bool>;

    /// Delete every row of a table, returning how many were removed
    async fn truncate(&self, table: &str) -> Result<u64>;
}
