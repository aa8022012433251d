//! In-memory row store
//!
//! Each table is an ordered map from the serialized partition key to the
//! serialized row, so rows come back in partition key byte order and every
//! value goes through the same codec a wire driver would use.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::codec::{check_value, decode_row, encode_row, encode_value};
use crate::error::{Error, Result};
use crate::query::{BoundSelect, ColumnSpec, ResultSet, Selection};
use crate::schema::TableSchema;
use crate::storage::RowStore;
use crate::types::Value;

#[derive(Debug)]
struct StoredTable {
    schema: Arc<TableSchema>,
    rows: BTreeMap<Vec<u8>, Bytes>,
}

impl StoredTable {
    /// Encoded partition key, or `None` for a null or empty key that no
    /// stored row can have
    fn key_bytes(&self, key: &Value) -> Result<Option<Vec<u8>>> {
        let empty = match key {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            Value::Blob(b) => b.is_empty(),
            _ => false,
        };
        if empty {
            return Ok(None);
        }

        let mut buf = BytesMut::new();
        encode_value(key, &self.schema.key_column().cql_type, &mut buf)?;
        Ok(Some(buf.to_vec()))
    }

    fn encode_key(&self, key: &Value) -> Result<Vec<u8>> {
        self.key_bytes(key)?.ok_or_else(|| {
            Error::mapping(format!(
                "partition key '{}' of table '{}' cannot be null or empty",
                self.schema.key_column().name,
                self.schema.table
            ))
        })
    }
}

/// Row store kept entirely in process memory
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, StoredTable>>,
    open: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            open: AtomicBool::new(true),
        }
    }

    /// Close the store; every later call fails with [`Error::Unavailable`]
    pub fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            debug!("memory store closed");
        }
    }

    /// Check if the store is still open
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Number of rows currently held in a table
    pub fn row_count(&self, table: &str) -> Result<usize> {
        self.check_open()?;
        let tables = self.tables.read();
        Ok(lookup(&tables, table)?.rows.len())
    }

    fn check_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::unavailable("memory store is closed"))
        }
    }
}

fn lookup<'a>(tables: &'a HashMap<String, StoredTable>, table: &str) -> Result<&'a StoredTable> {
    tables
        .get(table)
        .ok_or_else(|| Error::query(format!("unconfigured table '{}'", table)))
}

fn lookup_mut<'a>(
    tables: &'a mut HashMap<String, StoredTable>,
    table: &str,
) -> Result<&'a mut StoredTable> {
    tables
        .get_mut(table)
        .ok_or_else(|| Error::query(format!("unconfigured table '{}'", table)))
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn create_table(&self, schema: &TableSchema, if_not_exists: bool) -> Result<()> {
        self.check_open()?;
        let mut tables = self.tables.write();
        let name = schema.qualified_name();
        if tables.contains_key(&name) {
            if if_not_exists {
                trace!(table = %name, "table already exists");
                return Ok(());
            }
            return Err(Error::schema(format!("table '{}' already exists", name)));
        }

        tables.insert(
            name.clone(),
            StoredTable {
                schema: Arc::new(schema.clone()),
                rows: BTreeMap::new(),
            },
        );
        debug!(table = %name, columns = schema.column_count(), "created table");
        Ok(())
    }

    async fn drop_table(&self, table: &str, if_exists: bool) -> Result<()> {
        self.check_open()?;
        let mut tables = self.tables.write();
        match tables.remove(table) {
            Some(dropped) => {
                debug!(table = %table, rows = dropped.rows.len(), "dropped table");
                Ok(())
            }
            None if if_exists => Ok(()),
            None => Err(Error::schema(format!("table '{}' does not exist", table))),
        }
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        self.check_open()?;
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort_unstable();
        Ok(names)
    }

    async fn upsert(&self, table: &str, values: Vec<Value>) -> Result<()> {
        self.check_open()?;
        let mut tables = self.tables.write();
        let stored = lookup_mut(&mut tables, table)?;

        let key_value = values.get(stored.schema.key_index()).ok_or_else(|| {
            Error::mapping(format!(
                "table '{}' has {} columns, got {} values",
                table,
                stored.schema.column_count(),
                values.len()
            ))
        })?;
        let key = stored.encode_key(key_value)?;
        let row = encode_row(&stored.schema, &values)?;

        trace!(table = %table, key = %key_value, bytes = row.len(), "upsert");
        stored.rows.insert(key, row);
        Ok(())
    }

    async fn select(&self, query: &BoundSelect) -> Result<ResultSet> {
        self.check_open()?;
        let tables = self.tables.read();
        let stored = lookup(&tables, &query.table)?;
        let schema = &stored.schema;

        let selected: Vec<usize> = match &query.selection {
            Selection::All => (0..schema.column_count()).collect(),
            Selection::Columns(names) => names
                .iter()
                .map(|name| {
                    schema.column_index(name).ok_or_else(|| {
                        Error::query(format!("undefined column '{}' in table '{}'", name, schema.table))
                    })
                })
                .collect::<Result<_>>()?,
        };

        let mut restrictions = Vec::with_capacity(query.predicates.len());
        let mut key_restriction = None;
        for (name, value) in &query.predicates {
            let index = schema.column_index(name).ok_or_else(|| {
                Error::query(format!("undefined column '{}' in table '{}'", name, schema.table))
            })?;
            check_value(value, &schema.columns[index].cql_type).map_err(|e| {
                Error::query(format!("invalid value for column '{}': {}", name, e))
            })?;
            if index == schema.key_index() {
                key_restriction = Some(stored.key_bytes(value)?);
            }
            restrictions.push((index, value));
        }

        let candidates: Box<dyn Iterator<Item = &Bytes>> = match &key_restriction {
            Some(Some(key)) => Box::new(stored.rows.get(key).into_iter()),
            Some(None) => Box::new(std::iter::empty()),
            None => Box::new(stored.rows.values()),
        };

        let mut result = ResultSet::new(
            selected
                .iter()
                .map(|&i| ColumnSpec::new(schema.columns[i].name.clone(), schema.columns[i].cql_type.clone()))
                .collect(),
        );
        let limit = query.limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        for bytes in candidates {
            if result.row_count() >= limit {
                break;
            }
            let row = decode_row(schema, bytes)?;
            if restrictions.iter().all(|(i, value)| &row[*i] == *value) {
                result.push(selected.iter().map(|&i| row[i].clone()).collect())?;
            }
        }

        debug!(query = %query, rows = result.row_count(), "select");
        Ok(result)
    }

    async fn delete(&self, table: &str, key: &Value) -> Result<bool> {
        self.check_open()?;
        let mut tables = self.tables.write();
        let stored = lookup_mut(&mut tables, table)?;
        let existed = match stored.key_bytes(key)? {
            Some(encoded) => stored.rows.remove(&encoded).is_some(),
            None => false,
        };
        trace!(table = %table, key = %key, existed, "delete");
        Ok(existed)
    }

    async fn truncate(&self, table: &str) -> Result<u64> {
        self.check_open()?;
        let mut tables = self.tables.write();
        let stored = lookup_mut(&mut tables, table)?;
        let removed = stored.rows.len() as u64;
        stored.rows.clear();
        debug!(table = %table, removed, "truncated table");
        Ok(removed)
    }
}
