//! Typed repository over a row store
//!
//! A [`Repository`] owns the table schema and the compiled query methods
//! of one entity type. Opening it applies the configured schema action and
//! compiles every method the entity declares; after that the CRUD
//! operations and the typed method invokers only move rows between the
//! store and the projection layer.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::convert::{FromCql, IntoCql};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::projection;
use crate::query::{BoundSelect, QueryRegistry, ResultSet, ReturnShape, Selection};
use crate::schema::{apply_schema_action, TableSchema};
use crate::storage::RowStore;
use crate::types::Value;

/// Repository for entities of type `E` stored in `S`
pub struct Repository<E, S: ?Sized> {
    store: Arc<S>,
    schema: Arc<TableSchema>,
    table: String,
    registry: QueryRegistry,
    config: Config,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S> std::fmt::Debug for Repository<E, S>
where
    S: ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("table", &self.table)
            .field("methods", &self.registry.names())
            .finish()
    }
}

impl<E, S> Repository<E, S>
where
    E: Entity,
    S: RowStore + ?Sized,
{
    /// Open a repository: apply the schema action, then compile the
    /// entity's query methods
    pub async fn open(store: Arc<S>, config: Config) -> Result<Self> {
        config.validate()?;
        let schema = Arc::new(E::table_schema(&config)?);

        apply_schema_action(store.as_ref(), config.schema.action, &[schema.as_ref()]).await?;

        let registry = QueryRegistry::builder(Arc::clone(&schema))
            .methods(E::query_methods())
            .build()?;

        info!(
            table = %schema.qualified_name(),
            columns = schema.column_count(),
            methods = registry.len(),
            "opened repository"
        );

        Ok(Self {
            store,
            table: schema.qualified_name(),
            schema,
            registry,
            config,
            _entity: PhantomData,
        })
    }

    /// Schema of the entity table
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Compiled query methods
    pub fn registry(&self) -> &QueryRegistry {
        &self.registry
    }

    /// Underlying row store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Insert or replace an entity
    pub async fn save(&self, entity: &E) -> Result<()> {
        let values = entity.to_values();
        debug!(
            table = %self.table,
            key = %values.get(self.schema.key_index()).unwrap_or(&crate::types::Value::Null),
            "save"
        );
        self.store.upsert(&self.table, values).await
    }

    /// Save several entities in order, returning how many were saved
    ///
    /// Stops at the first failure; entities before it stay saved.
    pub async fn save_all<'a, I>(&self, entities: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a E>,
        E: 'a,
    {
        let mut saved = 0;
        for entity in entities {
            self.save(entity).await?;
            saved += 1;
        }
        Ok(saved)
    }

    fn by_key(&self, key: Value) -> BoundSelect {
        BoundSelect::all(self.table.clone())
            .with_predicate(self.schema.key_column().name.clone(), key)
    }

    /// Find an entity by partition key
    pub async fn find_by_id(&self, key: impl IntoCql) -> Result<Option<E>> {
        let query = self.by_key(key.to_cql());
        let result = self.store.select(&query).await?;
        projection::at_most_one(result)?
            .map(|row| projection::entity(&self.schema, row))
            .transpose()
    }

    /// Check whether an entity with the given key exists
    pub async fn exists_by_id(&self, key: impl IntoCql) -> Result<bool> {
        let query = self.by_key(key.to_cql()).with_selection(Selection::Columns(vec![self
            .schema
            .key_column()
            .name
            .clone()]));
        Ok(!self.store.select(&query).await?.is_empty())
    }

    /// All entities in store order, up to `query.max_result_rows`
    pub async fn find_all(&self) -> Result<Vec<E>> {
        let query = BoundSelect::all(self.table.clone())
            .with_limit(self.config.query.max_result_rows);
        let result = self.store.select(&query).await?;
        projection::entities(&self.schema, result)
    }

    /// Number of stored entities
    pub async fn count(&self) -> Result<u64> {
        let query = BoundSelect::all(self.table.clone())
            .with_selection(Selection::Columns(vec![self.schema.key_column().name.clone()]));
        Ok(self.store.select(&query).await?.row_count() as u64)
    }

    /// Delete an entity by partition key; `true` if it existed
    pub async fn delete_by_id(&self, key: impl IntoCql) -> Result<bool> {
        self.store.delete(&self.table, &key.to_cql()).await
    }

    /// Delete every entity, returning how many were removed
    pub async fn delete_all(&self) -> Result<u64> {
        let removed = self.store.truncate(&self.table).await?;
        info!(table = %self.table, removed, "deleted all entities");
        Ok(removed)
    }

    async fn invoke(
        &self,
        name: &str,
        args: &[Value],
        requested: ReturnShape,
    ) -> Result<(BoundSelect, ResultSet)> {
        let method = self.registry.get(name)?;
        if method.shape() != requested {
            return Err(Error::query(format!(
                "Method '{}' returns {}, called as {}",
                name,
                method.shape(),
                requested
            )));
        }

        // single-row shapes need a second row to detect an ambiguous match
        let cap = match requested {
            ReturnShape::Entities => self.config.query.max_result_rows,
            _ => self.config.query.max_result_rows.max(2),
        };
        let query = method.bind(args)?.with_limit(cap);
        debug!(method = %name, query = %query, "invoking query method");
        let result = self.store.select(&query).await?;
        Ok((query, result))
    }

    /// Invoke a method declared as [`ReturnShape::Entity`]
    pub async fn find_one(&self, name: &str, args: &[Value]) -> Result<E> {
        let (query, result) = self.invoke(name, args, ReturnShape::Entity).await?;
        let row = projection::exactly_one(result, &query.to_string())?;
        projection::entity(&self.schema, row)
    }

    /// Invoke a method declared as [`ReturnShape::OptionalEntity`]
    pub async fn find_optional(&self, name: &str, args: &[Value]) -> Result<Option<E>> {
        let (_, result) = self.invoke(name, args, ReturnShape::OptionalEntity).await?;
        projection::at_most_one(result)?
            .map(|row| projection::entity(&self.schema, row))
            .transpose()
    }

    /// Invoke a method declared as [`ReturnShape::Entities`]
    pub async fn find_many(&self, name: &str, args: &[Value]) -> Result<Vec<E>> {
        let (_, result) = self.invoke(name, args, ReturnShape::Entities).await?;
        projection::entities(&self.schema, result)
    }

    /// Invoke a method declared as [`ReturnShape::Scalar`]
    pub async fn scalar<T: FromCql>(&self, name: &str, args: &[Value]) -> Result<T> {
        let (query, result) = self
            .invoke(name, args, ReturnShape::Scalar(T::TARGET))
            .await?;
        let row = projection::exactly_one(result, &query.to_string())?;
        projection::scalar(&row)
    }

    /// Invoke a method declared as [`ReturnShape::Nullable`]
    pub async fn nullable<T: FromCql>(&self, name: &str, args: &[Value]) -> Result<Option<T>> {
        let (query, result) = self
            .invoke(name, args, ReturnShape::Nullable(T::TARGET))
            .await?;
        let row = projection::exactly_one(result, &query.to_string())?;
        projection::nullable(&row)
    }

    /// Invoke a method declared as [`ReturnShape::OptionalScalar`]
    ///
    /// `None` when no row matches. A matching row whose column is null is
    /// also `None`.
    pub async fn optional<T: FromCql>(&self, name: &str, args: &[Value]) -> Result<Option<T>> {
        let (_, result) = self
            .invoke(name, args, ReturnShape::OptionalScalar(T::TARGET))
            .await?;
        match projection::at_most_one(result)? {
            Some(row) => projection::nullable(&row),
            None => Ok(None),
        }
    }

    /// Invoke a method declared as [`ReturnShape::RowMap`]
    pub async fn row_map(&self, name: &str, args: &[Value]) -> Result<HashMap<String, Value>> {
        let (query, result) = self.invoke(name, args, ReturnShape::RowMap).await?;
        let row = projection::exactly_one(result, &query.to_string())?;
        Ok(projection::row_map(row))
    }
}
