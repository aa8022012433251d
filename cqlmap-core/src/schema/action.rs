//! Schema actions applied when a repository starts

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::schema::TableSchema;
use crate::storage::RowStore;

/// What to do with entity tables at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaAction {
    /// Leave the store untouched
    None,
    /// Create entity tables; fail if one already exists
    Create,
    /// Create entity tables that do not exist yet
    #[default]
    CreateIfNotExists,
    /// Drop and re-create entity tables
    Recreate,
    /// Drop every table that is not an entity table, then re-create
    RecreateDropUnused,
}

/// Apply a schema action for the given entity tables
pub async fn apply_schema_action<S>(
    store: &S,
    action: SchemaAction,
    schemas: &[&TableSchema],
) -> Result<()>
where
    S: RowStore + ?Sized,
{
    match action {
        SchemaAction::None => Ok(()),
        SchemaAction::Create => create_all(store, schemas, false).await,
        SchemaAction::CreateIfNotExists => create_all(store, schemas, true).await,
        SchemaAction::Recreate => {
            drop_all(store, schemas).await?;
            create_all(store, schemas, false).await
        }
        SchemaAction::RecreateDropUnused => {
            for table in store.table_names().await? {
                if !schemas.iter().any(|s| s.qualified_name() == table) {
                    warn!(table = %table, "dropping table with no mapped entity");
                    store.drop_table(&table, true).await?;
                }
            }
            drop_all(store, schemas).await?;
            create_all(store, schemas, false).await
        }
    }
}

async fn create_all<S>(store: &S, schemas: &[&TableSchema], if_not_exists: bool) -> Result<()>
where
    S: RowStore + ?Sized,
{
    for schema in schemas {
        info!(cql = %schema.create_table_cql(if_not_exists), "creating table");
        store.create_table(schema, if_not_exists).await?;
    }
    Ok(())
}

async fn drop_all<S>(store: &S, schemas: &[&TableSchema]) -> Result<()>
where
    S: RowStore + ?Sized,
{
    for schema in schemas {
        let table = schema.qualified_name();
        info!(table = %table, "dropping table");
        store.drop_table(&table, true).await?;
    }
    Ok(())
}
