//! Repository setup shared by the integration suites

use std::sync::{Arc, Once};

use cqlmap_core::{Config, MemoryStore, Repository, Result, SchemaAction};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::all_possible_types::AllPossibleTypes;

/// Repository type used throughout the suites
pub type TestRepository = Repository<AllPossibleTypes, MemoryStore>;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary
///
/// Honors `RUST_LOG`; silent when it is unset.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Open a repository over a fresh store, dropping anything left behind
pub async fn open_repository() -> Result<TestRepository> {
    let mut config = Config::default();
    config.schema.action = SchemaAction::RecreateDropUnused;
    open_repository_with(config).await
}

/// Open a repository over a fresh store with the given configuration
pub async fn open_repository_with(config: Config) -> Result<TestRepository> {
    init_tracing();
    debug!(
        action = ?config.schema.action,
        max_result_rows = config.query.max_result_rows,
        "opening test repository"
    );
    let repository = Repository::open(Arc::new(MemoryStore::new()), config).await?;
    debug!(table = %repository.schema().qualified_name(), "test repository ready");
    Ok(repository)
}
