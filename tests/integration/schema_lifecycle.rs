//! Schema actions, configuration files and naming strategies end to end

use std::io::Write;
use std::sync::Arc;

use cqlmap_core::convert::TargetType;
use cqlmap_core::{
    impl_entity, Config, CqlType, Error, IntoCql, MemoryStore, NamingStrategy, QueryMethod,
    Repository, ReturnShape, RowStore, SchemaAction, TableSchema,
};
use integration_tests::{init_tracing, AllPossibleTypes};
use tempfile::NamedTempFile;

type Repo = Repository<AllPossibleTypes, MemoryStore>;

fn config_with(action: SchemaAction) -> Config {
    let mut config = Config::default();
    config.schema.action = action;
    config
}

async fn open(store: &Arc<MemoryStore>, action: SchemaAction) -> cqlmap_core::Result<Repo> {
    init_tracing();
    Repository::open(Arc::clone(store), config_with(action)).await
}

fn unrelated_table() -> TableSchema {
    TableSchema::builder("audit")
        .key("id", CqlType::Uuid)
        .column("entry", CqlType::Text)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_create_if_not_exists_keeps_data() {
    let store = Arc::new(MemoryStore::new());
    let first = open(&store, SchemaAction::CreateIfNotExists).await.unwrap();
    first.save(&AllPossibleTypes::new("kept")).await.unwrap();

    let second = open(&store, SchemaAction::CreateIfNotExists).await.unwrap();
    assert!(second.exists_by_id("kept").await.unwrap());
    assert_eq!(second.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_fails_when_table_exists() {
    let store = Arc::new(MemoryStore::new());
    open(&store, SchemaAction::Create).await.unwrap();

    let err = open(&store, SchemaAction::Create).await.unwrap_err();
    assert!(matches!(err, Error::Schema(_)), "{}", err);
}

#[tokio::test]
async fn test_none_leaves_store_untouched() {
    let store = Arc::new(MemoryStore::new());
    let repository = open(&store, SchemaAction::None).await.unwrap();

    assert!(store.table_names().await.unwrap().is_empty());
    let err = repository
        .save(&AllPossibleTypes::new("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Query(_)), "{}", err);
}

#[tokio::test]
async fn test_recreate_discards_rows_only_for_entity_table() {
    let store = Arc::new(MemoryStore::new());
    store.create_table(&unrelated_table(), false).await.unwrap();
    let first = open(&store, SchemaAction::Create).await.unwrap();
    first.save(&AllPossibleTypes::new("gone")).await.unwrap();

    let second = open(&store, SchemaAction::Recreate).await.unwrap();
    assert_eq!(second.count().await.unwrap(), 0);

    let mut tables = store.table_names().await.unwrap();
    tables.sort();
    assert_eq!(tables, vec!["allpossibletypes", "audit"]);
}

#[tokio::test]
async fn test_recreate_drop_unused_removes_unmapped_tables() {
    let store = Arc::new(MemoryStore::new());
    store.create_table(&unrelated_table(), false).await.unwrap();

    let repository = open(&store, SchemaAction::RecreateDropUnused).await.unwrap();
    assert_eq!(store.table_names().await.unwrap(), vec!["allpossibletypes"]);
    assert!(repository.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_keyspaces_share_a_store_without_clashing() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let mut repositories = Vec::new();
    for keyspace in ["east", "west"] {
        let mut config = config_with(SchemaAction::Create);
        config.schema.keyspace = Some(keyspace.to_string());
        let repository: Repo = Repository::open(Arc::clone(&store), config).await.unwrap();
        repositories.push(repository);
    }
    assert_eq!(
        store.table_names().await.unwrap(),
        vec!["east.allpossibletypes", "west.allpossibletypes"]
    );

    let (east, west) = (&repositories[0], &repositories[1]);
    let mut entity = AllPossibleTypes::new("shared");
    entity.primitive_integer = 1;
    east.save(&entity).await.unwrap();

    assert_eq!(west.find_by_id("shared").await.unwrap(), None);
    assert!(west
        .find_many("find_by_primitive_integer", &[1_i32.to_cql()])
        .await
        .unwrap()
        .is_empty());
    assert_eq!(east.find_by_id("shared").await.unwrap(), Some(entity));
    assert_eq!(west.delete_all().await.unwrap(), 0);
    assert_eq!(east.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_operations() {
    let store = Arc::new(MemoryStore::new());
    let repository = open(&store, SchemaAction::RecreateDropUnused).await.unwrap();
    let saved = repository
        .save_all(&[AllPossibleTypes::new("a"), AllPossibleTypes::new("b")])
        .await
        .unwrap();
    assert_eq!(saved, 2);

    assert!(repository.delete_by_id("a").await.unwrap());
    assert!(!repository.delete_by_id("a").await.unwrap());
    assert_eq!(repository.delete_all().await.unwrap(), 1);
    assert_eq!(store.row_count("allpossibletypes").unwrap(), 0);
}

#[derive(Debug, Clone, PartialEq)]
struct Reading {
    id: String,
    sensor_value: Option<f64>,
    sample_count: i32,
}

impl_entity! {
    Reading, table = "SensorReadings",
    key id: String => CqlType::Text,
    columns {
        #[column("sensorValue")] sensor_value: Option<f64> => CqlType::Double,
        #[column("sampleCount")] sample_count: i32 => CqlType::Int,
    },
    methods = vec![
        QueryMethod::new(
            "find_value_by_id",
            "SELECT sensor_value FROM telemetry.sensor_readings WHERE id = ?",
            ReturnShape::Nullable(TargetType::F64),
        )
        .param(CqlType::Text),
        QueryMethod::new(
            "find_by_sample_count",
            "SELECT * FROM sensor_readings WHERE sample_count = ? LIMIT 5",
            ReturnShape::Entities,
        )
        .param(CqlType::Int),
    ]
}

#[tokio::test]
async fn test_config_file_drives_naming_and_keyspace() {
    init_tracing();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[mapping]
naming = "snake_case"

[schema]
keyspace = "telemetry"
action = "recreate"

[query]
max_result_rows = 100
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.mapping.naming, NamingStrategy::SnakeCase);
    assert_eq!(config.query.max_result_rows, 100);

    let store = Arc::new(MemoryStore::new());
    let repository: Repository<Reading, MemoryStore> =
        Repository::open(Arc::clone(&store), config).await.unwrap();
    assert_eq!(repository.schema().qualified_name(), "telemetry.sensor_readings");
    assert_eq!(
        repository.schema().column_names(),
        vec!["id", "sensor_value", "sample_count"]
    );

    let reading = Reading {
        id: "r1".to_string(),
        sensor_value: Some(21.5),
        sample_count: 3,
    };
    repository.save(&reading).await.unwrap();

    let value = repository
        .nullable::<f64>("find_value_by_id", &["r1".to_cql()])
        .await
        .unwrap();
    assert_eq!(value, Some(21.5));

    let found = repository
        .find_many("find_by_sample_count", &[3_i32.to_cql()])
        .await
        .unwrap();
    assert_eq!(found, vec![reading]);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let err = Config::from_toml_str("[query]\nmax_result_rows = 0\n").unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));

    let err = Config::from_toml_str("[schema]\nkeyspace = \"Not Valid\"\n").unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));

    let err = Config::load("/nonexistent/cqlmap.toml").unwrap_err();
    assert!(matches!(err, Error::Io(_)));

    let mut config = Config::default();
    config.query.max_result_rows = 0;
    let store = Arc::new(MemoryStore::new());
    let err = Repository::<Reading, MemoryStore>::open(store, config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}
