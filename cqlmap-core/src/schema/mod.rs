//! Table schema definitions for CQLMap
//!
//! A [`TableSchema`] describes the row layout an entity maps onto: the
//! storage name and CQL type of every column, in declaration order, and
//! which column is the partition key. Schemas are built from an entity's
//! property declarations through [`TableSchemaBuilder`], which applies the
//! configured [`NamingStrategy`].

pub mod action;
pub mod cql_parser;

pub use action::{apply_schema_action, SchemaAction};
pub use cql_parser::parse_cql_type;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Parsed CQL data type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CqlType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Counter,
    Float,
    Double,
    Varint,
    Decimal,
    Text,
    Ascii,
    Blob,
    Uuid,
    TimeUuid,
    Inet,
    Date,
    Time,
    Timestamp,

    List(Box<CqlType>),
    Set(Box<CqlType>),
    Map(Box<CqlType>, Box<CqlType>),
    Frozen(Box<CqlType>),
}

impl CqlType {
    /// Shorthand for `list<inner>`
    pub fn list(inner: CqlType) -> Self {
        CqlType::List(Box::new(inner))
    }

    /// Shorthand for `set<inner>`
    pub fn set(inner: CqlType) -> Self {
        CqlType::Set(Box::new(inner))
    }

    /// Shorthand for `map<key, value>`
    pub fn map(key: CqlType, value: CqlType) -> Self {
        CqlType::Map(Box::new(key), Box::new(value))
    }

    /// The type with any `frozen<>` wrapper removed
    pub fn unfrozen(&self) -> &CqlType {
        match self {
            CqlType::Frozen(inner) => inner.unfrozen(),
            other => other,
        }
    }

    /// Check if this type is a list, set or map
    pub fn is_collection(&self) -> bool {
        matches!(
            self.unfrozen(),
            CqlType::List(_) | CqlType::Set(_) | CqlType::Map(_, _)
        )
    }

    /// Check if this type is an integral or floating-point number
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.unfrozen(),
            CqlType::TinyInt
                | CqlType::SmallInt
                | CqlType::Int
                | CqlType::BigInt
                | CqlType::Counter
                | CqlType::Float
                | CqlType::Double
                | CqlType::Varint
                | CqlType::Decimal
        )
    }
}

impl fmt::Display for CqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CqlType::Boolean => write!(f, "boolean"),
            CqlType::TinyInt => write!(f, "tinyint"),
            CqlType::SmallInt => write!(f, "smallint"),
            CqlType::Int => write!(f, "int"),
            CqlType::BigInt => write!(f, "bigint"),
            CqlType::Counter => write!(f, "counter"),
            CqlType::Float => write!(f, "float"),
            CqlType::Double => write!(f, "double"),
            CqlType::Varint => write!(f, "varint"),
            CqlType::Decimal => write!(f, "decimal"),
            CqlType::Text => write!(f, "text"),
            CqlType::Ascii => write!(f, "ascii"),
            CqlType::Blob => write!(f, "blob"),
            CqlType::Uuid => write!(f, "uuid"),
            CqlType::TimeUuid => write!(f, "timeuuid"),
            CqlType::Inet => write!(f, "inet"),
            CqlType::Date => write!(f, "date"),
            CqlType::Time => write!(f, "time"),
            CqlType::Timestamp => write!(f, "timestamp"),
            CqlType::List(inner) => write!(f, "list<{}>", inner),
            CqlType::Set(inner) => write!(f, "set<{}>", inner),
            CqlType::Map(key, value) => write!(f, "map<{}, {}>", key, value),
            CqlType::Frozen(inner) => write!(f, "frozen<{}>", inner),
        }
    }
}

impl FromStr for CqlType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_cql_type(s)
    }
}

/// Strategy mapping declared property names to storage column names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// `primitiveInteger` -> `primitiveinteger`
    #[default]
    LowerCase,
    /// `primitiveInteger` -> `primitive_integer`
    SnakeCase,
}

impl NamingStrategy {
    /// Apply this strategy to a property name
    pub fn column_name(&self, property: &str) -> String {
        match self {
            NamingStrategy::LowerCase => property.to_lowercase(),
            NamingStrategy::SnakeCase => {
                let mut out = String::with_capacity(property.len() + 4);
                for (i, c) in property.chars().enumerate() {
                    if c.is_uppercase() {
                        if i > 0 && !out.ends_with('_') {
                            out.push('_');
                        }
                        out.extend(c.to_lowercase());
                    } else {
                        out.push(c);
                    }
                }
                out
            }
        }
    }
}

/// Role of a column within its table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// The single partition key column
    PartitionKey,
    /// Any other column
    Regular,
}

/// Column definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Storage column name
    pub name: String,

    /// Property name the column was declared with
    pub property: String,

    /// CQL data type
    pub cql_type: CqlType,

    /// Key or regular column
    pub kind: ColumnKind,
}

impl ColumnDef {
    /// Check if this column is the partition key
    pub fn is_key(&self) -> bool {
        self.kind == ColumnKind::PartitionKey
    }
}

/// Table schema definition
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// Keyspace name, if the table is qualified
    pub keyspace: Option<String>,

    /// Table name
    pub table: String,

    /// All columns in declaration order
    pub columns: Vec<ColumnDef>,

    key_index: usize,
}

impl TableSchema {
    /// Start building a schema for the given table
    pub fn builder(table: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder::new(table)
    }

    /// `keyspace.table`, or just `table`
    pub fn qualified_name(&self) -> String {
        match &self.keyspace {
            Some(keyspace) => format!("{}.{}", keyspace, self.table),
            None => self.table.clone(),
        }
    }

    /// Number of mapped columns, key included
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get a column by storage name
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column by storage name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// The partition key column
    pub fn key_column(&self) -> &ColumnDef {
        &self.columns[self.key_index]
    }

    /// Position of the partition key column
    pub fn key_index(&self) -> usize {
        self.key_index
    }

    /// Storage names of all columns, in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Render the `CREATE TABLE` statement for this schema
    pub fn create_table_cql(&self, if_not_exists: bool) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_if_needed(&c.name), c.cql_type))
            .collect();

        format!(
            "CREATE TABLE {}{} ({}, PRIMARY KEY ({}))",
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            self.qualified_name(),
            columns.join(", "),
            quote_if_needed(&self.key_column().name),
        )
    }
}

fn quote_if_needed(name: &str) -> String {
    if name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        name.to_string()
    } else {
        format!("\"{}\"", name)
    }
}

/// Validate a CQL identifier (keyspace or table name)
///
/// Identifiers start with a letter, contain only letters, digits and
/// underscores, and are at most 48 characters long.
pub fn validate_identifier(name: &str, kind: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::schema(format!("{} name cannot be empty", kind)));
    }

    if name.len() > 48 {
        return Err(Error::schema(format!(
            "{} name '{}' exceeds maximum length of 48 characters",
            kind, name
        )));
    }

    let mut chars = name.chars();
    if !chars.next().map_or(false, |c| c.is_ascii_alphabetic()) {
        return Err(Error::schema(format!(
            "{} name '{}' must start with a letter",
            kind, name
        )));
    }

    if let Some(c) = chars.find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
        return Err(Error::schema(format!(
            "{} name '{}' contains invalid character '{}'",
            kind, name, c
        )));
    }

    Ok(())
}

/// Builder for [`TableSchema`]
#[derive(Debug, Clone)]
pub struct TableSchemaBuilder {
    keyspace: Option<String>,
    table: String,
    naming: NamingStrategy,
    columns: Vec<(String, CqlType, ColumnKind)>,
}

impl TableSchemaBuilder {
    /// Create a builder for the given table
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            keyspace: None,
            table: table.into(),
            naming: NamingStrategy::default(),
            columns: Vec::new(),
        }
    }

    /// Qualify the table with a keyspace
    pub fn keyspace(mut self, keyspace: Option<String>) -> Self {
        self.keyspace = keyspace;
        self
    }

    /// Naming strategy for table and column names
    pub fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    /// Declare the partition key column
    pub fn key(mut self, property: impl Into<String>, cql_type: CqlType) -> Self {
        self.columns
            .push((property.into(), cql_type, ColumnKind::PartitionKey));
        self
    }

    /// Declare a regular column
    pub fn column(mut self, property: impl Into<String>, cql_type: CqlType) -> Self {
        self.columns.push((property.into(), cql_type, ColumnKind::Regular));
        self
    }

    /// Validate the declarations and build the schema
    pub fn build(self) -> Result<TableSchema> {
        let table = self.naming.column_name(&self.table);
        validate_identifier(&table, "Table")?;
        if let Some(keyspace) = &self.keyspace {
            validate_identifier(keyspace, "Keyspace")?;
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(self.columns.len());
        for (property, cql_type, kind) in self.columns {
            let name = self.naming.column_name(&property);
            if name.is_empty() {
                return Err(Error::schema(format!(
                    "Column in table '{}' has an empty name",
                    table
                )));
            }
            if !seen.insert(name.clone()) {
                return Err(Error::schema(format!(
                    "Duplicate column '{}' in table '{}'",
                    name, table
                )));
            }
            columns.push(ColumnDef {
                name,
                property,
                cql_type,
                kind,
            });
        }

        let keys: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_key())
            .map(|(i, _)| i)
            .collect();

        let key_index = match keys.as_slice() {
            [index] => *index,
            [] => {
                return Err(Error::schema(format!(
                    "Table '{}' declares no partition key",
                    table
                )))
            }
            _ => {
                return Err(Error::schema(format!(
                    "Table '{}' declares {} partition keys; exactly one is supported",
                    table,
                    keys.len()
                )))
            }
        };

        if columns[key_index].cql_type.is_collection() {
            return Err(Error::schema(format!(
                "Partition key '{}' cannot be a collection",
                columns[key_index].name
            )));
        }

        Ok(TableSchema {
            keyspace: self.keyspace,
            table,
            columns,
            key_index,
        })
    }
}
