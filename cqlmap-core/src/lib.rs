//! CQLMap Core
//!
//! A typed data-access layer over CQL rows. Entities map one field per
//! column onto a table; repository methods are declared against `SELECT`
//! templates and return scalars, nullable scalars, optional values,
//! entities, entity lists or whole-row maps. Column values are converted
//! into the requested Rust type using identity and lossless widening
//! conversions only.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cqlmap_core::{impl_entity, Config, Repository, storage::MemoryStore};
//! use cqlmap_core::schema::CqlType;
//!
//! struct User {
//!     id: String,
//!     age: Option<i32>,
//! }
//!
//! impl_entity! {
//!     User, table = "users",
//!     key id: String => CqlType::Text,
//!     columns {
//!         age: Option<i32> => CqlType::Int,
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(MemoryStore::new());
//! let users: Repository<User, MemoryStore> = Repository::open(store, Config::default()).await?;
//! users.save(&User { id: "u1".into(), age: Some(42) }).await?;
//! assert!(users.exists_by_id("u1").await?);
//! # Ok::<(), cqlmap_core::Error>(())
//! # });
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod config;
pub mod convert;
pub mod entity;
pub mod error;
pub mod projection;
pub mod query;
pub mod repository;
pub mod schema;
pub mod storage;
pub mod types;

// Re-export main types for convenience
pub use crate::{
    config::Config,
    convert::{ColumnValue, FromCql, IntoCql, TargetType},
    entity::{ColumnDecl, Entity},
    error::{Error, ErrorCategory, Result},
    query::{QueryMethod, ReturnShape},
    repository::Repository,
    schema::{CqlType, NamingStrategy, SchemaAction, TableSchema},
    storage::{MemoryStore, RowStore},
    types::{Decimal, Value},
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
