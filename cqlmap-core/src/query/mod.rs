//! Query declarations for CQLMap
//!
//! - [`template`]: the `SELECT` template grammar and argument binding
//! - [`registry`]: query methods compiled against an entity table
//! - [`result`]: rows and result sets returned by a row store

pub mod registry;
pub mod result;
pub mod template;

pub use registry::{CompiledMethod, QueryMethod, QueryRegistry, QueryRegistryBuilder, ReturnShape};
pub use result::{ColumnSpec, ResultSet, Row};
pub use template::{BoundSelect, Predicate, SelectTemplate, Selection};
