//! Entity mapping
//!
//! An [`Entity`] is a Rust struct mapped one field per column onto a
//! table row. Implementations are normally generated with
//! [`impl_entity!`](crate::impl_entity), which derives the column
//! declarations and the row conversions from a single field list.

use crate::config::Config;
use crate::convert::ColumnValue;
use crate::error::{Error, Result};
use crate::query::QueryMethod;
use crate::schema::{CqlType, TableSchema};
use crate::types::Value;

/// Declaration of one mapped property
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDecl {
    /// Property name, before the naming strategy is applied
    pub property: &'static str,
    /// Column type
    pub cql_type: CqlType,
    /// Whether this is the partition key
    pub key: bool,
}

impl ColumnDecl {
    /// Declare the partition key property
    pub fn key(property: &'static str, cql_type: CqlType) -> Self {
        Self {
            property,
            cql_type,
            key: true,
        }
    }

    /// Declare a regular property
    pub fn regular(property: &'static str, cql_type: CqlType) -> Self {
        Self {
            property,
            cql_type,
            key: false,
        }
    }
}

/// A struct persisted as one row of one table
pub trait Entity: Sized + Send + Sync + 'static {
    /// Table name, before the naming strategy is applied
    const TABLE: &'static str;

    /// Mapped properties in column order
    fn columns() -> Vec<ColumnDecl>;

    /// Field values in the order of [`Entity::columns`]
    fn to_values(&self) -> Vec<Value>;

    /// Rebuild an entity from values in the order of [`Entity::columns`]
    fn from_values(values: Vec<Value>) -> Result<Self>;

    /// Query methods registered when a repository for this entity opens
    fn query_methods() -> Vec<QueryMethod> {
        Vec::new()
    }

    /// Table schema under the given configuration
    fn table_schema(config: &Config) -> Result<TableSchema> {
        Self::columns()
            .into_iter()
            .fold(
                TableSchema::builder(Self::TABLE)
                    .keyspace(config.schema.keyspace.clone())
                    .naming(config.mapping.naming),
                |builder, decl| {
                    if decl.key {
                        builder.key(decl.property, decl.cql_type)
                    } else {
                        builder.column(decl.property, decl.cql_type)
                    }
                },
            )
            .build()
    }
}

/// Take the next value of a row and convert it into a field
///
/// Used by [`impl_entity!`](crate::impl_entity); errors name the property
/// that failed.
pub fn decode_property<T, I>(values: &mut I, property: &str) -> Result<T>
where
    T: ColumnValue,
    I: Iterator<Item = Value>,
{
    let value = values
        .next()
        .ok_or_else(|| Error::mapping(format!("row has no value for property '{}'", property)))?;

    T::from_column(value).map_err(|e| match e {
        Error::TypeConversion(msg) => {
            Error::type_conversion(format!("property '{}': {}", property, msg))
        }
        Error::UnexpectedNull(msg) => {
            Error::unexpected_null(format!("property '{}': {}", property, msg))
        }
        other => other,
    })
}

#[doc(hidden)]
#[macro_export]
macro_rules! __property_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $name:literal) => {
        $name
    };
}

/// Implement [`Entity`] for a struct from its field list
///
/// ```ignore
/// struct Reading {
///     id: String,
///     sensor_value: Option<f64>,
/// }
///
/// impl_entity! {
///     Reading, table = "readings",
///     key id: String => CqlType::Text,
///     columns {
///         #[column("sensorValue")] sensor_value: Option<f64> => CqlType::Double,
///     }
/// }
/// ```
///
/// The key is always the first column. `#[column("...")]` overrides the
/// property name the naming strategy is applied to.
#[macro_export]
macro_rules! impl_entity {
    (
        $entity:ty, table = $table:expr,
        key $(#[column($key_name:literal)])? $key:ident : $key_ty:ty => $key_cql:expr,
        columns {
            $( $(#[column($name:literal)])? $field:ident : $ty:ty => $cql:expr ),* $(,)?
        }
        $(, methods = $methods:expr)? $(,)?
    ) => {
        impl $crate::entity::Entity for $entity {
            const TABLE: &'static str = $table;

            fn columns() -> ::std::vec::Vec<$crate::entity::ColumnDecl> {
                ::std::vec![
                    $crate::entity::ColumnDecl::key(
                        $crate::__property_name!($key $(, $key_name)?),
                        $key_cql,
                    ),
                    $(
                        $crate::entity::ColumnDecl::regular(
                            $crate::__property_name!($field $(, $name)?),
                            $cql,
                        ),
                    )*
                ]
            }

            fn to_values(&self) -> ::std::vec::Vec<$crate::Value> {
                ::std::vec![
                    $crate::convert::ColumnValue::to_column(&self.$key),
                    $( $crate::convert::ColumnValue::to_column(&self.$field), )*
                ]
            }

            fn from_values(values: ::std::vec::Vec<$crate::Value>) -> $crate::Result<Self> {
                let mut values = values.into_iter();
                Ok(Self {
                    $key: $crate::entity::decode_property::<$key_ty, _>(
                        &mut values,
                        $crate::__property_name!($key $(, $key_name)?),
                    )?,
                    $(
                        $field: $crate::entity::decode_property::<$ty, _>(
                            &mut values,
                            $crate::__property_name!($field $(, $name)?),
                        )?,
                    )*
                })
            }

            $(
                fn query_methods() -> ::std::vec::Vec<$crate::query::QueryMethod> {
                    $methods
                }
            )?
        }
    };
}
