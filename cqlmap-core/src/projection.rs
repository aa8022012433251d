//! Projection of result rows into requested shapes
//!
//! These functions hold the cardinality and null rules shared by every
//! query method:
//!
//! | shape            | no row       | one row          | several rows          |
//! |------------------|--------------|------------------|-----------------------|
//! | entity / scalar  | `NotFound`   | value            | `IncorrectResultSize` |
//! | optional         | `None`       | `Some(value)`    | `IncorrectResultSize` |
//! | entity list      | empty `Vec`  | one element      | every row             |
//!
//! A null column read as a non-nullable scalar is `UnexpectedNull`; read
//! as a nullable scalar it is `None`.

use std::collections::HashMap;

use crate::convert::FromCql;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::query::{ResultSet, Row};
use crate::schema::TableSchema;
use crate::types::Value;

/// The only row of a result, if any
pub fn at_most_one(result: ResultSet) -> Result<Option<Row>> {
    let count = result.row_count();
    if count > 1 {
        return Err(Error::incorrect_result_size(1, count));
    }
    Ok(result.into_rows().pop())
}

/// The only row of a result
///
/// `context` describes the query for the `NotFound` message.
pub fn exactly_one(result: ResultSet, context: &str) -> Result<Row> {
    at_most_one(result)?
        .ok_or_else(|| Error::not_found(format!("no row matched {}", context)))
}

/// Materialise an entity from a `SELECT *` row
///
/// Values are matched to the entity's columns by name, so the row may
/// list its columns in any order.
pub fn entity<E: Entity>(schema: &TableSchema, row: Row) -> Result<E> {
    let in_schema_order = row.columns().len() == schema.column_count()
        && row
            .columns()
            .iter()
            .zip(&schema.columns)
            .all(|(spec, column)| spec.name == column.name);

    if in_schema_order {
        return E::from_values(row.into_values());
    }

    let mut by_name = row.into_map();
    let values = schema
        .columns
        .iter()
        .map(|column| {
            by_name.remove(&column.name).ok_or_else(|| {
                Error::mapping(format!(
                    "row has no column '{}' for entity table '{}'",
                    column.name, schema.table
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    E::from_values(values)
}

/// Materialise every row of a result as entities, in result order
pub fn entities<E: Entity>(schema: &TableSchema, result: ResultSet) -> Result<Vec<E>> {
    result.into_iter().map(|row| entity(schema, row)).collect()
}

fn single_column(row: &Row) -> Result<&Value> {
    match row.values() {
        [value] => Ok(value),
        values => Err(Error::mapping(format!(
            "scalar projection needs exactly one column, row has {}",
            values.len()
        ))),
    }
}

/// Read the single column of a row as a non-nullable scalar
pub fn scalar<T: FromCql>(row: &Row) -> Result<T> {
    let value = single_column(row)?;
    T::from_cql(value).map_err(|e| match e {
        Error::UnexpectedNull(_) => Error::unexpected_null(format!(
            "column '{}' is null and cannot be read as {}",
            row.columns()[0].name,
            T::TARGET
        )),
        other => other,
    })
}

/// Read the single column of a row; a null column is `None`
pub fn nullable<T: FromCql>(row: &Row) -> Result<Option<T>> {
    match single_column(row)? {
        Value::Null => Ok(None),
        value => T::from_cql(value).map(Some),
    }
}

/// Column name → value for every selected column, nulls included
pub fn row_map(row: Row) -> HashMap<String, Value> {
    row.into_map()
}
