//! Conversions between CQL values and Rust types
//!
//! [`FromCql`] reads a single cell into a Rust scalar, applying the
//! widening rules of [`TargetType::accepts`]; [`IntoCql`] produces the
//! identity [`Value`] for a Rust scalar. [`ColumnValue`] is the trait
//! entity fields implement and adds the null and collection handling on
//! top of those two.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use num_bigint::BigInt;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::schema::CqlType;
use crate::types::{
    date_from_days, days_from_date, millis_from_timestamp, nanos_from_time, time_from_nanos,
    timestamp_from_millis, Decimal, Value,
};

/// Rust scalar a query column can be projected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    Varint,
    Decimal,
    Text,
    Bytes,
    Uuid,
    Inet,
    Date,
    Time,
    Timestamp,
}

impl TargetType {
    /// Check whether a column of the given type converts to this target
    ///
    /// Identity conversions are always accepted. Numeric columns widen to
    /// any target that represents every value of the column type exactly.
    /// Collections never convert to a scalar target.
    pub fn accepts(&self, column: &CqlType) -> bool {
        use CqlType as C;

        let column = column.unfrozen();
        match self {
            TargetType::I8 => matches!(column, C::TinyInt),
            TargetType::I16 => matches!(column, C::TinyInt | C::SmallInt),
            TargetType::I32 => matches!(column, C::TinyInt | C::SmallInt | C::Int),
            TargetType::I64 => matches!(
                column,
                C::TinyInt | C::SmallInt | C::Int | C::BigInt | C::Counter
            ),
            TargetType::F32 => matches!(column, C::TinyInt | C::SmallInt | C::Float),
            TargetType::F64 => matches!(
                column,
                C::TinyInt | C::SmallInt | C::Int | C::Float | C::Double
            ),
            TargetType::Bool => matches!(column, C::Boolean),
            TargetType::Varint => matches!(
                column,
                C::TinyInt | C::SmallInt | C::Int | C::BigInt | C::Counter | C::Varint
            ),
            TargetType::Decimal => matches!(
                column,
                C::TinyInt
                    | C::SmallInt
                    | C::Int
                    | C::BigInt
                    | C::Counter
                    | C::Varint
                    | C::Decimal
            ),
            TargetType::Text => matches!(column, C::Text | C::Ascii),
            TargetType::Bytes => matches!(column, C::Blob),
            TargetType::Uuid => matches!(column, C::Uuid | C::TimeUuid),
            TargetType::Inet => matches!(column, C::Inet),
            TargetType::Date => matches!(column, C::Date),
            TargetType::Time => matches!(column, C::Time),
            TargetType::Timestamp => matches!(column, C::Timestamp),
        }
    }

    /// Rust type name, used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            TargetType::I8 => "i8",
            TargetType::I16 => "i16",
            TargetType::I32 => "i32",
            TargetType::I64 => "i64",
            TargetType::F32 => "f32",
            TargetType::F64 => "f64",
            TargetType::Bool => "bool",
            TargetType::Varint => "BigInt",
            TargetType::Decimal => "Decimal",
            TargetType::Text => "String",
            TargetType::Bytes => "Bytes",
            TargetType::Uuid => "Uuid",
            TargetType::Inet => "IpAddr",
            TargetType::Date => "NaiveDate",
            TargetType::Time => "NaiveTime",
            TargetType::Timestamp => "DateTime<Utc>",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read a single non-null cell into a Rust scalar
pub trait FromCql: Sized {
    /// Target this type is registered as in query methods
    const TARGET: TargetType;

    /// Convert a cell value, widening where [`TargetType::accepts`] allows
    fn from_cql(value: &Value) -> Result<Self>;
}

/// Produce the identity cell value for a Rust scalar
pub trait IntoCql {
    fn to_cql(&self) -> Value;
}

fn mismatch<T: FromCql>(value: &Value) -> Error {
    match value {
        Value::Null => Error::unexpected_null(format!(
            "null cannot be read as non-nullable {}",
            T::TARGET
        )),
        other => Error::type_conversion(format!(
            "cannot read {} value {} as {}",
            other.type_name(),
            other,
            T::TARGET
        )),
    }
}

impl FromCql for i8 {
    const TARGET: TargetType = TargetType::I8;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::TinyInt(i) => Ok(*i),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCql for i16 {
    const TARGET: TargetType = TargetType::I16;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::TinyInt(i) => Ok(i16::from(*i)),
            Value::SmallInt(i) => Ok(*i),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCql for i32 {
    const TARGET: TargetType = TargetType::I32;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::TinyInt(i) => Ok(i32::from(*i)),
            Value::SmallInt(i) => Ok(i32::from(*i)),
            Value::Int(i) => Ok(*i),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCql for i64 {
    const TARGET: TargetType = TargetType::I64;

    fn from_cql(value: &Value) -> Result<Self> {
        match value.as_i64() {
            Some(i) => Ok(i),
            None => Err(mismatch::<Self>(value)),
        }
    }
}

impl FromCql for f32 {
    const TARGET: TargetType = TargetType::F32;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::TinyInt(i) => Ok(f32::from(*i)),
            Value::SmallInt(i) => Ok(f32::from(*i)),
            Value::Float(f) => Ok(*f),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCql for f64 {
    const TARGET: TargetType = TargetType::F64;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::TinyInt(i) => Ok(f64::from(*i)),
            Value::SmallInt(i) => Ok(f64::from(*i)),
            Value::Int(i) => Ok(f64::from(*i)),
            Value::Float(f) => Ok(f64::from(*f)),
            Value::Double(f) => Ok(*f),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCql for bool {
    const TARGET: TargetType = TargetType::Bool;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(*b),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCql for BigInt {
    const TARGET: TargetType = TargetType::Varint;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::Varint(i) => Ok(i.clone()),
            other => match other.as_i64() {
                Some(i) => Ok(BigInt::from(i)),
                None => Err(mismatch::<Self>(other)),
            },
        }
    }
}

impl FromCql for Decimal {
    const TARGET: TargetType = TargetType::Decimal;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::Decimal(d) => Ok(d.clone()),
            Value::Varint(i) => Ok(Decimal::from(i.clone())),
            other => match other.as_i64() {
                Some(i) => Ok(Decimal::from(i)),
                None => Err(mismatch::<Self>(other)),
            },
        }
    }
}

impl FromCql for String {
    const TARGET: TargetType = TargetType::Text;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCql for Bytes {
    const TARGET: TargetType = TargetType::Bytes;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::Blob(b) => Ok(Bytes::copy_from_slice(b)),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCql for Uuid {
    const TARGET: TargetType = TargetType::Uuid;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::Uuid(u) => Ok(*u),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCql for IpAddr {
    const TARGET: TargetType = TargetType::Inet;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::Inet(ip) => Ok(*ip),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCql for NaiveDate {
    const TARGET: TargetType = TargetType::Date;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::Date(days) => date_from_days(*days),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCql for NaiveTime {
    const TARGET: TargetType = TargetType::Time;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::Time(nanos) => time_from_nanos(*nanos),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCql for DateTime<Utc> {
    const TARGET: TargetType = TargetType::Timestamp;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::Timestamp(ms) => timestamp_from_millis(*ms),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl IntoCql for i8 {
    fn to_cql(&self) -> Value {
        Value::TinyInt(*self)
    }
}

impl IntoCql for i16 {
    fn to_cql(&self) -> Value {
        Value::SmallInt(*self)
    }
}

impl IntoCql for i32 {
    fn to_cql(&self) -> Value {
        Value::Int(*self)
    }
}

impl IntoCql for i64 {
    fn to_cql(&self) -> Value {
        Value::BigInt(*self)
    }
}

impl IntoCql for f32 {
    fn to_cql(&self) -> Value {
        Value::Float(*self)
    }
}

impl IntoCql for f64 {
    fn to_cql(&self) -> Value {
        Value::Double(*self)
    }
}

impl IntoCql for bool {
    fn to_cql(&self) -> Value {
        Value::Boolean(*self)
    }
}

impl IntoCql for BigInt {
    fn to_cql(&self) -> Value {
        Value::Varint(self.clone())
    }
}

impl IntoCql for Decimal {
    fn to_cql(&self) -> Value {
        Value::Decimal(self.clone())
    }
}

impl IntoCql for String {
    fn to_cql(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl IntoCql for str {
    fn to_cql(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoCql for Bytes {
    fn to_cql(&self) -> Value {
        Value::Blob(self.to_vec())
    }
}

impl IntoCql for Uuid {
    fn to_cql(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl IntoCql for IpAddr {
    fn to_cql(&self) -> Value {
        Value::Inet(*self)
    }
}

impl IntoCql for NaiveDate {
    fn to_cql(&self) -> Value {
        Value::Date(days_from_date(*self))
    }
}

impl IntoCql for NaiveTime {
    fn to_cql(&self) -> Value {
        Value::Time(nanos_from_time(*self))
    }
}

impl IntoCql for DateTime<Utc> {
    fn to_cql(&self) -> Value {
        Value::Timestamp(millis_from_timestamp(self))
    }
}

impl<T: IntoCql + ?Sized> IntoCql for &T {
    fn to_cql(&self) -> Value {
        (**self).to_cql()
    }
}

/// A value that can be stored in and read back from one entity column
pub trait ColumnValue: Sized {
    /// Cell value for this field; may be [`Value::Null`]
    fn to_column(&self) -> Value;

    /// Rebuild the field from its cell value
    fn from_column(value: Value) -> Result<Self>;
}

/// Implement [`ColumnValue`] for types that already implement
/// [`FromCql`] and [`IntoCql`]
///
/// Enum fields stored as text implement the two conversion traits by hand
/// and then use this macro to become usable as entity fields.
#[macro_export]
macro_rules! scalar_column {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::convert::ColumnValue for $ty {
                fn to_column(&self) -> $crate::Value {
                    $crate::convert::IntoCql::to_cql(self)
                }

                fn from_column(value: $crate::Value) -> $crate::Result<Self> {
                    <$ty as $crate::convert::FromCql>::from_cql(&value)
                }
            }
        )*
    };
}

scalar_column!(
    i8,
    i16,
    i32,
    i64,
    f32,
    f64,
    bool,
    BigInt,
    Decimal,
    String,
    Bytes,
    Uuid,
    IpAddr,
    NaiveDate,
    NaiveTime,
    DateTime<Utc>,
);

impl<T: ColumnValue> ColumnValue for Option<T> {
    fn to_column(&self) -> Value {
        match self {
            Some(inner) => inner.to_column(),
            None => Value::Null,
        }
    }

    fn from_column(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_column(other).map(Some),
        }
    }
}

// A null collection column and an empty collection are the same thing in
// CQL, so both read back as an empty container.
fn elements(value: Value, kind: &str) -> Result<Vec<Value>> {
    match (value, kind) {
        (Value::Null, _) => Ok(Vec::new()),
        (Value::List(items), "list") | (Value::Set(items), "set") => Ok(items),
        (other, _) => Err(Error::type_conversion(format!(
            "cannot read {} value as {}",
            other.type_name(),
            kind
        ))),
    }
}

impl<T: FromCql + IntoCql> ColumnValue for Vec<T> {
    fn to_column(&self) -> Value {
        Value::List(self.iter().map(IntoCql::to_cql).collect())
    }

    fn from_column(value: Value) -> Result<Self> {
        elements(value, "list")?.iter().map(T::from_cql).collect()
    }
}

impl<T: FromCql + IntoCql + Ord> ColumnValue for BTreeSet<T> {
    fn to_column(&self) -> Value {
        Value::Set(self.iter().map(IntoCql::to_cql).collect())
    }

    fn from_column(value: Value) -> Result<Self> {
        elements(value, "set")?.iter().map(T::from_cql).collect()
    }
}

impl<K, V> ColumnValue for BTreeMap<K, V>
where
    K: FromCql + IntoCql + Ord,
    V: FromCql + IntoCql,
{
    fn to_column(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(key, value)| (key.to_cql(), value.to_cql()))
                .collect(),
        )
    }

    fn from_column(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(BTreeMap::new()),
            Value::Map(entries) => entries
                .iter()
                .map(|(key, value)| Ok((K::from_cql(key)?, V::from_cql(value)?)))
                .collect(),
            other => Err(Error::type_conversion(format!(
                "cannot read {} value as map",
                other.type_name()
            ))),
        }
    }
}
