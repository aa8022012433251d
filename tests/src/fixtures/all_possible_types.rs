//! Reference entity covering every supported column type

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use cqlmap_core::convert::TargetType;
use cqlmap_core::{
    impl_entity, scalar_column, CqlType, Decimal, Error, FromCql, IntoCql, QueryMethod, Result,
    ReturnShape, Value,
};
use num_bigint::BigInt;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use uuid::Uuid;

/// Enum stored by name in a `text` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Condition {
    Mint,
    Used,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Mint => write!(f, "MINT"),
            Condition::Used => write!(f, "USED"),
        }
    }
}

impl FromStr for Condition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MINT" => Ok(Condition::Mint),
            "USED" => Ok(Condition::Used),
            other => Err(Error::type_conversion(format!(
                "'{}' is not a Condition",
                other
            ))),
        }
    }
}

impl FromCql for Condition {
    const TARGET: TargetType = TargetType::Text;

    fn from_cql(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => s.parse(),
            Value::Null => Err(Error::unexpected_null("Condition cannot be null")),
            other => Err(Error::type_conversion(format!(
                "cannot read {} as Condition",
                other.type_name()
            ))),
        }
    }
}

impl IntoCql for Condition {
    fn to_cql(&self) -> Value {
        Value::Text(self.to_string())
    }
}

scalar_column!(Condition);

/// One row of `allpossibletypes`
///
/// `boxed*` properties are nullable, `primitive*` properties always hold a
/// value. Collections read back empty when nothing was stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllPossibleTypes {
    pub id: String,

    pub inet: Option<IpAddr>,
    pub uuid: Option<Uuid>,
    pub time_uuid: Option<Uuid>,

    pub boxed_byte: Option<i8>,
    pub primitive_byte: i8,
    pub boxed_short: Option<i16>,
    pub primitive_short: i16,
    pub boxed_integer: Option<i32>,
    pub primitive_integer: i32,
    pub boxed_long: Option<i64>,
    pub primitive_long: i64,
    pub boxed_float: Option<f32>,
    pub primitive_float: f32,
    pub boxed_double: Option<f64>,
    pub primitive_double: f64,
    pub boxed_boolean: Option<bool>,
    pub primitive_boolean: bool,

    pub big_integer: Option<BigInt>,
    pub big_decimal: Option<Decimal>,

    pub date: Option<NaiveDate>,
    pub local_date: Option<NaiveDate>,
    pub timestamp: Option<DateTime<Utc>>,
    pub instant: Option<DateTime<Utc>>,
    pub local_date_time: Option<DateTime<Utc>>,
    pub local_time: Option<NaiveTime>,
    pub time: Option<NaiveTime>,

    pub text: Option<String>,
    pub ascii: Option<String>,
    pub blob: Option<Bytes>,
    pub an_enum: Option<Condition>,

    pub set_of_string: BTreeSet<String>,
    pub list_of_string: Vec<String>,
    pub map_of_string: BTreeMap<String, String>,
    pub set_of_integer: BTreeSet<i32>,
    pub list_of_integer: Vec<i32>,
    pub map_of_integer: BTreeMap<String, i32>,
    pub set_of_enum: BTreeSet<Condition>,
    pub list_of_enum: Vec<Condition>,
    pub set_of_inet: BTreeSet<IpAddr>,
    pub list_of_date: Vec<NaiveDate>,
    pub list_of_timestamp: Vec<DateTime<Utc>>,
    pub map_of_uuid: BTreeMap<Uuid, String>,
}

impl AllPossibleTypes {
    /// An entity with only its key set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

fn by_id(name: &str, template: &str, shape: ReturnShape) -> QueryMethod {
    QueryMethod::new(name, template, shape).param(CqlType::Text)
}

/// Query methods of the `allpossibletypes` repository
pub fn query_methods() -> Vec<QueryMethod> {
    use ReturnShape::*;

    vec![
        by_id(
            "find_one_by_id",
            "select * from allpossibletypes where id = ?0",
            Entity,
        ),
        by_id(
            "find_optional_by_id",
            "select * from allpossibletypes where id = ?0",
            OptionalEntity,
        ),
        by_id(
            "find_many_by_id",
            "select * from allpossibletypes where id = ?0",
            Entities,
        ),
        by_id(
            "find_inet_address_by_id",
            "select inet from allpossibletypes where id = ?0",
            Scalar(TargetType::Inet),
        ),
        by_id(
            "find_optional_inet_by_id",
            "select inet from allpossibletypes where id = ?0",
            OptionalScalar(TargetType::Inet),
        ),
        by_id(
            "find_boxed_byte_by_id",
            "select boxedByte from allpossibletypes where id = ?0",
            Nullable(TargetType::I8),
        ),
        by_id(
            "find_primitive_byte_by_id",
            "select primitiveByte from allpossibletypes where id = ?0",
            Scalar(TargetType::I8),
        ),
        by_id(
            "find_boxed_short_by_id",
            "select boxedShort from allpossibletypes where id = ?0",
            Nullable(TargetType::I16),
        ),
        by_id(
            "find_boxed_long_by_id",
            "select boxedLong from allpossibletypes where id = ?0",
            Nullable(TargetType::I64),
        ),
        by_id(
            "find_boxed_integer_by_id",
            "select boxedInteger from allpossibletypes where id = ?0",
            Nullable(TargetType::I32),
        ),
        by_id(
            "find_double_from_integer_by_id",
            "select boxedInteger from allpossibletypes where id = ?0",
            Nullable(TargetType::F64),
        ),
        by_id(
            "find_long_from_byte_by_id",
            "select primitiveByte from allpossibletypes where id = ?0",
            Scalar(TargetType::I64),
        ),
        by_id(
            "find_boxed_double_by_id",
            "select boxedDouble from allpossibletypes where id = ?0",
            Nullable(TargetType::F64),
        ),
        by_id(
            "find_double_from_float_by_id",
            "select primitiveFloat from allpossibletypes where id = ?0",
            Scalar(TargetType::F64),
        ),
        by_id(
            "find_boxed_boolean_by_id",
            "select boxedBoolean from allpossibletypes where id = ?0",
            Nullable(TargetType::Bool),
        ),
        by_id(
            "find_local_date_by_id",
            "select date from allpossibletypes where id = ?0",
            Scalar(TargetType::Date),
        ),
        by_id(
            "find_timestamp_by_id",
            "select timestamp from allpossibletypes where id = ?0",
            Scalar(TargetType::Timestamp),
        ),
        by_id(
            "find_local_time_by_id",
            "select localTime from allpossibletypes where id = ?0",
            Nullable(TargetType::Time),
        ),
        by_id(
            "find_big_decimal_by_id",
            "select bigDecimal from allpossibletypes where id = ?0",
            Scalar(TargetType::Decimal),
        ),
        by_id(
            "find_big_integer_by_id",
            "select bigInteger from allpossibletypes where id = ?0",
            Scalar(TargetType::Varint),
        ),
        by_id(
            "find_decimal_from_big_integer_by_id",
            "select bigInteger from allpossibletypes where id = ?0",
            Scalar(TargetType::Decimal),
        ),
        by_id(
            "find_uuid_by_id",
            "select uuid from allpossibletypes where id = ?0",
            OptionalScalar(TargetType::Uuid),
        ),
        by_id(
            "find_ascii_by_id",
            "select ascii from allpossibletypes where id = ?0",
            Nullable(TargetType::Text),
        ),
        by_id(
            "find_blob_by_id",
            "select blob from allpossibletypes where id = ?0",
            Nullable(TargetType::Bytes),
        ),
        by_id(
            "find_enum_by_id",
            "select anEnum from allpossibletypes where id = ?0",
            Nullable(TargetType::Text),
        ),
        by_id(
            "find_entity_as_map_by_id",
            "select * from allpossibletypes where id = ?0",
            RowMap,
        ),
        QueryMethod::new(
            "find_by_primitive_integer",
            "select * from allpossibletypes where primitiveInteger = ?0",
            Entities,
        )
        .param(CqlType::Int),
        QueryMethod::new(
            "find_one_by_primitive_integer",
            "select * from allpossibletypes where primitiveInteger = ?0",
            Entity,
        )
        .param(CqlType::Int),
    ]
}

impl_entity! {
    AllPossibleTypes, table = "AllPossibleTypes",
    key id: String => CqlType::Text,
    columns {
        inet: Option<IpAddr> => CqlType::Inet,
        uuid: Option<Uuid> => CqlType::Uuid,
        #[column("timeUuid")] time_uuid: Option<Uuid> => CqlType::TimeUuid,

        #[column("boxedByte")] boxed_byte: Option<i8> => CqlType::TinyInt,
        #[column("primitiveByte")] primitive_byte: i8 => CqlType::TinyInt,
        #[column("boxedShort")] boxed_short: Option<i16> => CqlType::SmallInt,
        #[column("primitiveShort")] primitive_short: i16 => CqlType::SmallInt,
        #[column("boxedInteger")] boxed_integer: Option<i32> => CqlType::Int,
        #[column("primitiveInteger")] primitive_integer: i32 => CqlType::Int,
        #[column("boxedLong")] boxed_long: Option<i64> => CqlType::BigInt,
        #[column("primitiveLong")] primitive_long: i64 => CqlType::BigInt,
        #[column("boxedFloat")] boxed_float: Option<f32> => CqlType::Float,
        #[column("primitiveFloat")] primitive_float: f32 => CqlType::Float,
        #[column("boxedDouble")] boxed_double: Option<f64> => CqlType::Double,
        #[column("primitiveDouble")] primitive_double: f64 => CqlType::Double,
        #[column("boxedBoolean")] boxed_boolean: Option<bool> => CqlType::Boolean,
        #[column("primitiveBoolean")] primitive_boolean: bool => CqlType::Boolean,

        #[column("bigInteger")] big_integer: Option<BigInt> => CqlType::Varint,
        #[column("bigDecimal")] big_decimal: Option<Decimal> => CqlType::Decimal,

        date: Option<NaiveDate> => CqlType::Date,
        #[column("localDate")] local_date: Option<NaiveDate> => CqlType::Date,
        timestamp: Option<DateTime<Utc>> => CqlType::Timestamp,
        instant: Option<DateTime<Utc>> => CqlType::Timestamp,
        #[column("localDateTime")] local_date_time: Option<DateTime<Utc>> => CqlType::Timestamp,
        #[column("localTime")] local_time: Option<NaiveTime> => CqlType::Time,
        time: Option<NaiveTime> => CqlType::Time,

        text: Option<String> => CqlType::Text,
        ascii: Option<String> => CqlType::Ascii,
        blob: Option<Bytes> => CqlType::Blob,
        #[column("anEnum")] an_enum: Option<Condition> => CqlType::Text,

        #[column("setOfString")] set_of_string: BTreeSet<String> => CqlType::set(CqlType::Text),
        #[column("listOfString")] list_of_string: Vec<String> => CqlType::list(CqlType::Text),
        #[column("mapOfString")] map_of_string: BTreeMap<String, String>
            => CqlType::map(CqlType::Text, CqlType::Text),
        #[column("setOfInteger")] set_of_integer: BTreeSet<i32> => CqlType::set(CqlType::Int),
        #[column("listOfInteger")] list_of_integer: Vec<i32> => CqlType::list(CqlType::Int),
        #[column("mapOfInteger")] map_of_integer: BTreeMap<String, i32>
            => CqlType::map(CqlType::Text, CqlType::Int),
        #[column("setOfEnum")] set_of_enum: BTreeSet<Condition> => CqlType::set(CqlType::Text),
        #[column("listOfEnum")] list_of_enum: Vec<Condition> => CqlType::list(CqlType::Text),
        #[column("setOfInet")] set_of_inet: BTreeSet<IpAddr> => CqlType::set(CqlType::Inet),
        #[column("listOfDate")] list_of_date: Vec<NaiveDate> => CqlType::list(CqlType::Date),
        #[column("listOfTimestamp")] list_of_timestamp: Vec<DateTime<Utc>>
            => CqlType::list(CqlType::Timestamp),
        #[column("mapOfUuid")] map_of_uuid: BTreeMap<Uuid, String>
            => CqlType::map(CqlType::Uuid, CqlType::Text),
    },
    methods = query_methods()
}
