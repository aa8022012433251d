//! Core data types for CQLMap

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use num_bigint::BigInt;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// A single CQL cell value
///
/// Each variant is the identity representation of one CQL type family.
/// `text`, `varchar` and `ascii` share [`Value::Text`]; `uuid` and
/// `timeuuid` share [`Value::Uuid`]; `bigint` and `counter` share
/// [`Value::BigInt`]. The column type decides the finer distinction.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 8-bit signed integer (`tinyint`)
    TinyInt(i8),
    /// 16-bit signed integer (`smallint`)
    SmallInt(i16),
    /// 32-bit signed integer (`int`)
    Int(i32),
    /// 64-bit signed integer (`bigint`, `counter`)
    BigInt(i64),
    /// 32-bit floating point (`float`)
    Float(f32),
    /// 64-bit floating point (`double`)
    Double(f64),
    /// Arbitrary-precision integer (`varint`)
    Varint(BigInt),
    /// Arbitrary-precision decimal (`decimal`)
    Decimal(Decimal),
    /// UTF-8 string (`text`, `varchar`, `ascii`)
    Text(String),
    /// Binary data (`blob`)
    Blob(Vec<u8>),
    /// UUID (`uuid`, `timeuuid`)
    Uuid(Uuid),
    /// Network address (`inet`)
    Inet(IpAddr),
    /// Calendar date as days since 1970-01-01 (`date`)
    Date(i32),
    /// Nanoseconds since midnight (`time`)
    Time(i64),
    /// Milliseconds since the Unix epoch (`timestamp`)
    Timestamp(i64),
    /// Ordered list of values
    List(Vec<Value>),
    /// Set of values, kept in insertion order
    Set(Vec<Value>),
    /// Map of key-value pairs, kept in insertion order
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::TinyInt(_) => "tinyint",
            Value::SmallInt(_) => "smallint",
            Value::Int(_) => "int",
            Value::BigInt(_) => "bigint",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Varint(_) => "varint",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Uuid(_) => "uuid",
            Value::Inet(_) => "inet",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
        }
    }

    /// Try to borrow this value as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert this value to a big integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::BigInt(i) => Some(*i),
            Value::Int(i) => Some(i64::from(*i)),
            Value::SmallInt(i) => Some(i64::from(*i)),
            Value::TinyInt(i) => Some(i64::from(*i)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::TinyInt(i) => write!(f, "{}", i),
            Value::SmallInt(i) => write!(f, "{}", i),
            Value::Int(i) => write!(f, "{}", i),
            Value::BigInt(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Double(fl) => write!(f, "{}", fl),
            Value::Varint(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Blob(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Inet(ip) => write!(f, "'{}'", ip),
            Value::Date(days) => match date_from_days(*days) {
                Ok(date) => write!(f, "'{}'", date),
                Err(_) => write!(f, "DATE({})", days),
            },
            Value::Time(nanos) => match time_from_nanos(*nanos) {
                Ok(time) => write!(f, "'{}'", time),
                Err(_) => write!(f, "TIME({})", nanos),
            },
            Value::Timestamp(ms) => match timestamp_from_millis(*ms) {
                Ok(ts) => write!(f, "'{}'", ts.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
                Err(_) => write!(f, "TIMESTAMP({})", ms),
            },
            Value::List(list) => {
                write!(f, "[")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Set(set) => {
                write!(f, "{{")?;
                for (i, item) in set.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::BigInt(i)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

/// Arbitrary-precision decimal: `unscaled * 10^-scale`
///
/// Equality is structural, so `1.0` and `1.00` are different values, the
/// same way the CQL `decimal` type stores them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: BigInt,
    scale: i32,
}

impl Decimal {
    /// Create a decimal from its unscaled value and scale
    pub fn new(unscaled: impl Into<BigInt>, scale: i32) -> Self {
        Self {
            unscaled: unscaled.into(),
            scale,
        }
    }

    /// The decimal `1` with scale 0
    pub fn one() -> Self {
        Self::new(1, 0)
    }

    /// Unscaled integer value
    pub fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    /// Number of digits to the right of the decimal point
    pub fn scale(&self) -> i32 {
        self.scale
    }
}

impl From<BigInt> for Decimal {
    fn from(unscaled: BigInt) -> Self {
        Self::new(unscaled, 0)
    }
}

impl From<i64> for Decimal {
    fn from(unscaled: i64) -> Self {
        Self::new(unscaled, 0)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale <= 0 {
            write!(f, "{}", self.unscaled)?;
            for _ in 0..self.scale.unsigned_abs() {
                write!(f, "0")?;
            }
            return Ok(());
        }

        let digits = self.unscaled.magnitude().to_string();
        let scale = self.scale as usize;
        let sign = if self.unscaled.sign() == num_bigint::Sign::Minus {
            "-"
        } else {
            ""
        };

        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{}{}.{}", sign, int_part, frac_part)
        } else {
            write!(f, "{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        }
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::type_conversion(format!("invalid decimal '{}'", s));

        // [+-]?digits(.digits)?
        let (negative, unsigned) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) if !frac_part.is_empty() => (int_part, frac_part),
            Some(_) => return Err(invalid()),
            None => (unsigned, ""),
        };
        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if int_part.is_empty() || !is_digits(int_part) || !is_digits(frac_part) {
            return Err(invalid());
        }

        let scale = i32::try_from(frac_part.len())
            .map_err(|_| Error::type_conversion(format!("decimal scale too large in '{}'", s)))?;
        let digits = format!("{}{}", int_part, frac_part);
        let magnitude = BigInt::from_str(&digits).map_err(|_| invalid())?;
        let unscaled = if negative { -magnitude } else { magnitude };

        Ok(Self::new(unscaled, scale))
    }
}

// 1970-01-01 counted from 0001-01-01 (proleptic Gregorian, day 1)
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Nanoseconds in one day, the exclusive upper bound of a `time` value
pub const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SECOND;

/// Convert days since the Unix epoch to a calendar date
pub fn date_from_days(days: i32) -> Result<NaiveDate> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| Error::type_conversion(format!("date out of range: {} days", days)))
}

/// Convert a calendar date to days since the Unix epoch
pub fn days_from_date(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Convert nanoseconds since midnight to a time of day
pub fn time_from_nanos(nanos: i64) -> Result<NaiveTime> {
    if !(0..NANOS_PER_DAY).contains(&nanos) {
        return Err(Error::type_conversion(format!(
            "time out of range: {} ns",
            nanos
        )));
    }
    let secs = (nanos / NANOS_PER_SECOND) as u32;
    let subsec = (nanos % NANOS_PER_SECOND) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, subsec)
        .ok_or_else(|| Error::type_conversion(format!("time out of range: {} ns", nanos)))
}

/// Convert a time of day to nanoseconds since midnight
///
/// Leap-second representations are folded into the last second of the day.
pub fn nanos_from_time(time: NaiveTime) -> i64 {
    let subsec = i64::from(time.nanosecond()).min(NANOS_PER_SECOND - 1);
    i64::from(time.num_seconds_from_midnight()) * NANOS_PER_SECOND + subsec
}

/// Convert milliseconds since the Unix epoch to a UTC timestamp
pub fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::type_conversion(format!("timestamp out of range: {} ms", millis)))
}

/// Convert a UTC timestamp to milliseconds since the Unix epoch
///
/// CQL timestamps carry millisecond precision; finer digits are dropped.
pub fn millis_from_timestamp(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}
