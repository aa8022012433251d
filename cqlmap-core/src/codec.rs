//! CQL value serialization
//!
//! Values are serialized the way the CQL native protocol (v4) lays them out
//! on the wire, and rows as a sequence of length-prefixed cells in schema
//! column order. A cell length of `-1` marks a null column.
//!
//! Encoding is strict: the value variant must match the column type. This
//! is the point where an entity field declared with the wrong Rust type is
//! caught before anything is persisted.

use bytes::{BufMut, Bytes, BytesMut};
use nom::{
    bytes::complete::take,
    combinator::all_consuming,
    multi::count,
    number::complete::{be_f32, be_f64, be_i16, be_i32, be_i64, be_i8, be_u32, be_u8},
    IResult,
};
use num_bigint::BigInt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::schema::{CqlType, TableSchema};
use crate::types::{Decimal, Value, NANOS_PER_DAY};

// `date` is an unsigned day count centred on the epoch
const DATE_EPOCH_OFFSET: u32 = 1 << 31;

/// Serialize a non-null value of the given column type
pub fn encode_value(value: &Value, cql_type: &CqlType, buf: &mut BytesMut) -> Result<()> {
    match (cql_type.unfrozen(), value) {
        (CqlType::Boolean, Value::Boolean(b)) => buf.put_u8(u8::from(*b)),
        (CqlType::TinyInt, Value::TinyInt(i)) => buf.put_i8(*i),
        (CqlType::SmallInt, Value::SmallInt(i)) => buf.put_i16(*i),
        (CqlType::Int, Value::Int(i)) => buf.put_i32(*i),
        (CqlType::BigInt | CqlType::Counter, Value::BigInt(i)) => buf.put_i64(*i),
        (CqlType::Float, Value::Float(f)) => buf.put_f32(*f),
        (CqlType::Double, Value::Double(f)) => buf.put_f64(*f),
        (CqlType::Varint, Value::Varint(i)) => buf.put_slice(&i.to_signed_bytes_be()),
        (CqlType::Decimal, Value::Decimal(d)) => {
            buf.put_i32(d.scale());
            buf.put_slice(&d.unscaled().to_signed_bytes_be());
        }
        (CqlType::Text, Value::Text(s)) => buf.put_slice(s.as_bytes()),
        (CqlType::Ascii, Value::Text(s)) => {
            if !s.is_ascii() {
                return Err(Error::type_conversion(format!(
                    "ascii column cannot hold non-ASCII text '{}'",
                    s
                )));
            }
            buf.put_slice(s.as_bytes());
        }
        (CqlType::Blob, Value::Blob(b)) => buf.put_slice(b),
        (CqlType::Uuid, Value::Uuid(u)) => buf.put_slice(u.as_bytes()),
        (CqlType::TimeUuid, Value::Uuid(u)) => {
            if u.get_version_num() != 1 {
                return Err(Error::type_conversion(format!(
                    "timeuuid column requires a version 1 UUID, got {}",
                    u
                )));
            }
            buf.put_slice(u.as_bytes());
        }
        (CqlType::Inet, Value::Inet(IpAddr::V4(ip))) => buf.put_slice(&ip.octets()),
        (CqlType::Inet, Value::Inet(IpAddr::V6(ip))) => buf.put_slice(&ip.octets()),
        (CqlType::Date, Value::Date(days)) => {
            buf.put_u32((*days as u32).wrapping_add(DATE_EPOCH_OFFSET))
        }
        (CqlType::Time, Value::Time(nanos)) => {
            if !(0..NANOS_PER_DAY).contains(nanos) {
                return Err(Error::type_conversion(format!(
                    "time value {} ns is outside a single day",
                    nanos
                )));
            }
            buf.put_i64(*nanos);
        }
        (CqlType::Timestamp, Value::Timestamp(ms)) => buf.put_i64(*ms),
        (CqlType::List(element), Value::List(items)) | (CqlType::Set(element), Value::Set(items)) => {
            put_count(buf, items.len())?;
            for item in items {
                encode_element(item, element, buf)?;
            }
        }
        (CqlType::Map(key_type, value_type), Value::Map(entries)) => {
            put_count(buf, entries.len())?;
            for (key, value) in entries {
                encode_element(key, key_type, buf)?;
                encode_element(value, value_type, buf)?;
            }
        }
        (ty, value) => {
            return Err(Error::type_conversion(format!(
                "cannot store {} value {} in {} column",
                value.type_name(),
                value,
                ty
            )))
        }
    }
    Ok(())
}

/// Serialize a cell: `[i32 length][bytes]`, or length `-1` for null
pub fn encode_cell(value: &Value, cql_type: &CqlType, buf: &mut BytesMut) -> Result<()> {
    if value.is_null() {
        buf.put_i32(-1);
        return Ok(());
    }

    let mut body = BytesMut::new();
    encode_value(value, cql_type, &mut body)?;
    put_count(buf, body.len())?;
    buf.put_slice(&body);
    Ok(())
}

fn encode_element(value: &Value, cql_type: &CqlType, buf: &mut BytesMut) -> Result<()> {
    if value.is_null() {
        return Err(Error::type_conversion(format!(
            "collections of {} cannot contain null elements",
            cql_type
        )));
    }
    encode_cell(value, cql_type, buf)
}

fn put_count(buf: &mut BytesMut, n: usize) -> Result<()> {
    let n = i32::try_from(n)
        .map_err(|_| Error::type_conversion(format!("length {} exceeds i32::MAX", n)))?;
    buf.put_i32(n);
    Ok(())
}

/// Check that a value can be stored in a column of the given type
pub fn check_value(value: &Value, cql_type: &CqlType) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }
    encode_value(value, cql_type, &mut BytesMut::new())
}

/// Serialize a full row in schema column order
pub fn encode_row(schema: &TableSchema, values: &[Value]) -> Result<Bytes> {
    if values.len() != schema.column_count() {
        return Err(Error::mapping(format!(
            "table '{}' has {} columns, got {} values",
            schema.table,
            schema.column_count(),
            values.len()
        )));
    }

    let mut buf = BytesMut::with_capacity(values.len() * 8);
    for (column, value) in schema.columns.iter().zip(values) {
        encode_cell(value, &column.cql_type, &mut buf).map_err(|e| match e {
            Error::TypeConversion(msg) => {
                Error::type_conversion(format!("column '{}': {}", column.name, msg))
            }
            other => other,
        })?;
    }
    Ok(buf.freeze())
}

/// Parse a cell header and body; `None` for a null cell
fn cell(input: &[u8]) -> IResult<&[u8], Option<&[u8]>> {
    let (input, len) = be_i32(input)?;
    if len < 0 {
        return Ok((input, None));
    }
    let (input, body) = take(len as usize)(input)?;
    Ok((input, Some(body)))
}

/// Parse `[i32 n]` followed by `n` cells
fn cells(input: &[u8], per_item: usize) -> IResult<&[u8], Vec<Option<&[u8]>>> {
    let (input, n) = be_i32(input)?;
    if n < 0 {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }
    count(cell, n as usize * per_item)(input)
}

fn fixed<'a, O, F>(input: &'a [u8], cql_type: &CqlType, parser: F) -> Result<O>
where
    F: FnMut(&'a [u8]) -> IResult<&'a [u8], O>,
{
    all_consuming(parser)(input)
        .map(|(_, out)| out)
        .map_err(|_| {
            Error::corruption(format!(
                "malformed {} value ({} bytes)",
                cql_type,
                input.len()
            ))
        })
}

fn element(body: Option<&[u8]>, cql_type: &CqlType) -> Result<Value> {
    match body {
        Some(bytes) => decode_value(bytes, cql_type),
        None => Err(Error::corruption(format!(
            "null element in collection of {}",
            cql_type
        ))),
    }
}

/// Deserialize the body of a non-null cell
pub fn decode_value(input: &[u8], cql_type: &CqlType) -> Result<Value> {
    let value = match cql_type.unfrozen() {
        CqlType::Boolean => Value::Boolean(fixed(input, cql_type, be_u8)? != 0),
        CqlType::TinyInt => Value::TinyInt(fixed(input, cql_type, be_i8)?),
        CqlType::SmallInt => Value::SmallInt(fixed(input, cql_type, be_i16)?),
        CqlType::Int => Value::Int(fixed(input, cql_type, be_i32)?),
        CqlType::BigInt | CqlType::Counter => Value::BigInt(fixed(input, cql_type, be_i64)?),
        CqlType::Float => Value::Float(fixed(input, cql_type, be_f32)?),
        CqlType::Double => Value::Double(fixed(input, cql_type, be_f64)?),
        CqlType::Varint => {
            if input.is_empty() {
                return Err(Error::corruption("empty varint value"));
            }
            Value::Varint(BigInt::from_signed_bytes_be(input))
        }
        CqlType::Decimal => {
            let (unscaled, scale) = be_i32::<_, nom::error::Error<&[u8]>>(input)
                .map_err(|_| Error::corruption("malformed decimal scale"))?;
            if unscaled.is_empty() {
                return Err(Error::corruption("empty decimal unscaled value"));
            }
            Value::Decimal(Decimal::new(BigInt::from_signed_bytes_be(unscaled), scale))
        }
        CqlType::Text | CqlType::Ascii => {
            let text = std::str::from_utf8(input)
                .map_err(|e| Error::corruption(format!("invalid UTF-8 in {} value: {}", cql_type, e)))?;
            Value::Text(text.to_string())
        }
        CqlType::Blob => Value::Blob(input.to_vec()),
        CqlType::Uuid | CqlType::TimeUuid => {
            let uuid = Uuid::from_slice(input)
                .map_err(|e| Error::corruption(format!("malformed uuid: {}", e)))?;
            Value::Uuid(uuid)
        }
        CqlType::Inet => match input.len() {
            4 => {
                let mut octets = [0u8; 4];
                octets.copy_from_slice(input);
                Value::Inet(IpAddr::V4(Ipv4Addr::from(octets)))
            }
            16 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(input);
                Value::Inet(IpAddr::V6(Ipv6Addr::from(octets)))
            }
            n => {
                return Err(Error::corruption(format!(
                    "inet value must be 4 or 16 bytes, got {}",
                    n
                )))
            }
        },
        CqlType::Date => {
            let raw = fixed(input, cql_type, be_u32)?;
            Value::Date(raw.wrapping_sub(DATE_EPOCH_OFFSET) as i32)
        }
        CqlType::Time => {
            let nanos = fixed(input, cql_type, be_i64)?;
            if !(0..NANOS_PER_DAY).contains(&nanos) {
                return Err(Error::corruption(format!("time value {} ns out of range", nanos)));
            }
            Value::Time(nanos)
        }
        CqlType::Timestamp => Value::Timestamp(fixed(input, cql_type, be_i64)?),
        CqlType::List(element_type) => {
            let bodies = fixed(input, cql_type, |i| cells(i, 1))?;
            let items = bodies
                .into_iter()
                .map(|body| element(body, element_type))
                .collect::<Result<Vec<_>>>()?;
            Value::List(items)
        }
        CqlType::Set(element_type) => {
            let bodies = fixed(input, cql_type, |i| cells(i, 1))?;
            let items = bodies
                .into_iter()
                .map(|body| element(body, element_type))
                .collect::<Result<Vec<_>>>()?;
            Value::Set(items)
        }
        CqlType::Map(key_type, value_type) => {
            let bodies = fixed(input, cql_type, |i| cells(i, 2))?;
            let mut entries = Vec::with_capacity(bodies.len() / 2);
            for pair in bodies.chunks(2) {
                entries.push((element(pair[0], key_type)?, element(pair[1], value_type)?));
            }
            Value::Map(entries)
        }
        CqlType::Frozen(_) => unreachable!("unfrozen() strips frozen wrappers"),
    };
    Ok(value)
}

/// Deserialize a full row against its schema
pub fn decode_row(schema: &TableSchema, input: &[u8]) -> Result<Vec<Value>> {
    let (_, bodies) = all_consuming(|i| count(cell, schema.column_count())(i))(input)
        .map_err(|_| {
            Error::corruption(format!(
                "row for table '{}' does not hold {} cells",
                schema.table,
                schema.column_count()
            ))
        })?;

    schema
        .columns
        .iter()
        .zip(bodies)
        .map(|(column, body)| match body {
            Some(bytes) => decode_value(bytes, &column.cql_type),
            None => Ok(Value::Null),
        })
        .collect()
}
