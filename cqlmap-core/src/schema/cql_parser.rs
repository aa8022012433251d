//! CQL lexical helpers and type grammar
//!
//! Shared nom building blocks for the CQL fragments this crate reads:
//! column type names (`map<text, frozen<list<int>>>`) and the identifiers
//! used by query templates.

use crate::error::{Error, Result};
use crate::schema::CqlType;
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::char,
    combinator::{all_consuming, map, opt},
    sequence::{delimited, preceded, separated_pair},
    IResult,
};

/// CQL keyword parser - case insensitive
pub(crate) fn keyword(s: &str) -> impl Fn(&str) -> IResult<&str, &str> + '_ {
    move |input| tag_no_case(s)(input)
}

/// Parse optional whitespace
pub(crate) fn ws(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_whitespace())(input)
}

/// Parse mandatory whitespace
pub(crate) fn ws1(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_whitespace())(input)
}

/// Parse a single punctuation character surrounded by optional whitespace
pub(crate) fn symbol(c: char) -> impl Fn(&str) -> IResult<&str, char> {
    move |input| delimited(ws, char(c), ws)(input)
}

/// Parse identifier (table name, column name, etc.)
///
/// Unquoted identifiers are case-insensitive in CQL and fold to lower
/// case; double-quoted identifiers keep their exact spelling.
pub(crate) fn identifier(input: &str) -> IResult<&str, String> {
    alt((
        map(
            delimited(char('"'), take_while1(|c: char| c != '"'), char('"')),
            |name: &str| name.to_string(),
        ),
        map(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            |name: &str| name.to_ascii_lowercase(),
        ),
    ))(input)
}

/// Parse a qualified table name (keyspace.table or just table)
pub(crate) fn qualified_table_name(input: &str) -> IResult<&str, (Option<String>, String)> {
    let (input, first) = identifier(input)?;
    let (input, second) = opt(preceded(char('.'), identifier))(input)?;

    match second {
        Some(table) => Ok((input, (Some(first), table))),
        None => Ok((input, (None, first))),
    }
}

/// Parse a CQL data type
pub(crate) fn cql_type(input: &str) -> IResult<&str, CqlType> {
    let (rest, name) = take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)?;

    match name.to_ascii_lowercase().as_str() {
        "list" => map(delimited(symbol('<'), cql_type, symbol('>')), |inner| {
            CqlType::List(Box::new(inner))
        })(rest),
        "set" => map(delimited(symbol('<'), cql_type, symbol('>')), |inner| {
            CqlType::Set(Box::new(inner))
        })(rest),
        "frozen" => map(delimited(symbol('<'), cql_type, symbol('>')), |inner| {
            CqlType::Frozen(Box::new(inner))
        })(rest),
        "map" => map(
            delimited(
                symbol('<'),
                separated_pair(cql_type, symbol(','), cql_type),
                symbol('>'),
            ),
            |(key, value)| CqlType::Map(Box::new(key), Box::new(value)),
        )(rest),
        other => match primitive_type(other) {
            Some(ty) => Ok((rest, ty)),
            None => Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            ))),
        },
    }
}

fn primitive_type(name: &str) -> Option<CqlType> {
    let ty = match name {
        "boolean" => CqlType::Boolean,
        "tinyint" => CqlType::TinyInt,
        "smallint" => CqlType::SmallInt,
        "int" => CqlType::Int,
        "bigint" => CqlType::BigInt,
        "counter" => CqlType::Counter,
        "float" => CqlType::Float,
        "double" => CqlType::Double,
        "varint" => CqlType::Varint,
        "decimal" => CqlType::Decimal,
        "text" | "varchar" => CqlType::Text,
        "ascii" => CqlType::Ascii,
        "blob" => CqlType::Blob,
        "uuid" => CqlType::Uuid,
        "timeuuid" => CqlType::TimeUuid,
        "inet" => CqlType::Inet,
        "date" => CqlType::Date,
        "time" => CqlType::Time,
        "timestamp" => CqlType::Timestamp,
        _ => return None,
    };
    Some(ty)
}

/// Parse a complete CQL type expression such as `map<text, int>`
pub fn parse_cql_type(input: &str) -> Result<CqlType> {
    match all_consuming(delimited(ws, cql_type, ws))(input) {
        Ok((_, ty)) => Ok(ty),
        Err(_) => Err(Error::schema(format!("Invalid CQL type: '{}'", input.trim()))),
    }
}
