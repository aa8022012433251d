//! `SELECT` templates with positional bind markers
//!
//! A template is the query text a repository method is declared with:
//!
//! ```text
//! SELECT (* | col [, col]*) FROM [keyspace.]table
//!     [WHERE col = ?N [AND col = ?N]*] [LIMIT n] [;]
//! ```
//!
//! Markers are either all indexed (`?0`, `?1`, zero-based) or all bare
//! (`?`, numbered in order of appearance).

use nom::{
    branch::alt,
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_res, opt},
    multi::separated_list1,
    sequence::{preceded, tuple},
    IResult,
};
use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};
use crate::schema::cql_parser::{identifier, keyword, qualified_table_name, symbol, ws, ws1};
use crate::types::Value;

/// Column list of a `SELECT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// `SELECT *`
    All,
    /// Explicit column names, in select order
    Columns(Vec<String>),
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "*"),
            Selection::Columns(columns) => write!(f, "{}", columns.join(", ")),
        }
    }
}

/// `column = ?N` restriction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// Restricted column
    pub column: String,
    /// Zero-based index of the bound argument
    pub marker: usize,
}

/// Parsed query template
#[derive(Debug, Clone, PartialEq)]
pub struct SelectTemplate {
    pub keyspace: Option<String>,
    pub table: String,
    pub selection: Selection,
    pub predicates: Vec<Predicate>,
    pub limit: Option<u64>,
}

/// A template with its arguments substituted, ready for a [`RowStore`]
///
/// [`RowStore`]: crate::storage::RowStore
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSelect {
    pub table: String,
    pub selection: Selection,
    pub predicates: Vec<(String, Value)>,
    pub limit: Option<u64>,
}

impl BoundSelect {
    /// `SELECT * FROM table`
    pub fn all(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            selection: Selection::All,
            predicates: Vec::new(),
            limit: None,
        }
    }

    /// Add a `column = value` restriction
    pub fn with_predicate(mut self, column: impl Into<String>, value: Value) -> Self {
        self.predicates.push((column.into(), value));
        self
    }

    /// Set the selected columns
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Cap the number of returned rows, keeping any tighter existing cap
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(self.limit.map_or(limit, |current| current.min(limit)));
        self
    }
}

impl fmt::Display for BoundSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {} FROM {}", self.selection, self.table)?;
        for (i, (column, value)) in self.predicates.iter().enumerate() {
            let joiner = if i == 0 { "WHERE" } else { "AND" };
            write!(f, " {} {} = {}", joiner, column, value)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}

fn selection(input: &str) -> IResult<&str, Selection> {
    alt((
        map(char('*'), |_| Selection::All),
        map(separated_list1(symbol(','), identifier), Selection::Columns),
    ))(input)
}

fn marker(input: &str) -> IResult<&str, Option<usize>> {
    preceded(char('?'), opt(map_res(digit1, str::parse::<usize>)))(input)
}

fn predicate(input: &str) -> IResult<&str, (String, Option<usize>)> {
    map(tuple((identifier, symbol('='), marker)), |(column, _, index)| {
        (column, index)
    })(input)
}

fn where_clause(input: &str) -> IResult<&str, Vec<(String, Option<usize>)>> {
    preceded(
        tuple((ws1, keyword("where"), ws1)),
        separated_list1(tuple((ws1, keyword("and"), ws1)), predicate),
    )(input)
}

fn limit_clause(input: &str) -> IResult<&str, u64> {
    preceded(
        tuple((ws1, keyword("limit"), ws1)),
        map_res(digit1, str::parse::<u64>),
    )(input)
}

type RawSelect = (
    Selection,
    (Option<String>, String),
    Option<Vec<(String, Option<usize>)>>,
    Option<u64>,
);

fn select_statement(input: &str) -> IResult<&str, RawSelect> {
    map(
        tuple((
            ws,
            keyword("select"),
            ws1,
            selection,
            ws1,
            keyword("from"),
            ws1,
            qualified_table_name,
            opt(where_clause),
            opt(limit_clause),
            ws,
            opt(char(';')),
            ws,
        )),
        |(_, _, _, selection, _, _, _, table, predicates, limit, _, _, _)| {
            (selection, table, predicates, limit)
        },
    )(input)
}

impl SelectTemplate {
    /// Parse and check a template
    pub fn parse(text: &str) -> Result<Self> {
        let (_, (selection, (keyspace, table), raw_predicates, limit)) =
            all_consuming(select_statement)(text).map_err(|_| {
                Error::query_parse(format!("Invalid SELECT template: '{}'", text.trim()))
            })?;

        if limit == Some(0) {
            return Err(Error::query_parse(format!(
                "LIMIT must be positive in '{}'",
                text.trim()
            )));
        }

        let raw_predicates = raw_predicates.unwrap_or_default();
        let indexed = raw_predicates.iter().filter(|(_, m)| m.is_some()).count();
        if indexed != 0 && indexed != raw_predicates.len() {
            return Err(Error::query_parse(format!(
                "Template mixes indexed and bare bind markers: '{}'",
                text.trim()
            )));
        }

        // markers index the bound arguments, of which there are at most one per predicate
        let count = raw_predicates.len();
        if let Some(index) = raw_predicates
            .iter()
            .filter_map(|(_, m)| *m)
            .find(|index| *index >= count)
        {
            return Err(Error::query_parse(format!(
                "Bind marker ?{} is out of range for {} predicates in '{}'",
                index,
                count,
                text.trim()
            )));
        }

        let mut seen = HashSet::new();
        let mut predicates = Vec::with_capacity(count);
        for (position, (column, index)) in raw_predicates.into_iter().enumerate() {
            if !seen.insert(column.clone()) {
                return Err(Error::query_parse(format!(
                    "Column '{}' is restricted more than once",
                    column
                )));
            }
            predicates.push(Predicate {
                column,
                marker: index.unwrap_or(position),
            });
        }

        if let Selection::Columns(columns) = &selection {
            let mut seen = HashSet::new();
            if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
                return Err(Error::query_parse(format!(
                    "Column '{}' is selected more than once",
                    dup
                )));
            }
        }

        Ok(Self {
            keyspace,
            table,
            selection,
            predicates,
            limit,
        })
    }

    /// Number of arguments the template binds
    ///
    /// Indexed markers may repeat an index, so this is one past the
    /// highest index rather than the number of predicates.
    pub fn marker_count(&self) -> usize {
        self.predicates
            .iter()
            .map(|p| p.marker + 1)
            .max()
            .unwrap_or(0)
    }

    /// Substitute arguments for the bind markers
    pub fn bind(&self, args: &[Value]) -> Result<BoundSelect> {
        if args.len() != self.marker_count() {
            return Err(Error::query(format!(
                "Template on '{}' binds {} arguments, got {}",
                self.table,
                self.marker_count(),
                args.len()
            )));
        }

        let predicates = self
            .predicates
            .iter()
            .map(|p| (p.column.clone(), args[p.marker].clone()))
            .collect();

        Ok(BoundSelect {
            table: self.table.clone(),
            selection: self.selection.clone(),
            predicates,
            limit: self.limit,
        })
    }
}
