//! Query method registry
//!
//! Repository methods are declared up front as [`QueryMethod`]s: a name,
//! a `SELECT` template, the CQL types of its arguments and the shape the
//! result is projected into. [`QueryRegistry::builder`] compiles every
//! declaration against the entity's [`TableSchema`] when the repository
//! opens, so a template that names a missing column or asks for a
//! conversion the projection layer does not support fails at start-up
//! instead of on first call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::codec::check_value;
use crate::convert::TargetType;
use crate::error::{Error, Result};
use crate::query::result::ColumnSpec;
use crate::query::template::{BoundSelect, SelectTemplate, Selection};
use crate::schema::{CqlType, TableSchema};
use crate::types::Value;

/// Result shape of a query method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// Exactly one entity
    Entity,
    /// At most one entity
    OptionalEntity,
    /// Any number of entities, in store order
    Entities,
    /// One non-null column of one row
    Scalar(TargetType),
    /// One column of one row; a null column reads as `None`
    Nullable(TargetType),
    /// One column of at most one row; `None` when no row matches
    OptionalScalar(TargetType),
    /// One row as a column name → value map
    RowMap,
}

impl ReturnShape {
    /// Check if the shape materialises whole entities
    pub fn is_entity(&self) -> bool {
        matches!(
            self,
            ReturnShape::Entity | ReturnShape::OptionalEntity | ReturnShape::Entities
        )
    }

    /// Scalar target, for the three scalar shapes
    pub fn target(&self) -> Option<TargetType> {
        match self {
            ReturnShape::Scalar(t) | ReturnShape::Nullable(t) | ReturnShape::OptionalScalar(t) => {
                Some(*t)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnShape::Entity => write!(f, "entity"),
            ReturnShape::OptionalEntity => write!(f, "optional entity"),
            ReturnShape::Entities => write!(f, "entity list"),
            ReturnShape::Scalar(t) => write!(f, "{}", t),
            ReturnShape::Nullable(t) => write!(f, "nullable {}", t),
            ReturnShape::OptionalScalar(t) => write!(f, "optional {}", t),
            ReturnShape::RowMap => write!(f, "row map"),
        }
    }
}

/// Declaration of a repository query method
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMethod {
    pub name: String,
    pub template: String,
    pub shape: ReturnShape,
    pub parameters: Vec<CqlType>,
}

impl QueryMethod {
    /// Declare a method with no parameters yet
    pub fn new(name: impl Into<String>, template: impl Into<String>, shape: ReturnShape) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            shape,
            parameters: Vec::new(),
        }
    }

    /// Append a parameter of the given CQL type
    pub fn param(mut self, cql_type: CqlType) -> Self {
        self.parameters.push(cql_type);
        self
    }
}

/// A query method checked against its table
#[derive(Debug, Clone)]
pub struct CompiledMethod {
    name: String,
    table: String,
    shape: ReturnShape,
    parameters: Vec<CqlType>,
    template: SelectTemplate,
    columns: Vec<ColumnSpec>,
}

impl CompiledMethod {
    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared result shape
    pub fn shape(&self) -> ReturnShape {
        self.shape
    }

    /// Declared parameter types
    pub fn parameters(&self) -> &[CqlType] {
        &self.parameters
    }

    /// Parsed template
    pub fn template(&self) -> &SelectTemplate {
        &self.template
    }

    /// Columns the method returns, in select order
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Check arguments against the declared parameters and bind them
    pub fn bind(&self, args: &[Value]) -> Result<BoundSelect> {
        if args.len() != self.parameters.len() {
            return Err(Error::query(format!(
                "Method '{}' takes {} arguments, got {}",
                self.name,
                self.parameters.len(),
                args.len()
            )));
        }

        for (i, (arg, cql_type)) in args.iter().zip(&self.parameters).enumerate() {
            if arg.is_null() {
                return Err(Error::query(format!(
                    "Method '{}' argument {} cannot be null",
                    self.name, i
                )));
            }
            check_value(arg, cql_type).map_err(|e| {
                Error::query(format!(
                    "Method '{}' argument {} does not fit {}: {}",
                    self.name, i, cql_type, e
                ))
            })?;
        }

        let mut bound = self.template.bind(args)?;
        bound.table.clone_from(&self.table);
        Ok(bound)
    }
}

/// Compiled query methods of one entity
#[derive(Debug, Clone)]
pub struct QueryRegistry {
    schema: Arc<TableSchema>,
    methods: HashMap<String, Arc<CompiledMethod>>,
}

impl QueryRegistry {
    /// Start building a registry for the given table
    pub fn builder(schema: Arc<TableSchema>) -> QueryRegistryBuilder {
        QueryRegistryBuilder {
            schema,
            methods: Vec::new(),
        }
    }

    /// Look up a compiled method
    pub fn get(&self, name: &str) -> Result<Arc<CompiledMethod>> {
        self.methods.get(name).cloned().ok_or_else(|| {
            Error::query(format!(
                "No query method '{}' registered for table '{}'",
                name, self.schema.table
            ))
        })
    }

    /// Check if a method is registered
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Number of registered methods
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Check if no methods are registered
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Registered method names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The table the methods query
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }
}

/// Builder for [`QueryRegistry`]
#[derive(Debug)]
pub struct QueryRegistryBuilder {
    schema: Arc<TableSchema>,
    methods: Vec<QueryMethod>,
}

impl QueryRegistryBuilder {
    /// Add one method
    pub fn method(mut self, method: QueryMethod) -> Self {
        self.methods.push(method);
        self
    }

    /// Add several methods
    pub fn methods(mut self, methods: impl IntoIterator<Item = QueryMethod>) -> Self {
        self.methods.extend(methods);
        self
    }

    /// Compile every method, failing on the first invalid declaration
    pub fn build(self) -> Result<QueryRegistry> {
        let mut methods = HashMap::with_capacity(self.methods.len());
        for method in self.methods {
            if methods.contains_key(&method.name) {
                return Err(Error::query(format!(
                    "Duplicate query method '{}'",
                    method.name
                )));
            }
            let compiled = compile(&self.schema, method)?;
            debug!(
                method = %compiled.name,
                shape = %compiled.shape,
                table = %self.schema.qualified_name(),
                "registered query method"
            );
            methods.insert(compiled.name.clone(), Arc::new(compiled));
        }

        Ok(QueryRegistry {
            schema: self.schema,
            methods,
        })
    }
}

fn compile(schema: &TableSchema, method: QueryMethod) -> Result<CompiledMethod> {
    let name = method.name;
    let template = SelectTemplate::parse(&method.template)
        .map_err(|e| Error::query_parse(format!("Method '{}': {}", name, e)))?;

    if template.table != schema.table {
        return Err(Error::query(format!(
            "Method '{}' queries table '{}' but the entity maps to '{}'",
            name, template.table, schema.table
        )));
    }
    if template.keyspace.is_some() && template.keyspace != schema.keyspace {
        return Err(Error::query(format!(
            "Method '{}' queries keyspace '{}' but the entity maps to '{}'",
            name,
            template.keyspace.as_deref().unwrap_or_default(),
            schema.keyspace.as_deref().unwrap_or("<none>")
        )));
    }

    let lookup = |column: &str| {
        schema.column(column).ok_or_else(|| {
            Error::query(format!(
                "Method '{}' references unknown column '{}' of table '{}'",
                name, column, schema.table
            ))
        })
    };

    if template.marker_count() != method.parameters.len() {
        return Err(Error::query(format!(
            "Method '{}' declares {} parameters but its template binds {}",
            name,
            method.parameters.len(),
            template.marker_count()
        )));
    }
    let mut used = vec![false; method.parameters.len()];
    for predicate in &template.predicates {
        let column = lookup(&predicate.column)?;
        let declared = &method.parameters[predicate.marker];
        if declared.unfrozen() != column.cql_type.unfrozen() {
            return Err(Error::query(format!(
                "Method '{}' parameter {} is {} but column '{}' is {}",
                name, predicate.marker, declared, column.name, column.cql_type
            )));
        }
        used[predicate.marker] = true;
    }
    if let Some(unused) = used.iter().position(|u| !u) {
        return Err(Error::query(format!(
            "Method '{}' parameter {} is never bound",
            name, unused
        )));
    }

    let columns: Vec<ColumnSpec> = match &template.selection {
        Selection::All => schema
            .columns
            .iter()
            .map(|c| ColumnSpec::new(c.name.clone(), c.cql_type.clone()))
            .collect(),
        Selection::Columns(names) => names
            .iter()
            .map(|n| lookup(n).map(|c| ColumnSpec::new(c.name.clone(), c.cql_type.clone())))
            .collect::<Result<_>>()?,
    };

    if method.shape.is_entity() && template.selection != Selection::All {
        return Err(Error::mapping(format!(
            "Method '{}' returns {} and must select every column",
            name, method.shape
        )));
    }

    if let Some(target) = method.shape.target() {
        let column = match columns.as_slice() {
            [column] if template.selection != Selection::All => column,
            _ => {
                return Err(Error::mapping(format!(
                    "Method '{}' returns {} and must select exactly one column",
                    name, method.shape
                )))
            }
        };
        if column.cql_type.is_collection() {
            return Err(Error::unsupported_conversion(format!(
                "Method '{}': collection column '{}' ({}) cannot be read as a scalar",
                name, column.name, column.cql_type
            )));
        }
        if !target.accepts(&column.cql_type) {
            return Err(Error::unsupported_conversion(format!(
                "Method '{}': column '{}' ({}) cannot be read as {}",
                name, column.name, column.cql_type, target
            )));
        }
    }

    Ok(CompiledMethod {
        name,
        table: schema.qualified_name(),
        shape: method.shape,
        parameters: method.parameters,
        template,
        columns,
    })
}
