//! Error types for CQLMap

use std::fmt;
use thiserror::Error;

/// Result type alias for CQLMap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CQLMap operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No row matched a single-result query
    #[error("Not found: {0}")]
    NotFound(String),

    /// A null column was fetched into a non-nullable target
    #[error("Unexpected null: {0}")]
    UnexpectedNull(String),

    /// A single-result query produced more than one row
    #[error("Incorrect result size: expected {expected}, got {actual}")]
    IncorrectResultSize {
        /// Number of rows the projection accepts
        expected: usize,
        /// Number of rows the store returned
        actual: usize,
    },

    /// A value does not match the type it is read or written as
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// The requested column/target pairing is not supported
    #[error("Unsupported conversion: {0}")]
    UnsupportedConversion(String),

    /// Query template parsing errors
    #[error("Query parse error: {0}")]
    QueryParse(String),

    /// Query binding or invocation errors
    #[error("Query error: {0}")]
    Query(String),

    /// Schema validation errors
    #[error("Schema error: {0}")]
    Schema(String),

    /// Entity mapping errors
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Stored bytes could not be decoded
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// The row store is closed or unreachable
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an unexpected null error
    pub fn unexpected_null(msg: impl Into<String>) -> Self {
        Self::UnexpectedNull(msg.into())
    }

    /// Create an incorrect result size error
    pub fn incorrect_result_size(expected: usize, actual: usize) -> Self {
        Self::IncorrectResultSize { expected, actual }
    }

    /// Create a type conversion error
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }

    /// Create an unsupported conversion error
    pub fn unsupported_conversion(msg: impl Into<String>) -> Self {
        Self::UnsupportedConversion(msg.into())
    }

    /// Create a query parse error
    pub fn query_parse(msg: impl Into<String>) -> Self {
        Self::QueryParse(msg.into())
    }

    /// Create a query error
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a mapping error
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping(msg.into())
    }

    /// Create a corruption error
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this error is recoverable
    ///
    /// Nothing in this crate retries; the flag is for callers deciding
    /// whether to surface or re-issue the request.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Unavailable(_) => true,

            Error::NotFound(_) => false,
            Error::UnexpectedNull(_) => false,
            Error::IncorrectResultSize { .. } => false,
            Error::TypeConversion(_) => false,
            Error::UnsupportedConversion(_) => false,
            Error::QueryParse(_) => false,
            Error::Query(_) => false,
            Error::Schema(_) => false,
            Error::Mapping(_) => false,
            Error::Corruption(_) => false,
            Error::Configuration(_) => false,
            Error::Internal(_) => false,
        }
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Io(_) => ErrorCategory::System,
            Error::Unavailable(_) => ErrorCategory::Storage,
            Error::NotFound(_) => ErrorCategory::NotFound,
            Error::UnexpectedNull(_) => ErrorCategory::Data,
            Error::IncorrectResultSize { .. } => ErrorCategory::Query,
            Error::TypeConversion(_) => ErrorCategory::Data,
            Error::UnsupportedConversion(_) => ErrorCategory::Mapping,
            Error::QueryParse(_) => ErrorCategory::Query,
            Error::Query(_) => ErrorCategory::Query,
            Error::Schema(_) => ErrorCategory::Schema,
            Error::Mapping(_) => ErrorCategory::Mapping,
            Error::Corruption(_) => ErrorCategory::Data,
            Error::Configuration(_) => ErrorCategory::Configuration,
            Error::Internal(_) => ErrorCategory::Internal,
        }
    }
}

/// Error categories for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// System-level errors (I/O)
    System,
    /// Data-related errors (conversion, corruption, nulls)
    Data,
    /// Entity or projection mapping errors
    Mapping,
    /// Schema-related errors
    Schema,
    /// Query-related errors (parsing, binding, result size)
    Query,
    /// Configuration errors
    Configuration,
    /// Storage availability errors
    Storage,
    /// Resource not found
    NotFound,
    /// Internal errors
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::System => "System",
            ErrorCategory::Data => "Data",
            ErrorCategory::Mapping => "Mapping",
            ErrorCategory::Schema => "Schema",
            ErrorCategory::Query => "Query",
            ErrorCategory::Configuration => "Configuration",
            ErrorCategory::Storage => "Storage",
            ErrorCategory::NotFound => "NotFound",
            ErrorCategory::Internal => "Internal",
        };
        write!(f, "{}", name)
    }
}

/// Convert from TOML parse errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Configuration(err.to_string())
    }
}
