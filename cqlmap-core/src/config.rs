//! Configuration management for CQLMap

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::schema::{validate_identifier, NamingStrategy, SchemaAction};

/// Main configuration structure for a CQLMap repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Entity to table mapping
    pub mapping: MappingConfig,

    /// Schema management at repository start
    pub schema: SchemaConfig,

    /// Query execution limits
    pub query: QueryConfig,
}

/// Entity mapping configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// How property names become column names
    pub naming: NamingStrategy,
}

/// Schema configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Keyspace qualifying every entity table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyspace: Option<String>,

    /// Action applied to entity tables when a repository opens
    pub action: SchemaAction,
}

/// Query configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Upper bound on rows any single query returns (default: 10000)
    pub max_result_rows: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_result_rows: 10_000,
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|e| match e {
            Error::Configuration(msg) => {
                Error::configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::configuration(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(keyspace) = &self.schema.keyspace {
            validate_identifier(keyspace, "Keyspace")
                .map_err(|e| Error::configuration(e.to_string()))?;
        }

        if self.query.max_result_rows == 0 {
            return Err(Error::configuration(
                "max_result_rows must be greater than 0",
            ));
        }

        Ok(())
    }
}
