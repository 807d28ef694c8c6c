//! Configuration schema (cubegraph.toml)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::graph::DEFAULT_WORKSPACE;

/// SQL dialect configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectConfig {
    /// Generic ANSI SQL
    #[default]
    #[serde(alias = "ansi")]
    Generic,

    /// MySQL SQL dialect
    MySql,

    /// PostgreSQL SQL dialect
    Postgres,

    /// BigQuery SQL dialect
    BigQuery,

    /// Snowflake SQL dialect
    Snowflake,
}

/// How dimension and measure component ids are synthesized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    /// `dimension-<cube>-><key>` for dimensions, `measure-<cube>-><key>` for measures
    #[default]
    Distinct,

    /// `dimension-<cube>-><key>` for both, as produced by earlier exporters.
    /// A dimension and a measure sharing a key collapse into one component.
    Legacy,
}

impl IdScheme {
    /// Component id of a cube's dimension
    pub fn dimension_id(&self, cube_name: &str, key: &str) -> String {
        format!("dimension-{}->{}", cube_name, key)
    }

    /// Component id of a cube's measure
    pub fn measure_id(&self, cube_name: &str, key: &str) -> String {
        match self {
            Self::Distinct => format!("measure-{}->{}", cube_name, key),
            Self::Legacy => format!("dimension-{}->{}", cube_name, key),
        }
    }
}

/// What to do when a cube selects from the same table more than once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateLineagePolicy {
    /// Emit every occurrence with the same id `<cube>-<table>`
    Keep,

    /// Emit every occurrence; repeats get `#2`, `#3`, ... appended to the id
    #[default]
    Suffix,

    /// Emit one reference per (cube, table) pair
    Dedupe,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQL dialect used to parse cube SQL
    #[serde(default)]
    pub dialect: DialectConfig,

    /// Workspace assigned to every component
    #[serde(default = "default_workspace")]
    pub workspace: String,

    /// Dimension/measure id scheme
    #[serde(default)]
    pub id_scheme: IdScheme,

    /// Policy for repeated (cube, table) lineage
    #[serde(default)]
    pub duplicate_lineage: DuplicateLineagePolicy,

    /// Also walk the inner query of derived tables (`FROM (SELECT ...) t`)
    #[serde(default)]
    pub follow_derived_tables: bool,

    /// Maximum nesting depth walked inside one cube's SQL (unlimited when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Validate the metadata model before building
    #[serde(default = "default_true")]
    pub validate_model: bool,

    /// Workspace name mapping passed through to the sync API
    #[serde(default)]
    pub workspaces: BTreeMap<String, String>,
}

fn default_workspace() -> String {
    DEFAULT_WORKSPACE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: DialectConfig::default(),
            workspace: default_workspace(),
            id_scheme: IdScheme::default(),
            duplicate_lineage: DuplicateLineagePolicy::default(),
            follow_derived_tables: false,
            max_depth: None,
            validate_model: true,
            workspaces: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
