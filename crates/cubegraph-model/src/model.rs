//! Evaluated metadata-model snapshot
//!
//! Mirrors the shape the cube compiler exposes: `cubeEvaluator.evaluatedCubes`
//! and `joinGraph.edges`. Maps are ordered so every traversal is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Snapshot of an evaluated metadata model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataModel {
    /// Evaluated cube definitions
    pub cube_evaluator: CubeEvaluator,

    /// Precomputed joins between cubes
    #[serde(default)]
    pub join_graph: JoinGraph,
}

/// Cube definitions keyed by their model key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeEvaluator {
    #[serde(default)]
    pub evaluated_cubes: BTreeMap<String, CubeDefinition>,
}

/// Join edges keyed by their edge key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinGraph {
    #[serde(default)]
    pub edges: BTreeMap<String, JoinEdge>,
}

impl MetadataModel {
    /// Load model from file
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ModelError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse model from JSON string
    pub fn from_str(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json)
            .map_err(|e| ModelError::ParseError(e.to_string()))
    }

    /// All cubes in key order
    pub fn cubes(&self) -> &BTreeMap<String, CubeDefinition> {
        &self.cube_evaluator.evaluated_cubes
    }

    /// All join edges in key order
    pub fn join_edges(&self) -> &BTreeMap<String, JoinEdge> {
        &self.join_graph.edges
    }

    /// Get a cube by its model key
    pub fn get_cube(&self, key: &str) -> Option<&CubeDefinition> {
        self.cube_evaluator.evaluated_cubes.get(key)
    }

    /// Find a cube by its display name
    pub fn find_cube_by_name(&self, name: &str) -> Option<(&String, &CubeDefinition)> {
        self.cube_evaluator
            .evaluated_cubes
            .iter()
            .find(|(_, cube)| cube.name == name)
    }
}

/// A cube: a named analytical entity backed by a SQL query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeDefinition {
    /// Display name
    pub name: String,

    /// SELECT statement backing the cube
    pub sql: String,

    /// Dimensions by key
    #[serde(default)]
    pub dimensions: BTreeMap<String, DimensionDef>,

    /// Measures by key
    #[serde(default)]
    pub measures: BTreeMap<String, MeasureDef>,
}

impl CubeDefinition {
    /// Create a cube without dimensions or measures
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            dimensions: BTreeMap::new(),
            measures: BTreeMap::new(),
        }
    }

    /// Add a dimension
    pub fn with_dimension(mut self, key: impl Into<String>, dimension: DimensionDef) -> Self {
        self.dimensions.insert(key.into(), dimension);
        self
    }

    /// Add a measure
    pub fn with_measure(mut self, key: impl Into<String>, measure: MeasureDef) -> Self {
        self.measures.insert(key.into(), measure);
        self
    }

    /// The SQL text this cube selects from
    pub fn sql_text(&self) -> &str {
        &self.sql
    }
}

/// A categorical attribute of a cube
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDef {
    /// Type tag (string, number, time, ...)
    #[serde(rename = "type")]
    pub dimension_type: String,

    /// SQL expression source text
    #[serde(default)]
    pub sql: Option<String>,

    /// Structured conditional expression
    #[serde(default)]
    pub case: Option<serde_json::Value>,
}

impl DimensionDef {
    pub fn new(dimension_type: impl Into<String>) -> Self {
        Self {
            dimension_type: dimension_type.into(),
            sql: None,
            case: None,
        }
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    pub fn with_case(mut self, case: serde_json::Value) -> Self {
        self.case = Some(case);
        self
    }
}

/// A numeric or aggregated attribute of a cube
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureDef {
    /// Type tag (count, sum, avg, ...)
    #[serde(rename = "type")]
    pub measure_type: String,

    /// SQL expression source text
    #[serde(default)]
    pub sql: Option<String>,
}

impl MeasureDef {
    pub fn new(measure_type: impl Into<String>) -> Self {
        Self {
            measure_type: measure_type.into(),
            sql: None,
        }
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}

/// Precomputed join between two cubes (by display name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinEdge {
    pub from: String,
    pub to: String,
}

impl JoinEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Model loading errors
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse model JSON: {0}")]
    ParseError(String),

    #[error("Model is invalid ({count} error(s)), first: {first}")]
    Invalid { count: usize, first: String },
}
