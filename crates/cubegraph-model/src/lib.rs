//! Metadata-model snapshot types and boundary validation
//!
//! This crate handles:
//! - Loading an evaluated cube model snapshot (JSON)
//! - Typed cube, dimension, measure and join-edge definitions
//! - Validating the snapshot before a graph is built

pub mod model;
pub mod validate;

pub use model::{
    CubeDefinition, CubeEvaluator, DimensionDef, JoinEdge, JoinGraph, MeasureDef, MetadataModel,
    ModelError,
};
pub use validate::ModelValidator;
