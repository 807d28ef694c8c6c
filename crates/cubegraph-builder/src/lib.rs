//! cubegraph builder - metadata model to output graph
//!
//! This crate implements the graph build:
//! - Cube, dimension and measure components
//! - Join references taken from the model's join graph
//! - Table components and SELECT lineage from each cube's SQL

pub mod builder;
pub mod describe;

pub use builder::{build_graph, BuildOutcome, GraphBuilder};
