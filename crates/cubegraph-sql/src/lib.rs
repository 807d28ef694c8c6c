//! SQL parsing and table lineage extraction
//!
//! This crate handles:
//! - Parsing cube SQL using datafusion-sqlparser-rs
//! - Walking the parsed AST for every qualified table a query reads,
//!   through CTEs, set operations and joins
//! - Accumulating table components and SELECT references for a graph build

pub mod parser;
pub mod walker;
pub mod lineage;

pub use parser::{SqlParser, ParsedSql, ParseError};
pub use walker::{SqlAstWalker, TableRef, WalkStats};
pub use lineage::Lineage;
