//! cubegraph Core
//!
//! Core domain model shared by every cubegraph crate: the output graph,
//! diagnostics, the build report and configuration.
//! Never rename diagnostic codes or graph type tags - they are part of the public API.

pub mod diagnostic;
pub mod graph;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use graph::{ComponentType, GraphComponent, GraphReference, OutputGraph, ReferenceType, DEFAULT_WORKSPACE};
pub use report::{Report, ReportSummary, ReportVersion};
pub use config::{Config, ConfigError, DialectConfig, DuplicateLineagePolicy, IdScheme};
