//! Boundary validation of a metadata-model snapshot
//!
//! Structural faults (missing fields, wrong types) are already rejected when the
//! snapshot is deserialized. This pass catches content that deserializes fine
//! but cannot produce a meaningful graph.

use cubegraph_core::{Diagnostic, DiagnosticCode, Severity};
use std::collections::HashSet;
use crate::model::{MetadataModel, ModelError};

/// Validates metadata models
pub struct ModelValidator;

impl ModelValidator {
    /// Collect every finding for a model
    pub fn validate(model: &MetadataModel) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (key, cube) in model.cubes() {
            if cube.name.trim().is_empty() {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::ModelInvalidCube,
                        Severity::Error,
                        format!("Cube '{}' has an empty name", key),
                    )
                    .with_subject(key.clone()),
                );
            }

            if cube.sql_text().trim().is_empty() {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::ModelInvalidCube,
                        Severity::Warn,
                        format!("Cube '{}' has no SQL; no lineage will be extracted", key),
                    )
                    .with_subject(key.clone()),
                );
            }
        }

        // Join edges use display names, but accept keys too
        let known: HashSet<&str> = model
            .cubes()
            .iter()
            .flat_map(|(key, cube)| [key.as_str(), cube.name.as_str()])
            .collect();

        for (edge_key, edge) in model.join_edges() {
            for endpoint in [&edge.from, &edge.to] {
                if !known.contains(endpoint.as_str()) {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::ModelDanglingJoin,
                            Severity::Warn,
                            format!("Join '{}' references unknown cube '{}'", edge_key, endpoint),
                        )
                        .with_subject(edge_key.clone()),
                    );
                }
            }
        }

        diagnostics
    }

    /// Fail fast when the model has error-level findings
    ///
    /// Returns the remaining (non-error) findings on success.
    pub fn ensure_valid(model: &MetadataModel) -> Result<Vec<Diagnostic>, ModelError> {
        let diagnostics = Self::validate(model);
        let errors: Vec<&Diagnostic> = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect();

        if let Some(first) = errors.first() {
            return Err(ModelError::Invalid {
                count: errors.len(),
                first: first.message.clone(),
            });
        }

        Ok(diagnostics)
    }
}
