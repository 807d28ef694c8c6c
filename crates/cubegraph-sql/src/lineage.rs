//! Lineage accumulator shared by every cube of one graph build
//!
//! Table components are created once per distinct key. SELECT references are
//! created per occurrence, subject to the duplicate policy.

use std::collections::{HashMap, HashSet};
use cubegraph_core::{ComponentType, DuplicateLineagePolicy, GraphComponent, GraphReference, ReferenceType};
use crate::walker::TableRef;

/// Table components and SELECT references collected during one build
#[derive(Debug, Clone)]
pub struct Lineage {
    workspace: String,
    policy: DuplicateLineagePolicy,
    tables: Vec<GraphComponent>,
    references: Vec<GraphReference>,
    visited_tables: HashSet<String>,
    occurrences: HashMap<String, usize>,
}

impl Lineage {
    /// Create an empty accumulator
    pub fn new(workspace: impl Into<String>, policy: DuplicateLineagePolicy) -> Self {
        Self {
            workspace: workspace.into(),
            policy,
            tables: Vec::new(),
            references: Vec::new(),
            visited_tables: HashSet::new(),
            occurrences: HashMap::new(),
        }
    }

    /// Record that `source` selects from `table`
    ///
    /// Returns true when the table was not seen before in this build.
    pub fn record(&mut self, source: &str, table: &TableRef) -> bool {
        let table_key = table.key();
        let base_id = format!("{}-{}", source, table_key);

        let occurrence = {
            let count = self.occurrences.entry(base_id.clone()).or_insert(0);
            *count += 1;
            *count
        };

        let reference_id = match self.policy {
            DuplicateLineagePolicy::Keep => Some(base_id),
            DuplicateLineagePolicy::Suffix if occurrence == 1 => Some(base_id),
            DuplicateLineagePolicy::Suffix => Some(format!("{}#{}", base_id, occurrence)),
            DuplicateLineagePolicy::Dedupe if occurrence == 1 => Some(base_id),
            DuplicateLineagePolicy::Dedupe => None,
        };

        if let Some(custom_id) = reference_id {
            self.references.push(GraphReference::new(
                custom_id,
                source,
                table_key.clone(),
                ReferenceType::Select,
            ));
        }

        if self.visited_tables.contains(&table_key) {
            return false;
        }

        self.tables.push(GraphComponent::new(
            table_key.clone(),
            self.workspace.clone(),
            table_key.clone(),
            ComponentType::Table,
        ));
        self.visited_tables.insert(table_key);
        true
    }

    /// Table components in discovery order
    pub fn tables(&self) -> &[GraphComponent] {
        &self.tables
    }

    /// SELECT references in discovery order
    pub fn references(&self) -> &[GraphReference] {
        &self.references
    }

    /// Consume into (table components, SELECT references)
    pub fn into_parts(self) -> (Vec<GraphComponent>, Vec<GraphReference>) {
        (self.tables, self.references)
    }
}
