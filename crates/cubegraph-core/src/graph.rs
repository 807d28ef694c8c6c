//! Output graph types
//!
//! These types serialize to the exact payload shape the graph catalog consumes
//! (camelCase keys, `type` tags). Do not rename serialized fields.

use serde::{Deserialize, Serialize};

/// Workspace every component is placed in unless configured otherwise
pub const DEFAULT_WORKSPACE: &str = "cubes";

/// Kind of a graph component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    /// A cube of the metadata model
    Cube,

    /// A dimension owned by a cube
    Dimension,

    /// A measure owned by a cube
    Measure,

    /// A physical table read by a cube's SQL
    Table,
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cube => write!(f, "Cube"),
            Self::Dimension => write!(f, "Dimension"),
            Self::Measure => write!(f, "Measure"),
            Self::Table => write!(f, "Table"),
        }
    }
}

/// Kind of a graph reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceType {
    /// Precomputed join between two cubes
    Joins,

    /// Lineage: a cube's SQL selects from a table
    #[serde(rename = "SELECT")]
    Select,
}

impl std::fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Joins => write!(f, "Joins"),
            Self::Select => write!(f, "SELECT"),
        }
    }
}

/// A node of the output graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphComponent {
    /// Unique key within the graph
    pub custom_id: String,

    /// Logical partition the component lives in
    pub workspace: String,

    /// Display label
    pub name: String,

    /// Component kind
    #[serde(rename = "type")]
    pub component_type: ComponentType,

    /// Owning cube (dimensions and measures only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Reserved extension point, always empty
    #[serde(default)]
    pub fields: Vec<serde_json::Value>,

    /// Markdown description (dimensions and measures only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GraphComponent {
    /// Create a component without parent or description
    pub fn new(
        custom_id: impl Into<String>,
        workspace: impl Into<String>,
        name: impl Into<String>,
        component_type: ComponentType,
    ) -> Self {
        Self {
            custom_id: custom_id.into(),
            workspace: workspace.into(),
            name: name.into(),
            component_type,
            parent: None,
            fields: Vec::new(),
            description: None,
        }
    }

    /// Set the owning component
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An edge of the output graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphReference {
    /// Unique key within the graph
    pub custom_id: String,

    /// Source component id
    pub source: String,

    /// Target component id
    pub target: String,

    /// Reference kind
    #[serde(rename = "type")]
    pub reference_type: ReferenceType,
}

impl GraphReference {
    pub fn new(
        custom_id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        reference_type: ReferenceType,
    ) -> Self {
        Self {
            custom_id: custom_id.into(),
            source: source.into(),
            target: target.into(),
            reference_type,
        }
    }
}

/// The finished graph handed to the sync API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputGraph {
    pub components: Vec<GraphComponent>,
    pub references: Vec<GraphReference>,
}

impl OutputGraph {
    /// Look up a component by custom id
    pub fn component(&self, custom_id: &str) -> Option<&GraphComponent> {
        self.components.iter().find(|c| c.custom_id == custom_id)
    }

    /// All components of one kind, in graph order
    pub fn components_of(&self, component_type: ComponentType) -> Vec<&GraphComponent> {
        self.components
            .iter()
            .filter(|c| c.component_type == component_type)
            .collect()
    }

    /// All references of one kind, in graph order
    pub fn references_of(&self, reference_type: ReferenceType) -> Vec<&GraphReference> {
        self.references
            .iter()
            .filter(|r| r.reference_type == reference_type)
            .collect()
    }

    /// Check if the graph has no components and no references
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.references.is_empty()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn component_serializes_to_catalog_shape() {
        let component = GraphComponent::new("dimension-Orders->status", DEFAULT_WORKSPACE, "status", ComponentType::Dimension)
            .with_parent("Orders")
            .with_description("`status`");

        let value = serde_json::to_value(&component).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "customId": "dimension-Orders->status",
                "workspace": "cubes",
                "name": "status",
                "type": "Dimension",
                "parent": "Orders",
                "fields": [],
                "description": "`status`",
            })
        );
    }

    #[test]
    fn table_component_omits_parent_and_description() {
        let component = GraphComponent::new("db1.orders", DEFAULT_WORKSPACE, "db1.orders", ComponentType::Table);
        let json = serde_json::to_string(&component).unwrap();
        assert!(!json.contains("parent"));
        assert!(!json.contains("description"));
    }

    #[test]
    fn select_reference_type_tag() {
        let reference = GraphReference::new("Orders-db1.orders", "Orders", "db1.orders", ReferenceType::Select);
        let value = serde_json::to_value(&reference).unwrap();
        assert_eq!(value["type"], "SELECT");
        assert_eq!(value["customId"], "Orders-db1.orders");

        let joins = GraphReference::new("Orders-Users", "Orders", "Users", ReferenceType::Joins);
        assert_eq!(serde_json::to_value(&joins).unwrap()["type"], "Joins");
    }

    #[test]
    fn filter_helpers() {
        let graph = OutputGraph {
            components: vec![
                GraphComponent::new("orders", "cubes", "Orders", ComponentType::Cube),
                GraphComponent::new("db1.orders", "cubes", "db1.orders", ComponentType::Table),
            ],
            references: vec![GraphReference::new("Orders-db1.orders", "Orders", "db1.orders", ReferenceType::Select)],
        };

        assert_eq!(graph.components_of(ComponentType::Table).len(), 1);
        assert_eq!(graph.references_of(ReferenceType::Joins).len(), 0);
        assert!(graph.component("orders").is_some());
        assert!(!graph.is_empty());
        assert!(OutputGraph::default().is_empty());
    }
}
