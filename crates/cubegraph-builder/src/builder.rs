//! Graph build from a metadata-model snapshot
//!
//! Pass one emits cube, dimension and measure components and the join
//! references. Pass two parses each cube's SQL and walks it for table lineage.
//! A cube whose SQL fails to parse contributes no lineage; the build goes on.

use std::collections::HashSet;
use cubegraph_core::{
    ComponentType, Config, Diagnostic, DiagnosticCode, GraphComponent, GraphReference, OutputGraph,
    ReferenceType, Severity,
};
use cubegraph_model::MetadataModel;
use cubegraph_sql::{Lineage, SqlAstWalker, SqlParser};
use crate::describe::{dimension_description, measure_description};

/// Result of a build with everything that went wrong along the way
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// The finished graph
    pub graph: OutputGraph,

    /// Parse failures, skipped statements, dropped duplicates
    pub diagnostics: Vec<Diagnostic>,

    /// Cubes whose SQL parsed
    pub cubes_parsed: usize,

    /// Cubes whose SQL failed to parse
    pub cubes_failed: usize,
}

/// Builds output graphs from metadata models
pub struct GraphBuilder {
    config: Config,
}

impl GraphBuilder {
    /// Create a builder with the default configuration
    pub fn new() -> Self {
        Self::from_config(Config::default())
    }

    /// Create a builder from configuration
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Build the graph, discarding diagnostics
    pub fn build(&self, model: &MetadataModel) -> OutputGraph {
        self.build_with_diagnostics(model).graph
    }

    /// Build the graph and keep diagnostics
    pub fn build_with_diagnostics(&self, model: &MetadataModel) -> BuildOutcome {
        let workspace = self.config.workspace.as_str();
        let id_scheme = self.config.id_scheme;
        let mut diagnostics = Vec::new();

        let cube_components: Vec<GraphComponent> = model
            .cubes()
            .iter()
            .map(|(key, cube)| GraphComponent::new(key.clone(), workspace, cube.name.clone(), ComponentType::Cube))
            .collect();

        let mut references: Vec<GraphReference> = model
            .join_edges()
            .iter()
            .map(|(key, edge)| {
                GraphReference::new(key.clone(), edge.from.clone(), edge.to.clone(), ReferenceType::Joins)
            })
            .collect();

        let mut dimension_components = Vec::new();
        let mut measure_components = Vec::new();

        for cube in model.cubes().values() {
            for (key, dimension) in &cube.dimensions {
                dimension_components.push(
                    GraphComponent::new(
                        id_scheme.dimension_id(&cube.name, key),
                        workspace,
                        key.clone(),
                        ComponentType::Dimension,
                    )
                    .with_parent(cube.name.clone())
                    .with_description(dimension_description(dimension)),
                );
            }

            for (key, measure) in &cube.measures {
                measure_components.push(
                    GraphComponent::new(
                        id_scheme.measure_id(&cube.name, key),
                        workspace,
                        key.clone(),
                        ComponentType::Measure,
                    )
                    .with_parent(cube.name.clone())
                    .with_description(measure_description(measure)),
                );
            }
        }

        let parser = SqlParser::from_dialect(&self.config.dialect);
        let walker = SqlAstWalker::from_config(&self.config);
        let mut lineage = Lineage::new(workspace, self.config.duplicate_lineage);
        let mut cubes_parsed = 0;
        let mut cubes_failed = 0;

        for (key, cube) in model.cubes() {
            let sql = cube.sql_text();

            let parsed = match parser.parse(sql) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(cube = %cube.name, sql = %sql, error = %e.error, "Error when parsing cube SQL");
                    diagnostics.push(e.to_diagnostic(key));
                    cubes_failed += 1;
                    continue;
                }
            };
            cubes_parsed += 1;

            let stats = walker.walk(&cube.name, &parsed, &mut lineage);
            tracing::debug!(cube = %cube.name, tables = stats.tables, unqualified = stats.unqualified, "Walked cube SQL");

            if stats.ignored {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::SqlUnsupportedStatement,
                        Severity::Info,
                        format!("SQL of cube '{}' is not a single SELECT; no lineage extracted", cube.name),
                    )
                    .with_subject(key.clone()),
                );
            }

            if let (true, Some(limit)) = (stats.truncated, self.config.max_depth) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::SqlDepthExceeded,
                        Severity::Warn,
                        format!(
                            "SQL of cube '{}' nests deeper than {}; lineage below that depth was skipped",
                            cube.name, limit
                        ),
                    )
                    .with_subject(key.clone()),
                );
            }
        }

        let (table_components, select_references) = lineage.into_parts();
        references.extend(select_references);

        let components = dedupe_components(
            cube_components
                .into_iter()
                .chain(dimension_components)
                .chain(measure_components)
                .chain(table_components),
            &mut diagnostics,
        );

        BuildOutcome {
            graph: OutputGraph { components, references },
            diagnostics,
            cubes_parsed,
            cubes_failed,
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a graph with the default configuration
pub fn build_graph(model: &MetadataModel) -> OutputGraph {
    GraphBuilder::new().build(model)
}

/// Keep the first component for every custom id
fn dedupe_components(
    components: impl IntoIterator<Item = GraphComponent>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<GraphComponent> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for component in components {
        if seen.insert(component.custom_id.clone()) {
            result.push(component);
            continue;
        }

        tracing::warn!(id = %component.custom_id, kind = %component.component_type, "Dropping duplicate component");
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::GraphDuplicateComponent,
                Severity::Warn,
                format!(
                    "{} '{}' has the same id as an earlier component and was dropped",
                    component.component_type, component.custom_id
                ),
            )
            .with_subject(component.custom_id),
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubegraph_core::{DuplicateLineagePolicy, IdScheme};
    use cubegraph_model::{CubeDefinition, DimensionDef, JoinEdge, MeasureDef};
    use pretty_assertions::assert_eq;

    fn model(cubes: Vec<(&str, CubeDefinition)>, edges: Vec<(&str, JoinEdge)>) -> MetadataModel {
        let mut model = MetadataModel::default();
        for (key, cube) in cubes {
            model.cube_evaluator.evaluated_cubes.insert(key.to_string(), cube);
        }
        for (key, edge) in edges {
            model.join_graph.edges.insert(key.to_string(), edge);
        }
        model
    }

    fn ids(components: &[&GraphComponent]) -> Vec<String> {
        components.iter().map(|c| c.custom_id.clone()).collect()
    }

    #[test]
    fn empty_model_builds_empty_graph() {
        let graph = build_graph(&MetadataModel::default());
        assert!(graph.is_empty());
    }

    #[test]
    fn cube_node_uses_key_as_id_and_name_as_label() {
        let graph = build_graph(&model(
            vec![("orders_v2", CubeDefinition::new("Orders", "SELECT * FROM shop.orders"))],
            vec![],
        ));

        let cube = graph.component("orders_v2").unwrap();
        assert_eq!(cube.name, "Orders");
        assert_eq!(cube.workspace, "cubes");
        assert_eq!(cube.component_type, ComponentType::Cube);
        assert!(cube.fields.is_empty());
        assert!(cube.parent.is_none());
    }

    #[test]
    fn component_order_is_cubes_dimensions_measures_tables() {
        let graph = build_graph(&model(
            vec![(
                "orders",
                CubeDefinition::new("Orders", "SELECT * FROM shop.orders")
                    .with_dimension("status", DimensionDef::new("string").with_sql("status"))
                    .with_measure("count", MeasureDef::new("count")),
            )],
            vec![],
        ));

        let kinds: Vec<ComponentType> = graph.components.iter().map(|c| c.component_type).collect();
        assert_eq!(
            kinds,
            vec![ComponentType::Cube, ComponentType::Dimension, ComponentType::Measure, ComponentType::Table]
        );
    }

    #[test]
    fn join_edges_pass_through() {
        let graph = build_graph(&model(
            vec![
                ("orders", CubeDefinition::new("Orders", "SELECT * FROM shop.orders")),
                ("users", CubeDefinition::new("Users", "SELECT * FROM shop.users")),
            ],
            vec![("Orders-Users", JoinEdge::new("Orders", "Users"))],
        ));

        let joins = graph.references_of(ReferenceType::Joins);
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].custom_id, "Orders-Users");
        assert_eq!(joins[0].source, "Orders");
        assert_eq!(joins[0].target, "Users");

        // Joins come before lineage
        assert_eq!(graph.references[0].reference_type, ReferenceType::Joins);
    }

    #[test]
    fn dimensions_and_measures_are_parented_and_described() {
        let graph = build_graph(&model(
            vec![(
                "orders",
                CubeDefinition::new("Orders", "SELECT * FROM shop.orders")
                    .with_dimension("status", DimensionDef::new("string").with_sql("status"))
                    .with_measure("count", MeasureDef::new("count")),
            )],
            vec![],
        ));

        let dimension = graph.component("dimension-Orders->status").unwrap();
        assert_eq!(dimension.parent.as_deref(), Some("Orders"));
        assert_eq!(dimension.name, "status");
        assert_eq!(dimension.description.as_deref(), Some("```sql\nstatus\n```"));

        let measure = graph.component("measure-Orders->count").unwrap();
        assert_eq!(measure.parent.as_deref(), Some("Orders"));
        assert_eq!(measure.description.as_deref(), Some("count"));
    }

    #[test]
    fn identical_dimension_keys_across_cubes_stay_unique() {
        let graph = build_graph(&model(
            vec![
                (
                    "orders",
                    CubeDefinition::new("Orders", "SELECT * FROM shop.orders")
                        .with_dimension("id", DimensionDef::new("number").with_sql("id")),
                ),
                (
                    "users",
                    CubeDefinition::new("Users", "SELECT * FROM shop.users")
                        .with_dimension("id", DimensionDef::new("number").with_sql("id")),
                ),
            ],
            vec![],
        ));

        assert_eq!(
            ids(&graph.components_of(ComponentType::Dimension)),
            vec!["dimension-Orders->id", "dimension-Users->id"]
        );
    }

    #[test]
    fn legacy_id_scheme_collapses_dimension_and_measure() {
        let config = Config {
            id_scheme: IdScheme::Legacy,
            ..Config::default()
        };
        let outcome = GraphBuilder::from_config(config).build_with_diagnostics(&model(
            vec![(
                "orders",
                CubeDefinition::new("Orders", "SELECT * FROM shop.orders")
                    .with_dimension("amount", DimensionDef::new("number").with_sql("amount"))
                    .with_measure("amount", MeasureDef::new("sum").with_sql("amount")),
            )],
            vec![],
        ));

        let graph = &outcome.graph;
        assert_eq!(ids(&graph.components_of(ComponentType::Dimension)), vec!["dimension-Orders->amount"]);
        assert!(graph.components_of(ComponentType::Measure).is_empty());
        assert!(outcome
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::GraphDuplicateComponent));
    }

    #[test]
    fn parse_failure_is_isolated() {
        let outcome = GraphBuilder::new().build_with_diagnostics(&model(
            vec![
                ("a", CubeDefinition::new("A", "SELECT * FROM db1.a")),
                ("b", CubeDefinition::new("B", "SELECT FROM WHERE")),
                ("c", CubeDefinition::new("C", "SELECT * FROM db1.c")),
            ],
            vec![],
        ));

        assert_eq!(outcome.cubes_parsed, 2);
        assert_eq!(outcome.cubes_failed, 1);
        assert_eq!(ids(&outcome.graph.components_of(ComponentType::Table)), vec!["db1.a", "db1.c"]);
        assert_eq!(outcome.graph.components_of(ComponentType::Cube).len(), 3);

        let sources: Vec<&str> = outcome
            .graph
            .references_of(ReferenceType::Select)
            .iter()
            .map(|r| r.source.as_str())
            .collect();
        assert_eq!(sources, vec!["A", "C"]);

        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].code, DiagnosticCode::SqlParseError);
        assert_eq!(outcome.diagnostics[0].subject.as_deref(), Some("b"));
    }

    #[test]
    fn repeated_table_in_one_cube_uses_suffix_policy() {
        let graph = build_graph(&model(
            vec![(
                "orders",
                CubeDefinition::new("Orders", "SELECT * FROM db1.orders a JOIN db1.orders b ON a.parent_id = b.id"),
            )],
            vec![],
        ));

        assert_eq!(graph.components_of(ComponentType::Table).len(), 1);
        let ids: Vec<&str> = graph.references.iter().map(|r| r.custom_id.as_str()).collect();
        assert_eq!(ids, vec!["Orders-db1.orders", "Orders-db1.orders#2"]);
    }

    #[test]
    fn dedupe_policy_keeps_one_reference_per_pair() {
        let config = Config {
            duplicate_lineage: DuplicateLineagePolicy::Dedupe,
            ..Config::default()
        };
        let graph = GraphBuilder::from_config(config).build(&model(
            vec![(
                "orders",
                CubeDefinition::new("Orders", "SELECT * FROM db1.orders UNION SELECT * FROM db1.orders"),
            )],
            vec![],
        ));

        assert_eq!(graph.references_of(ReferenceType::Select).len(), 1);
    }

    #[test]
    fn multi_statement_sql_is_reported_not_walked() {
        let outcome = GraphBuilder::new().build_with_diagnostics(&model(
            vec![("orders", CubeDefinition::new("Orders", "SELECT * FROM db1.a; SELECT * FROM db1.b"))],
            vec![],
        ));

        assert!(outcome.graph.components_of(ComponentType::Table).is_empty());
        assert_eq!(outcome.diagnostics[0].code, DiagnosticCode::SqlUnsupportedStatement);
        assert_eq!(outcome.diagnostics[0].severity, Severity::Info);
    }

    #[test]
    fn custom_workspace_applies_to_every_component() {
        let config = Config {
            workspace: "analytics".to_string(),
            ..Config::default()
        };
        let graph = GraphBuilder::from_config(config).build(&model(
            vec![(
                "orders",
                CubeDefinition::new("Orders", "SELECT * FROM db1.orders")
                    .with_dimension("status", DimensionDef::new("string")),
            )],
            vec![],
        ));

        assert!(graph.components.iter().all(|c| c.workspace == "analytics"));
    }

    #[test]
    fn depth_limit_is_reported() {
        let config = Config {
            max_depth: Some(0),
            ..Config::default()
        };
        let outcome = GraphBuilder::from_config(config).build_with_diagnostics(&model(
            vec![(
                "orders",
                CubeDefinition::new("Orders", "WITH w AS (SELECT * FROM db1.inner_t) SELECT * FROM db1.outer_t"),
            )],
            vec![],
        ));

        assert_eq!(ids(&outcome.graph.components_of(ComponentType::Table)), vec!["db1.outer_t"]);
        assert!(outcome.diagnostics.iter().any(|d| d.code == DiagnosticCode::SqlDepthExceeded));
    }
}
