//! Table reference extraction from a parsed query
//!
//! Walks a query's FROM clauses, CTE bodies and set-operation branches with an
//! explicit worklist, reporting every schema-qualified table it reads.
//! Unqualified names (CTE references, bare tables) are skipped.

use sqlparser::ast::{ObjectName, Query, SetExpr, TableFactor, TableWithJoins};
use cubegraph_core::Config;
use crate::lineage::Lineage;
use crate::parser::ParsedSql;

/// A schema-qualified table read by a query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Everything before the table name (`db`, or `catalog.schema`)
    pub qualifier: String,

    /// Table name
    pub table: String,
}

impl TableRef {
    pub fn new(qualifier: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            table: table.into(),
        }
    }

    /// Build from a parsed object name; `None` when the name is unqualified
    ///
    /// Identifier quoting is dropped, so `"db1"."orders"` and `db1.orders`
    /// produce the same key.
    pub fn from_object_name(name: &ObjectName) -> Option<Self> {
        let parts: Vec<&str> = name.0.iter().map(|ident| ident.value.as_str()).collect();
        let (table, qualifier) = parts.split_last()?;

        if qualifier.is_empty() {
            return None;
        }

        Some(Self::new(qualifier.join("."), *table))
    }

    /// Graph key `<qualifier>.<table>`
    pub fn key(&self) -> String {
        format!("{}.{}", self.qualifier, self.table)
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.qualifier, self.table)
    }
}

/// Counters from one walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Qualified table references reported
    pub tables: usize,

    /// Unqualified table references skipped
    pub unqualified: usize,

    /// Derived tables (`FROM (SELECT ...)`) not descended into
    pub derived_skipped: usize,

    /// The SQL was not a single query statement, nothing was walked
    pub ignored: bool,

    /// Some nodes lay deeper than the depth limit and were not walked
    pub truncated: bool,
}

enum WorkItem<'a> {
    Query(&'a Query),
    SetExpr(&'a SetExpr),
    Relation(&'a TableFactor),
}

/// Walks parsed SQL for the tables it reads
#[derive(Debug, Clone)]
pub struct SqlAstWalker {
    max_depth: Option<usize>,
    follow_derived_tables: bool,
}

impl SqlAstWalker {
    /// Create a walker with default limits
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Create a walker from configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_depth: config.max_depth,
            follow_derived_tables: config.follow_derived_tables,
        }
    }

    /// Limit how deep CTEs, set operations and nested joins are followed
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Also walk the inner query of derived tables
    pub fn with_derived_tables(mut self, follow: bool) -> Self {
        self.follow_derived_tables = follow;
        self
    }

    /// Record every table the SQL reads as lineage of `source_name`
    pub fn walk(&self, source_name: &str, parsed: &ParsedSql, lineage: &mut Lineage) -> WalkStats {
        self.visit(parsed, |table| {
            lineage.record(source_name, &table);
        })
    }

    /// Every qualified table the SQL reads, in walk order (repeats included)
    pub fn table_refs(&self, parsed: &ParsedSql) -> (Vec<TableRef>, WalkStats) {
        let mut tables = Vec::new();
        let stats = self.visit(parsed, |table| tables.push(table));
        (tables, stats)
    }

    /// Depth-first walk: a query's body before its CTEs, left set-operation
    /// branch before right, FROM relations in source order.
    fn visit<F: FnMut(TableRef)>(&self, parsed: &ParsedSql, mut on_table: F) -> WalkStats {
        let mut stats = WalkStats::default();

        let Some(root) = parsed.single_query() else {
            stats.ignored = true;
            return stats;
        };

        let mut stack: Vec<(WorkItem<'_>, usize)> = vec![(WorkItem::Query(root), 0)];

        while let Some((item, depth)) = stack.pop() {
            if self.max_depth.is_some_and(|limit| depth > limit) {
                stats.truncated = true;
                continue;
            }

            match item {
                WorkItem::Query(query) => {
                    if let Some(with) = &query.with {
                        for cte in with.cte_tables.iter().rev() {
                            stack.push((WorkItem::Query(cte.query.as_ref()), depth + 1));
                        }
                    }
                    stack.push((WorkItem::SetExpr(query.body.as_ref()), depth));
                }
                WorkItem::SetExpr(set_expr) => match set_expr {
                    SetExpr::Select(select) => {
                        push_relations(&mut stack, &select.from, depth);
                    }
                    SetExpr::Query(query) => {
                        stack.push((WorkItem::Query(query.as_ref()), depth + 1));
                    }
                    SetExpr::SetOperation { left, right, .. } => {
                        stack.push((WorkItem::SetExpr(right.as_ref()), depth + 1));
                        stack.push((WorkItem::SetExpr(left.as_ref()), depth + 1));
                    }
                    // VALUES, INSERT, UPDATE, TABLE ... read no FROM clause
                    _ => {}
                },
                WorkItem::Relation(relation) => match relation {
                    TableFactor::Table { name, .. } => match TableRef::from_object_name(name) {
                        Some(table) => {
                            stats.tables += 1;
                            on_table(table);
                        }
                        None => stats.unqualified += 1,
                    },
                    TableFactor::Derived { subquery, .. } => {
                        if self.follow_derived_tables {
                            stack.push((WorkItem::Query(subquery.as_ref()), depth + 1));
                        } else {
                            stats.derived_skipped += 1;
                        }
                    }
                    TableFactor::NestedJoin { table_with_joins, .. } => {
                        push_relations(&mut stack, std::slice::from_ref(table_with_joins.as_ref()), depth + 1);
                    }
                    _ => {}
                },
            }
        }

        if stats.truncated {
            tracing::debug!(max_depth = ?self.max_depth, "SQL walk truncated at depth limit");
        }

        stats
    }
}

impl Default for SqlAstWalker {
    fn default() -> Self {
        Self::new()
    }
}

/// Push the relations of a FROM clause so they pop in source order
fn push_relations<'a>(stack: &mut Vec<(WorkItem<'a>, usize)>, from: &'a [TableWithJoins], depth: usize) {
    let relations: Vec<&TableFactor> = from
        .iter()
        .flat_map(|twj| std::iter::once(&twj.relation).chain(twj.joins.iter().map(|join| &join.relation)))
        .collect();

    for relation in relations.into_iter().rev() {
        stack.push((WorkItem::Relation(relation), depth));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SqlParser;
    use pretty_assertions::assert_eq;

    fn keys(sql: &str) -> Vec<String> {
        keys_with(&SqlAstWalker::new(), sql)
    }

    fn keys_with(walker: &SqlAstWalker, sql: &str) -> Vec<String> {
        let parsed = SqlParser::new().parse(sql).unwrap();
        let (tables, _) = walker.table_refs(&parsed);
        tables.iter().map(TableRef::key).collect()
    }

    #[test]
    fn qualified_table() {
        assert_eq!(keys("SELECT * FROM db1.orders"), vec!["db1.orders"]);
    }

    #[test]
    fn unqualified_table_is_skipped() {
        let parsed = SqlParser::new().parse("SELECT * FROM derived_subquery").unwrap();
        let (tables, stats) = SqlAstWalker::new().table_refs(&parsed);

        assert!(tables.is_empty());
        assert_eq!(stats.unqualified, 1);
        assert!(!stats.ignored);
    }

    #[test]
    fn cte_body_is_walked_and_cte_name_skipped() {
        let parsed = SqlParser::new()
            .parse("WITH w AS (SELECT * FROM db1.t1) SELECT * FROM w")
            .unwrap();
        let (tables, stats) = SqlAstWalker::new().table_refs(&parsed);

        assert_eq!(tables, vec![TableRef::new("db1", "t1")]);
        assert_eq!(stats.unqualified, 1);
    }

    #[test]
    fn union_branches_are_walked() {
        assert_eq!(
            keys("SELECT * FROM db1.a UNION SELECT * FROM db1.b"),
            vec!["db1.a", "db1.b"]
        );
    }

    #[test]
    fn chained_set_operations() {
        assert_eq!(
            keys("SELECT id FROM s.a UNION ALL SELECT id FROM s.b EXCEPT SELECT id FROM s.c INTERSECT SELECT id FROM s.d"),
            vec!["s.a", "s.b", "s.c", "s.d"]
        );
    }

    #[test]
    fn joins_are_walked_in_order() {
        assert_eq!(
            keys("SELECT * FROM shop.orders o JOIN shop.users u ON o.user_id = u.id LEFT JOIN shop.payments p ON p.order_id = o.id"),
            vec!["shop.orders", "shop.users", "shop.payments"]
        );
    }

    #[test]
    fn nested_join_is_flattened() {
        assert_eq!(
            keys("SELECT * FROM (shop.orders o JOIN shop.users u ON o.user_id = u.id)"),
            vec!["shop.orders", "shop.users"]
        );
    }

    #[test]
    fn body_before_ctes() {
        assert_eq!(
            keys("WITH a AS (SELECT * FROM s.cte_a), b AS (SELECT * FROM s.cte_b) SELECT * FROM s.main, a, b"),
            vec!["s.main", "s.cte_a", "s.cte_b"]
        );
    }

    #[test]
    fn nested_ctes() {
        let sql = r#"
            WITH outer_cte AS (
                WITH inner_cte AS (SELECT * FROM raw.events)
                SELECT * FROM inner_cte JOIN raw.sessions s ON true
            )
            SELECT * FROM outer_cte
        "#;
        assert_eq!(keys(sql), vec!["raw.sessions", "raw.events"]);
    }

    #[test]
    fn parenthesized_union_branch_with_its_own_cte() {
        let sql = "SELECT * FROM s.a UNION (WITH x AS (SELECT * FROM s.b) SELECT * FROM x)";
        assert_eq!(keys(sql), vec!["s.a", "s.b"]);
    }

    #[test]
    fn quoting_is_normalized() {
        assert_eq!(
            keys(r#"SELECT * FROM "db1"."orders" UNION SELECT * FROM db1.orders"#),
            vec!["db1.orders", "db1.orders"]
        );
    }

    #[test]
    fn three_part_names_keep_full_qualifier() {
        let parsed = SqlParser::new().parse("SELECT * FROM warehouse.shop.orders").unwrap();
        let (tables, _) = SqlAstWalker::new().table_refs(&parsed);

        assert_eq!(tables, vec![TableRef::new("warehouse.shop", "orders")]);
        assert_eq!(tables[0].key(), "warehouse.shop.orders");
    }

    #[test]
    fn derived_tables_skipped_by_default() {
        let parsed = SqlParser::new()
            .parse("SELECT * FROM (SELECT * FROM shop.orders) o")
            .unwrap();
        let (tables, stats) = SqlAstWalker::new().table_refs(&parsed);

        assert!(tables.is_empty());
        assert_eq!(stats.derived_skipped, 1);
    }

    #[test]
    fn derived_tables_followed_when_enabled() {
        let walker = SqlAstWalker::new().with_derived_tables(true);
        assert_eq!(
            keys_with(&walker, "SELECT * FROM (SELECT * FROM shop.orders) o"),
            vec!["shop.orders"]
        );
    }

    #[test]
    fn multiple_statements_are_ignored() {
        let parsed = SqlParser::new().parse("SELECT * FROM a.b; SELECT * FROM c.d").unwrap();
        let (tables, stats) = SqlAstWalker::new().table_refs(&parsed);

        assert!(tables.is_empty());
        assert!(stats.ignored);
    }

    #[test]
    fn non_query_statement_is_ignored() {
        let parsed = SqlParser::new().parse("DELETE FROM shop.orders").unwrap();
        let (tables, stats) = SqlAstWalker::new().table_refs(&parsed);

        assert!(tables.is_empty());
        assert!(stats.ignored);
    }

    #[test]
    fn values_body_reads_nothing() {
        assert!(keys("VALUES (1, 2)").is_empty());
    }

    #[test]
    fn long_union_chain_is_walked_without_limit() {
        let sql = (0..300)
            .map(|i| format!("SELECT id FROM s.t{}", i))
            .collect::<Vec<_>>()
            .join(" UNION ALL ");
        let parsed = SqlParser::new().parse(&sql).unwrap();
        let (tables, stats) = SqlAstWalker::new().table_refs(&parsed);

        assert_eq!(tables.len(), 300);
        assert_eq!(tables[0], TableRef::new("s", "t0"));
        assert_eq!(tables[299], TableRef::new("s", "t299"));
        assert!(!stats.truncated);
    }

    #[test]
    fn depth_limit_truncates() {
        let walker = SqlAstWalker::new().with_max_depth(0);
        let parsed = SqlParser::new()
            .parse("WITH w AS (SELECT * FROM s.inner_t) SELECT * FROM s.outer_t")
            .unwrap();
        let (tables, stats) = walker.table_refs(&parsed);

        assert_eq!(tables, vec![TableRef::new("s", "outer_t")]);
        assert!(stats.truncated);
    }
}
