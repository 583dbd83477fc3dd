//! Dependency graph building
//!
//! Nodes are tables, edges are foreign keys pointing from the referencing
//! (dependent) table to the referenced table. The builder accumulates nodes
//! and edges; [`DependencyGraphBuilder::build`] hands back a frozen
//! [`DependencyGraph`] with cycles, depth and confidence already computed.

use crate::classifier::TableMetadata;
use crate::cycles::{detect_cycles, DetectedCycle};
use crate::relationship::RelationshipEdge;
use crate::table_name::{table_key, DEFAULT_SCHEMA};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A table in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNode {
    /// Graph key (`table`, or `schema.table` outside the default schema)
    pub key: String,
    pub schema: String,
    pub table: String,
    pub metadata: TableMetadata,
}

/// Summary statistics computed at build time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// Longest dependency chain (in edges), ignoring edges inside cycles
    pub max_depth: usize,
    /// 1.0 when every submitted edge was kept and fully named
    pub confidence: f64,
    pub warnings: Vec<String>,
    pub dropped_edges: usize,
}

impl Default for GraphMetadata {
    fn default() -> Self {
        Self {
            max_depth: 0,
            confidence: 1.0,
            warnings: Vec::new(),
            dropped_edges: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingEdge {
    from: String,
    to: String,
    relationship: RelationshipEdge,
}

/// Accumulates tables and foreign keys before freezing them into a graph
#[derive(Debug, Clone)]
pub struct DependencyGraphBuilder {
    default_schema: String,
    detect_self_references: bool,
    nodes: BTreeMap<String, TableNode>,
    edges: Vec<PendingEdge>,
}

impl DependencyGraphBuilder {
    pub fn new() -> Self {
        Self {
            default_schema: DEFAULT_SCHEMA.to_string(),
            detect_self_references: true,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    /// Set the schema whose tables are keyed by bare name
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = schema.into();
        self
    }

    /// Whether self-referencing foreign keys are reported as cycles
    pub fn with_self_references(mut self, detect: bool) -> Self {
        self.detect_self_references = detect;
        self
    }

    /// Add a table, returning its graph key. Re-adding a table replaces its metadata.
    pub fn add_node(&mut self, table: &str, schema: &str, metadata: TableMetadata) -> String {
        let key = table_key(schema, table, &self.default_schema);
        self.nodes.insert(
            key.clone(),
            TableNode {
                key: key.clone(),
                schema: schema.to_string(),
                table: table.to_string(),
                metadata,
            },
        );
        key
    }

    /// Add a dependency edge (`from` depends on `to`), addressed by graph key.
    ///
    /// Endpoints are checked at build time, so nodes may be added in any order.
    pub fn add_edge(&mut self, from: &str, to: &str, relationship: RelationshipEdge) {
        self.edges.push(PendingEdge {
            from: from.to_string(),
            to: to.to_string(),
            relationship,
        });
    }

    /// Add a foreign key, deriving both endpoint keys from its schemas
    pub fn add_relationship(&mut self, relationship: RelationshipEdge) {
        let from = table_key(
            &relationship.schema,
            &relationship.from_table,
            &self.default_schema,
        );
        let to = table_key(
            &relationship.to_schema,
            &relationship.to_table,
            &self.default_schema,
        );
        self.add_edge(&from, &to, relationship);
    }

    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    /// Freeze the accumulated state into a graph. Calling this twice yields equal graphs.
    pub fn build(&self) -> DependencyGraph {
        let mut graph: DiGraph<TableNode, RelationshipEdge> =
            DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut node_map = HashMap::with_capacity(self.nodes.len());

        for (key, node) in &self.nodes {
            let idx = graph.add_node(node.clone());
            node_map.insert(key.clone(), idx);
        }

        let mut pending: Vec<&PendingEdge> = self.edges.iter().collect();
        pending.sort_by(|a, b| {
            (&a.from, &a.to, &a.relationship.constraint_name, &a.relationship.from_column).cmp(&(
                &b.from,
                &b.to,
                &b.relationship.constraint_name,
                &b.relationship.from_column,
            ))
        });

        let mut warnings = Vec::new();
        let mut dropped = 0usize;
        let mut ambiguous = 0usize;

        for edge in pending {
            match (node_map.get(&edge.from), node_map.get(&edge.to)) {
                (Some(&from), Some(&to)) => {
                    if edge.relationship.is_ambiguous() {
                        ambiguous += 1;
                    }
                    graph.add_edge(from, to, edge.relationship.clone());
                }
                (from, to) => {
                    let missing: Vec<&str> = [(from, &edge.from), (to, &edge.to)]
                        .into_iter()
                        .filter(|(idx, _)| idx.is_none())
                        .map(|(_, key)| key.as_str())
                        .collect();
                    let message = format!(
                        "Dropped foreign key '{}' ({} -> {}): table '{}' is not in the analyzed schema",
                        edge.relationship.constraint_name,
                        edge.from,
                        edge.to,
                        missing.join("', '")
                    );
                    log::warn!("{}", message);
                    warnings.push(message);
                    dropped += 1;
                }
            }
        }

        let total = graph.edge_count() + dropped;
        let confidence = if total == 0 {
            1.0
        } else {
            let kept = graph.edge_count() as f64 - 0.5 * ambiguous as f64;
            (kept / total as f64).clamp(0.0, 1.0)
        };

        let cycle_details = detect_cycles(&graph, self.detect_self_references);
        let cycles = cycle_details.iter().map(|c| c.tables.clone()).collect();
        let max_depth = longest_acyclic_path(&graph);

        DependencyGraph {
            graph,
            node_map,
            cycles,
            cycle_details,
            metadata: GraphMetadata {
                max_depth,
                confidence,
                warnings,
                dropped_edges: dropped,
            },
            default_schema: self.default_schema.clone(),
            detect_self_references: self.detect_self_references,
        }
    }
}

impl Default for DependencyGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Longest dependency path over edges that do not lie inside a strongly
/// connected component. With those removed the graph is a DAG.
fn longest_acyclic_path(graph: &DiGraph<TableNode, RelationshipEdge>) -> usize {
    let mut component = vec![0usize; graph.node_count()];
    for (i, scc) in tarjan_scc(graph).into_iter().enumerate() {
        for idx in scc {
            component[idx.index()] = i;
        }
    }

    let mut successors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); graph.node_count()];
    for edge in graph.edge_references() {
        let (s, t) = (edge.source().index(), edge.target().index());
        if component[s] != component[t] {
            successors[s].insert(t);
        }
    }

    // Cross-component edges form a DAG; settle each node once all of its
    // successors are settled
    let mut remaining: Vec<usize> = successors.iter().map(BTreeSet::len).collect();
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); graph.node_count()];
    for (node, next) in successors.iter().enumerate() {
        for &t in next {
            predecessors[t].push(node);
        }
    }

    let mut depth = vec![0usize; graph.node_count()];
    let mut ready: Vec<usize> = (0..graph.node_count())
        .filter(|&n| remaining[n] == 0)
        .collect();
    while let Some(node) = ready.pop() {
        for &p in &predecessors[node] {
            depth[p] = depth[p].max(depth[node] + 1);
            remaining[p] -= 1;
            if remaining[p] == 0 {
                ready.push(p);
            }
        }
    }

    depth.into_iter().max().unwrap_or(0)
}

/// A frozen dependency graph of tables and foreign keys
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<TableNode, RelationshipEdge>,
    node_map: HashMap<String, NodeIndex>,
    cycles: Vec<Vec<String>>,
    cycle_details: Vec<DetectedCycle>,
    metadata: GraphMetadata,
    default_schema: String,
    detect_self_references: bool,
}

impl DependencyGraph {
    /// A graph with no tables
    pub fn empty() -> Self {
        DependencyGraphBuilder::new().build()
    }

    /// Tables in key order
    pub fn nodes(&self) -> impl Iterator<Item = &TableNode> {
        self.graph.node_weights()
    }

    /// Foreign keys in `(from, to, constraint)` order
    pub fn edges(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.graph.edge_weights()
    }

    pub fn node(&self, key: &str) -> Option<&TableNode> {
        self.node_map.get(key).map(|&idx| &self.graph[idx])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.node_map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All table keys in key order
    pub fn table_keys(&self) -> Vec<String> {
        self.nodes().map(|n| n.key.clone()).collect()
    }

    /// Detected cycles, each as the ordered list of tables along the cycle
    pub fn cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    pub fn cycle_details(&self) -> &[DetectedCycle] {
        &self.cycle_details
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    /// Tables that `key` references (its parents)
    pub fn dependencies_of(&self, key: &str) -> Vec<String> {
        self.neighbors(key, Direction::Outgoing)
    }

    /// Tables that reference `key` (its children)
    pub fn dependents_of(&self, key: &str) -> Vec<String> {
        self.neighbors(key, Direction::Incoming)
    }

    fn neighbors(&self, key: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.node_map.get(key) else {
            return Vec::new();
        };
        let keys: BTreeSet<String> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| match direction {
                Direction::Outgoing => self.graph[e.target()].key.clone(),
                Direction::Incoming => self.graph[e.source()].key.clone(),
            })
            .collect();
        keys.into_iter().collect()
    }

    /// Restrict the graph to `tables`, keeping only edges with both endpoints
    /// inside the set. Cycles, depth and confidence are recomputed.
    pub fn subgraph(&self, tables: &[&str]) -> DependencyGraph {
        let mut builder = DependencyGraphBuilder::new()
            .with_default_schema(self.default_schema.clone())
            .with_self_references(self.detect_self_references);

        let keep: BTreeSet<&str> = tables
            .iter()
            .copied()
            .filter(|t| self.node_map.contains_key(*t))
            .collect();

        for key in &keep {
            if let Some(node) = self.node(key) {
                builder.nodes.insert(node.key.clone(), node.clone());
            }
        }

        for edge in self.graph.edge_references() {
            let from = &self.graph[edge.source()].key;
            let to = &self.graph[edge.target()].key;
            if keep.contains(from.as_str()) && keep.contains(to.as_str()) {
                builder.add_edge(from, to, edge.weight().clone());
            }
        }

        builder.build()
    }

    // Index-level access for the cycle resolver and order calculator.

    pub(crate) fn inner(&self) -> &DiGraph<TableNode, RelationshipEdge> {
        &self.graph
    }

    pub(crate) fn index_of(&self, key: &str) -> Option<NodeIndex> {
        self.node_map.get(key).copied()
    }

    pub(crate) fn detects_self_references(&self) -> bool {
        self.detect_self_references
    }

    pub(crate) fn edges_between(&self, from: NodeIndex, to: NodeIndex) -> Vec<EdgeIndex> {
        self.graph
            .edges_connecting(from, to)
            .map(|e| e.id())
            .collect()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for DependencyGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nodes: Vec<&TableNode> = self.nodes().collect();
        let edges: Vec<&RelationshipEdge> = self.edges().collect();
        let mut state = serializer.serialize_struct("DependencyGraph", 4)?;
        state.serialize_field("nodes", &nodes)?;
        state.serialize_field("edges", &edges)?;
        state.serialize_field("cycles", &self.cycles)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.end()
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
