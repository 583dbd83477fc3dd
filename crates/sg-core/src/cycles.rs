//! Cycle detection and resolution
//!
//! Detection runs on the index arena of a freshly built graph. Parallel
//! foreign keys between the same two tables form one *hop*; a cycle is broken
//! by removing a whole hop, since every edge in it would otherwise still
//! force the order.

use crate::config::SeedingOptions;
use crate::graph::{DependencyGraph, TableNode};
use crate::relationship::RelationshipEdge;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// One detected circular dependency and the hop chosen to break it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedCycle {
    /// Tables along the cycle, starting at the alphabetically smallest
    pub tables: Vec<String>,
    /// Foreign keys of the chosen break hop
    pub break_edges: Vec<RelationshipEdge>,
    /// Whether every break edge is nullable or deferrable
    pub resolvable: bool,
    pub is_self_reference: bool,
    #[serde(skip)]
    pub(crate) break_edge_ids: Vec<EdgeIndex>,
}

impl DetectedCycle {
    /// `a -> b -> a`
    pub fn path(&self) -> String {
        let mut parts: Vec<&str> = self.tables.iter().map(String::as_str).collect();
        if let Some(first) = self.tables.first() {
            parts.push(first);
        }
        parts.join(" -> ")
    }

    fn break_constraints(&self) -> String {
        self.break_edges
            .iter()
            .map(|e| format!("{}.{}", e.from_table, e.from_column))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Preference order for break hops: all nullable, then all nullable-or-deferrable
fn edge_rank(edge: &RelationshipEdge) -> u8 {
    if edge.is_nullable {
        0
    } else if edge.is_breakable() {
        1
    } else {
        2
    }
}

type Hop = (usize, usize);

/// Find every cycle in `graph`, choosing a break hop for each.
///
/// Repeatedly takes the strongly connected component holding the
/// alphabetically smallest cyclic table, extracts the shortest cycle through
/// that table, removes its best hop, and starts over until no cycle remains.
pub(crate) fn detect_cycles(
    graph: &DiGraph<TableNode, RelationshipEdge>,
    include_self_references: bool,
) -> Vec<DetectedCycle> {
    let mut hops: BTreeMap<Hop, Vec<EdgeIndex>> = BTreeMap::new();
    for edge in graph.edge_references() {
        let hop = (edge.source().index(), edge.target().index());
        if hop.0 == hop.1 && !include_self_references {
            continue;
        }
        hops.entry(hop).or_default().push(edge.id());
    }

    let mut active: BTreeSet<Hop> = hops.keys().copied().collect();
    let mut cycles = Vec::new();

    while let Some(path) = find_cycle(graph, &active) {
        let candidates: Vec<Hop> = (0..path.len())
            .map(|i| (path[i], path[(i + 1) % path.len()]))
            .collect();

        let Some((best, rank)) = candidates
            .iter()
            .map(|hop| {
                let edges = &hops[hop];
                let rank = edges
                    .iter()
                    .map(|&e| edge_rank(&graph[e]))
                    .max()
                    .unwrap_or(2);
                let min_name = edges
                    .iter()
                    .map(|&e| graph[e].constraint_name.as_str())
                    .min()
                    .unwrap_or("");
                let from = graph[NodeIndex::new(hop.0)].key.as_str();
                let to = graph[NodeIndex::new(hop.1)].key.as_str();
                ((rank, min_name, from, to), *hop)
            })
            .min()
            .map(|((rank, ..), hop)| (hop, rank))
        else {
            break;
        };

        active.remove(&best);

        let break_edge_ids = hops[&best].clone();
        let cycle = DetectedCycle {
            tables: path
                .iter()
                .map(|&n| graph[NodeIndex::new(n)].key.clone())
                .collect(),
            break_edges: break_edge_ids.iter().map(|&e| graph[e].clone()).collect(),
            resolvable: rank < 2,
            is_self_reference: path.len() == 1,
            break_edge_ids,
        };
        log::debug!(
            "Detected circular dependency {} (break at {})",
            cycle.path(),
            cycle.break_constraints()
        );
        cycles.push(cycle);
    }

    cycles
}

/// Shortest cycle through the smallest-keyed table of any cyclic component
fn find_cycle(
    graph: &DiGraph<TableNode, RelationshipEdge>,
    active: &BTreeSet<Hop>,
) -> Option<Vec<usize>> {
    let mut scratch: DiGraph<(), ()> =
        DiGraph::with_capacity(graph.node_count(), active.len());
    for _ in 0..graph.node_count() {
        scratch.add_node(());
    }
    for &(s, t) in active {
        scratch.add_edge(NodeIndex::new(s), NodeIndex::new(t), ());
    }

    let key = |n: usize| graph[NodeIndex::new(n)].key.as_str();

    let start_and_members = tarjan_scc(&scratch)
        .into_iter()
        .filter(|scc| scc.len() > 1 || active.contains(&(scc[0].index(), scc[0].index())))
        .map(|scc| {
            let members: HashSet<usize> = scc.iter().map(|n| n.index()).collect();
            let start = members
                .iter()
                .copied()
                .min_by(|a, b| key(*a).cmp(key(*b)))
                .unwrap_or(scc[0].index());
            (start, members)
        })
        .min_by(|(a, _), (b, _)| key(*a).cmp(key(*b)))?;

    let (start, members) = start_and_members;
    let successors = |n: usize| -> Vec<usize> {
        let mut next: Vec<usize> = active
            .range((n, 0)..=(n, usize::MAX))
            .map(|&(_, t)| t)
            .filter(|t| members.contains(t))
            .collect();
        next.sort_by(|a, b| key(*a).cmp(key(*b)));
        next
    };

    let mut parent: HashMap<usize, usize> = HashMap::new();
    let mut visited: HashSet<usize> = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for next in successors(current) {
            if next == start {
                let mut path = vec![current];
                let mut node = current;
                while node != start {
                    node = parent[&node];
                    path.push(node);
                }
                // `path` ends with `start` unless the cycle is a self-loop
                if path.len() > 1 {
                    path.pop();
                    path.reverse();
                    path.insert(0, start);
                }
                return Some(path);
            }
            if visited.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}

/// A foreign key left NULL during insert and patched by a follow-up UPDATE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredRelationship {
    pub constraint_name: String,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    /// The cycle this deferral breaks
    pub cycle: Vec<String>,
}

/// How the detected cycles are handled for one ordering run
#[derive(Debug, Clone, Default)]
pub struct CycleResolution {
    /// Edges that do not constrain the order
    pub ignored_edges: HashSet<EdgeIndex>,
    pub deferred: Vec<DeferredRelationship>,
    pub unresolved: Vec<DetectedCycle>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl CycleResolution {
    /// Whether a self-referencing table still waits on itself
    pub(crate) fn blocks_self(&self, key: &str) -> bool {
        self.unresolved.iter().any(|c| {
            c.is_self_reference && c.tables.first().map(String::as_str) == Some(key)
        })
    }
}

/// Turns detected cycles into deferred edges according to [`SeedingOptions`]
pub struct CycleResolver;

impl CycleResolver {
    pub fn resolve(graph: &DependencyGraph, options: &SeedingOptions) -> CycleResolution {
        let mut resolution = CycleResolution::default();

        if !options.respect_circular_dependencies {
            Self::break_first_hops(graph, &mut resolution);
            return resolution;
        }

        for cycle in graph.cycle_details() {
            if cycle.resolvable {
                for (&id, edge) in cycle.break_edge_ids.iter().zip(&cycle.break_edges) {
                    resolution.ignored_edges.insert(id);
                    let (from, to) = match graph.inner().edge_endpoints(id) {
                        Some((s, t)) => (
                            graph.inner()[s].key.clone(),
                            graph.inner()[t].key.clone(),
                        ),
                        None => (edge.from_table.clone(), edge.to_table.clone()),
                    };
                    resolution.deferred.push(DeferredRelationship {
                        constraint_name: edge.constraint_name.clone(),
                        from_table: from,
                        from_column: edge.from_column.clone(),
                        to_table: to,
                        to_column: edge.to_column.clone(),
                        cycle: cycle.tables.clone(),
                    });
                }
                log::debug!(
                    "Deferring {} to break {}",
                    cycle.break_constraints(),
                    cycle.path()
                );
            } else {
                let message = format!(
                    "Unresolved circular dependency {}: no nullable or deferrable foreign key to defer (candidate: {})",
                    cycle.path(),
                    cycle.break_constraints()
                );
                log::error!("{}", message);
                resolution.errors.push(message);
                resolution.unresolved.push(cycle.clone());
            }
        }

        resolution
    }

    /// Ignore the first hop of each remaining cycle, without deferral
    /// bookkeeping, until the hop graph is acyclic
    fn break_first_hops(graph: &DependencyGraph, resolution: &mut CycleResolution) {
        let inner = graph.inner();
        let mut active: BTreeSet<Hop> = inner
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
            .filter(|(s, t)| s != t || graph.detects_self_references())
            .collect();
        let key = |n: usize| inner[NodeIndex::new(n)].key.as_str();

        while let Some(path) = find_cycle(inner, &active) {
            let hop = (path[0], path[1 % path.len()]);
            active.remove(&hop);
            resolution.ignored_edges.extend(
                graph.edges_between(NodeIndex::new(hop.0), NodeIndex::new(hop.1)),
            );

            let mut tables: Vec<&str> = path.iter().map(|&n| key(n)).collect();
            tables.push(key(hop.0));
            let message = format!(
                "Circular dependency {} broken at {} -> {} without deferral",
                tables.join(" -> "),
                key(hop.0),
                key(hop.1)
            );
            log::warn!("{}", message);
            resolution.warnings.push(message);
        }
    }
}

#[cfg(test)]
#[path = "cycles_test.rs"]
mod tests;
