//! Phase-based seeding order
//!
//! Kahn's algorithm over table keys, emitting every zero in-degree table of an
//! iteration as one phase. Edges the cycle resolver ignored do not count
//! toward in-degree.

use crate::config::SeedingOptions;
use crate::cycles::{CycleResolution, CycleResolver, DeferredRelationship};
use crate::error::{CoreError, CoreResult};
use crate::graph::{DependencyGraph, TableNode};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Seconds per table and per phase used for the time estimate
const SECONDS_PER_TABLE: u64 = 5;
const SECONDS_PER_PHASE: u64 = 2;

/// Overall difficulty of seeding in the computed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderComplexity {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SeedingMetadata {
    pub total_phases: usize,
    pub estimated_seeding_time: String,
    pub complexity: OrderComplexity,
    pub recommendations: Vec<String>,
}

/// The computed insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SeedingOrderResult {
    /// Phases flattened in order
    pub seeding_order: Vec<String>,
    /// Tables within a phase only depend on tables of earlier phases
    pub phases: Vec<Vec<String>>,
    pub circular_dependencies_resolved: Vec<DeferredRelationship>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub metadata: SeedingMetadata,
}

impl SeedingOrderResult {
    /// 1-based phase of `table`, if it is ordered at all
    pub fn phase_of(&self, table: &str) -> Option<usize> {
        self.phases
            .iter()
            .position(|phase| phase.iter().any(|t| t == table))
            .map(|i| i + 1)
    }
}

/// Computes [`SeedingOrderResult`]s for dependency graphs
#[derive(Debug, Clone, Default)]
pub struct SeedingOrderCalculator {
    options: SeedingOptions,
}

impl SeedingOrderCalculator {
    pub fn new(options: &SeedingOptions) -> Self {
        Self {
            options: options.clone(),
        }
    }

    /// Resolve the graph's cycles and order its tables
    pub fn calculate(&self, graph: &DependencyGraph) -> CoreResult<SeedingOrderResult> {
        let resolution = CycleResolver::resolve(graph, &self.options);
        self.calculate_with(graph, &resolution)
    }

    /// Order the graph's tables using an existing cycle resolution
    pub fn calculate_with(
        &self,
        graph: &DependencyGraph,
        resolution: &CycleResolution,
    ) -> CoreResult<SeedingOrderResult> {
        let inner = graph.inner();
        let node_count = inner.node_count();

        // parents[n]: distinct tables n waits for; children is the reverse view
        let mut parents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); node_count];
        let mut children: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); node_count];
        for edge in inner.edge_references() {
            if resolution.ignored_edges.contains(&edge.id()) {
                continue;
            }
            let (child, parent) = (edge.source().index(), edge.target().index());
            if child == parent {
                if resolution.blocks_self(&inner[edge.source()].key) {
                    parents[child].insert(child);
                }
                continue;
            }
            parents[child].insert(parent);
            children[parent].insert(child);
        }

        let mut in_degree: Vec<usize> = parents.iter().map(BTreeSet::len).collect();
        let mut placed = vec![false; node_count];
        let mut phases: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = (0..node_count).filter(|&n| in_degree[n] == 0).collect();

        while !current.is_empty() {
            let mut next = Vec::new();
            for &node in &current {
                placed[node] = true;
                for &child in &children[node] {
                    in_degree[child] -= 1;
                    if in_degree[child] == 0 {
                        next.push(child);
                    }
                }
            }
            phases.push(current);
            current = next;
        }

        if self.options.group_by_tenant {
            phases = self.group_tenant_tables(graph, phases, &children);
        }

        let key = |n: usize| inner[NodeIndex::new(n)].key.clone();
        let mut ordered: Vec<Vec<String>> = phases
            .iter()
            .map(|phase| self.sort_phase(graph, phase))
            .collect();

        let mut warnings = resolution.warnings.clone();
        let deadlocked: Vec<String> = {
            let mut keys: Vec<String> = (0..node_count).filter(|&n| !placed[n]).map(key).collect();
            keys.sort();
            keys
        };
        if !deadlocked.is_empty() {
            let message = format!(
                "Could not find a dependency-safe position for {} table(s) ({}); they are seeded last on a best-effort basis",
                deadlocked.len(),
                deadlocked.join(", ")
            );
            log::warn!("{}", message);
            warnings.push(message);
            ordered.push(deadlocked.clone());
        }

        let seeding_order: Vec<String> = ordered.iter().flatten().cloned().collect();
        check_completeness(graph, &seeding_order)?;

        let metadata = SeedingMetadata {
            total_phases: ordered.len(),
            estimated_seeding_time: estimate_seeding_time(seeding_order.len(), ordered.len()),
            complexity: order_complexity(graph, resolution, seeding_order.len(), ordered.len()),
            recommendations: phase_recommendations(&ordered, resolution, &deadlocked),
        };

        log::debug!(
            "Computed seeding order: {} tables in {} phases",
            seeding_order.len(),
            metadata.total_phases
        );

        Ok(SeedingOrderResult {
            seeding_order,
            phases: ordered,
            circular_dependencies_resolved: resolution.deferred.clone(),
            warnings,
            errors: resolution.errors.clone(),
            metadata,
        })
    }

    /// Alphabetical, with junction tables last and tenant-scoped tables together
    fn sort_phase(&self, graph: &DependencyGraph, phase: &[usize]) -> Vec<String> {
        let inner = graph.inner();
        let mut nodes: Vec<_> = phase
            .iter()
            .map(|&n| &inner[NodeIndex::new(n)])
            .collect();
        nodes.sort_by(|a, b| {
            let rank = |node: &TableNode| {
                (
                    self.options.prioritize_junction_tables && node.metadata.is_junction_table,
                    self.options.group_by_tenant && node.metadata.is_tenant_scoped,
                )
            };
            (rank(a), &a.key).cmp(&(rank(b), &b.key))
        });
        nodes.into_iter().map(|n| n.key.clone()).collect()
    }

    /// Move tenant-scoped tables toward the phase holding most of them.
    ///
    /// A table only moves later, and never into or past the phase of a table
    /// that depends on it. Phases left empty are removed.
    fn group_tenant_tables(
        &self,
        graph: &DependencyGraph,
        mut phases: Vec<Vec<usize>>,
        children: &[BTreeSet<usize>],
    ) -> Vec<Vec<usize>> {
        let inner = graph.inner();
        let is_tenant = |n: usize| inner[NodeIndex::new(n)].metadata.is_tenant_scoped;

        let counts: Vec<usize> = phases
            .iter()
            .map(|phase| phase.iter().filter(|&&n| is_tenant(n)).count())
            .collect();
        let Some(target) = counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .max_by(|(i, a), (j, b)| a.cmp(b).then(j.cmp(i)))
            .map(|(i, _)| i)
        else {
            return phases;
        };

        let mut phase_of: BTreeMap<usize, usize> = BTreeMap::new();
        for (i, phase) in phases.iter().enumerate() {
            for &n in phase {
                phase_of.insert(n, i);
            }
        }

        for p in (0..target).rev() {
            let movers: Vec<usize> = phases[p].iter().copied().filter(|&n| is_tenant(n)).collect();
            for node in movers {
                let limit = children[node]
                    .iter()
                    .filter_map(|c| phase_of.get(c))
                    .min()
                    .map(|&first_child| first_child.saturating_sub(1))
                    .unwrap_or(target);
                let destination = limit.min(target);
                if destination <= p {
                    continue;
                }
                phases[p].retain(|&n| n != node);
                phases[destination].push(node);
                phase_of.insert(node, destination);
            }
        }

        phases.retain(|phase| !phase.is_empty());
        phases
    }
}

fn check_completeness(graph: &DependencyGraph, order: &[String]) -> CoreResult<()> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for table in order {
        *seen.entry(table.as_str()).or_default() += 1;
    }
    let missing: Vec<String> = graph
        .nodes()
        .filter(|n| !seen.contains_key(n.key.as_str()))
        .map(|n| n.key.clone())
        .collect();
    let duplicated: Vec<&str> = seen
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(table, _)| *table)
        .collect();

    if missing.is_empty() && duplicated.is_empty() && seen.len() == graph.len() {
        return Ok(());
    }
    Err(CoreError::IncompleteSeedingOrder {
        missing: missing.join(", "),
        duplicated: duplicated.join(", "),
    })
}

/// `tables * 5s + phases * 2s`, rendered for humans
pub fn estimate_seeding_time(tables: usize, phases: usize) -> String {
    if tables == 0 {
        return "0 seconds".to_string();
    }
    let seconds = tables as u64 * SECONDS_PER_TABLE + phases as u64 * SECONDS_PER_PHASE;
    match seconds {
        s if s < 60 => "< 1 minute".to_string(),
        s if s < 3600 => plural(s.div_ceil(60), "minute"),
        s => plural(s.div_ceil(3600), "hour"),
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("~1 {}", unit)
    } else {
        format!("~{} {}s", n, unit)
    }
}

fn order_complexity(
    graph: &DependencyGraph,
    resolution: &CycleResolution,
    tables: usize,
    phases: usize,
) -> OrderComplexity {
    if !resolution.unresolved.is_empty() || phases > 6 || tables > 50 {
        OrderComplexity::High
    } else if !graph.cycles().is_empty() || phases > 3 || tables > 15 {
        OrderComplexity::Medium
    } else {
        OrderComplexity::Low
    }
}

fn phase_recommendations(
    phases: &[Vec<String>],
    resolution: &CycleResolution,
    deadlocked: &[String],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    for (i, phase) in phases.iter().enumerate() {
        if phase.len() > 1 && !(i + 1 == phases.len() && phase.as_slice() == deadlocked) {
            recommendations.push(format!(
                "Phase {}: {} tables can be seeded in parallel ({})",
                i + 1,
                phase.len(),
                phase.join(", ")
            ));
        }
    }

    if !resolution.deferred.is_empty() {
        let columns: Vec<String> = resolution
            .deferred
            .iter()
            .map(|d| format!("{}.{}", d.from_table, d.from_column))
            .collect();
        recommendations.push(format!(
            "Insert NULL for {} deferred foreign key(s) ({}) and run UPDATE statements once all phases are seeded",
            columns.len(),
            columns.join(", ")
        ));
    }

    if !deadlocked.is_empty() {
        recommendations.push(format!(
            "Seed {} with constraints disabled or inside a deferred transaction; no safe order exists for them",
            deadlocked.join(", ")
        ));
    }

    recommendations
}

#[cfg(test)]
#[path = "seeding_order_test.rs"]
mod tests;
