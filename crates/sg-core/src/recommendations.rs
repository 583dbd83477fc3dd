//! Human-readable guidance derived from graph facts

use crate::graph::DependencyGraph;
use crate::seeding_order::SeedingOrderResult;

/// Chains deeper than this get a recommendation
const DEEP_CHAIN_DEPTH: usize = 4;
const LOW_CONFIDENCE: f64 = 0.8;

/// Build recommendations for an analyzed graph and its seeding order.
///
/// An empty graph yields none.
pub fn generate(graph: &DependencyGraph, order: &SeedingOrderResult) -> Vec<String> {
    if graph.is_empty() {
        return Vec::new();
    }

    let mut recommendations = Vec::new();

    if !order.circular_dependencies_resolved.is_empty() {
        let cycles = graph.cycle_details().iter().filter(|c| c.resolvable).count();
        recommendations.push(format!(
            "{} circular dependenc{} resolved by deferring {} foreign key(s); insert NULL first and backfill with UPDATE statements after the last phase",
            cycles,
            if cycles == 1 { "y" } else { "ies" },
            order.circular_dependencies_resolved.len()
        ));
    }

    let unresolved: Vec<String> = graph
        .cycle_details()
        .iter()
        .filter(|c| !c.resolvable)
        .map(|c| c.path())
        .collect();
    if !unresolved.is_empty() && !order.errors.is_empty() {
        recommendations.push(format!(
            "Make one foreign key nullable or DEFERRABLE in each of: {}; until then these tables need constraints disabled while seeding",
            unresolved.join("; ")
        ));
    }

    let depth = graph.metadata().max_depth;
    if depth > DEEP_CHAIN_DEPTH {
        recommendations.push(format!(
            "Dependency chains are {} levels deep; seed phase by phase and validate parent rows before moving on",
            depth
        ));
    }

    let junctions: Vec<&str> = graph
        .nodes()
        .filter(|n| n.metadata.is_junction_table)
        .map(|n| n.key.as_str())
        .collect();
    if !junctions.is_empty() {
        recommendations.push(format!(
            "Seed junction tables ({}) with combinations of existing parent rows to avoid duplicate key pairs",
            junctions.join(", ")
        ));
    }

    let tenants = graph.nodes().filter(|n| n.metadata.is_tenant_scoped).count();
    if tenants > 0 {
        recommendations.push(format!(
            "{} tenant-scoped table(s) found; create tenant rows first and keep tenant ids consistent across related rows",
            tenants
        ));
    }

    let confidence = graph.metadata().confidence;
    if confidence < LOW_CONFIDENCE {
        recommendations.push(format!(
            "Relationship confidence is {:.2}; some foreign keys were dropped or lack names, review the warnings before seeding",
            confidence
        ));
    }

    let isolated = graph
        .nodes()
        .filter(|n| {
            graph.dependencies_of(&n.key).is_empty() && graph.dependents_of(&n.key).is_empty()
        })
        .count();
    if graph.len() > 1 && isolated * 2 > graph.len() {
        recommendations.push(format!(
            "{} of {} tables have no foreign key relationships and can be seeded in any order",
            isolated,
            graph.len()
        ));
    }

    if recommendations.is_empty() {
        recommendations.push(format!(
            "Straightforward dependency structure; seed the {} phase(s) in order",
            order.metadata.total_phases
        ));
    }

    recommendations
}

#[cfg(test)]
#[path = "recommendations_test.rs"]
mod tests;
