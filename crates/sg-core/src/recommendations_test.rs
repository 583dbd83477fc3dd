use super::*;
use crate::classifier::TableMetadata;
use crate::config::SeedingOptions;
use crate::seeding_order::SeedingOrderCalculator;
use crate::test_utils::{fk, graph_of, graph_with_metadata};

fn recommend(graph: &DependencyGraph) -> Vec<String> {
    let order = SeedingOrderCalculator::new(&SeedingOptions::default())
        .calculate(graph)
        .unwrap();
    generate(graph, &order)
}

#[test]
fn test_empty_graph_has_no_recommendations() {
    let graph = DependencyGraph::empty();
    assert!(generate(&graph, &SeedingOrderResult::default()).is_empty());
}

#[test]
fn test_simple_graph_gets_one_summary() {
    let graph = graph_of(
        &["users", "posts"],
        vec![fk("posts_user_fk", "posts", "user_id", "users", false)],
    );
    let recommendations = recommend(&graph);
    assert_eq!(recommendations.len(), 1);
    assert!(recommendations[0].contains("2 phase(s)"));
}

#[test]
fn test_resolved_cycle_mentions_update() {
    let graph = graph_of(
        &["a", "b"],
        vec![
            fk("a_b_fk", "a", "b_id", "b", true),
            fk("b_a_fk", "b", "a_id", "a", false),
        ],
    );
    let recommendations = recommend(&graph);
    assert!(recommendations
        .iter()
        .any(|r| r.starts_with("1 circular dependency resolved") && r.contains("UPDATE")));
}

#[test]
fn test_unresolved_cycle_names_path() {
    let graph = graph_of(
        &["x", "y"],
        vec![
            fk("x_y_fk", "x", "y_id", "y", false),
            fk("y_x_fk", "y", "x_id", "x", false),
        ],
    );
    let recommendations = recommend(&graph);
    assert!(recommendations.iter().any(|r| r.contains("x -> y -> x")));
}

#[test]
fn test_deep_chain() {
    let tables = ["t1", "t2", "t3", "t4", "t5", "t6"];
    let edges = (2..=6)
        .map(|i| {
            fk(
                &format!("f{}", i),
                &format!("t{}", i),
                "parent_id",
                &format!("t{}", i - 1),
                false,
            )
        })
        .collect();
    let recommendations = recommend(&graph_of(&tables, edges));
    assert!(recommendations.iter().any(|r| r.contains("5 levels deep")));
}

#[test]
fn test_junction_and_tenant_tables() {
    let graph = graph_with_metadata(
        &[
            (
                "accounts",
                TableMetadata {
                    is_tenant_scoped: true,
                    ..TableMetadata::default()
                },
            ),
            ("tags", TableMetadata::default()),
            (
                "account_tags",
                TableMetadata {
                    is_junction_table: true,
                    ..TableMetadata::default()
                },
            ),
        ],
        vec![
            fk("at_account_fk", "account_tags", "account_id", "accounts", false),
            fk("at_tag_fk", "account_tags", "tag_id", "tags", false),
        ],
    );
    let recommendations = recommend(&graph);
    assert!(recommendations.iter().any(|r| r.contains("(account_tags)")));
    assert!(recommendations
        .iter()
        .any(|r| r.starts_with("1 tenant-scoped table(s)")));
}

#[test]
fn test_low_confidence() {
    let graph = graph_of(
        &["orphan"],
        vec![fk("orphan_ghost_fk", "orphan", "ghost_id", "ghost", false)],
    );
    let recommendations = recommend(&graph);
    assert!(recommendations.iter().any(|r| r.contains("confidence is 0.00")));
}

#[test]
fn test_isolated_tables_dominate() {
    let graph = graph_of(
        &["a", "b", "c", "d", "e"],
        vec![fk("b_a", "b", "a_id", "a", false)],
    );
    let recommendations = recommend(&graph);
    assert!(recommendations.iter().any(|r| r.starts_with("3 of 5 tables")));
}
