use super::*;
use crate::test_utils::{builder_of, fk, graph_of};

#[test]
fn test_build_simple_graph() {
    let graph = graph_of(
        &["users", "posts"],
        vec![fk("posts_user_fk", "posts", "user_id", "users", false)],
    );
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.dependencies_of("posts"), vec!["users"]);
    assert_eq!(graph.dependents_of("users"), vec!["posts"]);
    assert!(graph.dependencies_of("users").is_empty());
    assert_eq!(graph.metadata().max_depth, 1);
    assert_eq!(graph.metadata().confidence, 1.0);
    assert!(graph.metadata().warnings.is_empty());
}

#[test]
fn test_nodes_are_in_key_order() {
    let graph = graph_of(&["zeta", "alpha", "mid"], vec![]);
    assert_eq!(graph.table_keys(), vec!["alpha", "mid", "zeta"]);
}

#[test]
fn test_dangling_edge_dropped_with_warning() {
    let graph = graph_of(
        &["orphan"],
        vec![fk("orphan_ghost_fk", "orphan", "ghost_id", "ghost", false)],
    );
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(graph.metadata().dropped_edges, 1);
    assert_eq!(graph.metadata().warnings.len(), 1);
    assert!(graph.metadata().warnings[0].contains("ghost"));
    assert!(graph.metadata().confidence < 1.0);
}

#[test]
fn test_edges_may_be_added_before_nodes() {
    let mut builder = DependencyGraphBuilder::new();
    builder.add_edge("posts", "users", fk("posts_user_fk", "posts", "user_id", "users", false));
    builder.add_node("users", "public", TableMetadata::default());
    builder.add_node("posts", "public", TableMetadata::default());
    let graph = builder.build();
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_build_is_idempotent() {
    let builder = builder_of(
        &["a", "b", "c"],
        vec![
            fk("b_a", "b", "a_id", "a", false),
            fk("c_b", "c", "b_id", "b", true),
            fk("a_c", "a", "c_id", "c", true),
        ],
    );
    let first = builder.build();
    let second = builder.build();
    assert_eq!(first.table_keys(), second.table_keys());
    assert_eq!(first.cycles(), second.cycles());
    assert_eq!(first.metadata(), second.metadata());
    assert_eq!(
        first.edges().collect::<Vec<_>>(),
        second.edges().collect::<Vec<_>>()
    );
}

#[test]
fn test_multiple_edges_between_same_pair_are_distinct() {
    let graph = graph_of(
        &["users", "messages"],
        vec![
            fk("messages_sender_fk", "messages", "sender_id", "users", false),
            fk("messages_recipient_fk", "messages", "recipient_id", "users", false),
        ],
    );
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.dependencies_of("messages"), vec!["users"]);
}

#[test]
fn test_max_depth_chain() {
    let graph = graph_of(
        &["a", "b", "c", "d"],
        vec![
            fk("b_a", "b", "a_id", "a", false),
            fk("c_b", "c", "b_id", "b", false),
            fk("d_c", "d", "c_id", "c", false),
            fk("d_a", "d", "a_id", "a", false),
        ],
    );
    assert_eq!(graph.metadata().max_depth, 3);
}

#[test]
fn test_max_depth_ignores_cycle_edges() {
    // a <-> b, c -> a: only c -> a counts
    let graph = graph_of(
        &["a", "b", "c"],
        vec![
            fk("a_b", "a", "b_id", "b", true),
            fk("b_a", "b", "a_id", "a", false),
            fk("c_a", "c", "a_id", "a", false),
        ],
    );
    assert_eq!(graph.metadata().max_depth, 1);
    assert_eq!(graph.cycles().len(), 1);
}

#[test]
fn test_max_depth_long_chain() {
    let tables: Vec<String> = (0..10_000).map(|i| format!("t{i:05}")).collect();
    let names: Vec<&str> = tables.iter().map(String::as_str).collect();
    let edges = names
        .windows(2)
        .map(|pair| fk(&format!("{}_fk", pair[1]), pair[1], "prev_id", pair[0], false))
        .collect();

    let graph = graph_of(&names, edges);
    assert_eq!(graph.metadata().max_depth, 9_999);
    assert!(graph.cycles().is_empty());
}

#[test]
fn test_confidence_penalizes_ambiguous_edges() {
    let graph = graph_of(
        &["a", "b"],
        vec![
            fk("unknown", "b", "a_id", "a", false),
            fk("b_a_other", "b", "other_a_id", "a", false),
        ],
    );
    assert_eq!(graph.edge_count(), 2);
    assert!((graph.metadata().confidence - 0.75).abs() < 1e-9);
}

#[test]
fn test_non_default_schema_keys() {
    let mut builder = DependencyGraphBuilder::new();
    builder.add_node("users", "auth", TableMetadata::default());
    builder.add_node("profiles", "public", TableMetadata::default());
    let mut edge = fk("profiles_user_fk", "profiles", "user_id", "users", false);
    edge.to_schema = "auth".to_string();
    builder.add_relationship(edge);

    let graph = builder.build();
    assert!(graph.contains("auth.users"));
    assert!(graph.contains("profiles"));
    assert_eq!(graph.dependencies_of("profiles"), vec!["auth.users"]);
    assert_eq!(graph.node("auth.users").map(|n| n.table.as_str()), Some("users"));
}

#[test]
fn test_subgraph_keeps_internal_edges_only() {
    let graph = graph_of(
        &["users", "posts", "comments"],
        vec![
            fk("posts_user_fk", "posts", "user_id", "users", false),
            fk("comments_post_fk", "comments", "post_id", "posts", false),
            fk("comments_user_fk", "comments", "user_id", "users", false),
        ],
    );
    let sub = graph.subgraph(&["comments", "posts", "missing"]);
    assert_eq!(sub.table_keys(), vec!["comments", "posts"]);
    assert_eq!(sub.edge_count(), 1);
    assert_eq!(sub.dependencies_of("comments"), vec!["posts"]);
    assert!(sub.metadata().warnings.is_empty());
    assert_eq!(sub.metadata().max_depth, 1);
}

#[test]
fn test_subgraph_drops_cycles_outside_scope() {
    let graph = graph_of(
        &["a", "b", "c"],
        vec![
            fk("a_b", "a", "b_id", "b", true),
            fk("b_a", "b", "a_id", "a", false),
            fk("c_a", "c", "a_id", "a", false),
        ],
    );
    let sub = graph.subgraph(&["a", "c"]);
    assert!(sub.cycles().is_empty());
    assert_eq!(sub.edge_count(), 1);
}

#[test]
fn test_empty_graph() {
    let graph = DependencyGraph::empty();
    assert!(graph.is_empty());
    assert_eq!(graph.metadata().max_depth, 0);
    assert_eq!(graph.metadata().confidence, 1.0);
}

#[test]
fn test_graph_serializes() {
    let graph = graph_of(
        &["users", "posts"],
        vec![fk("posts_user_fk", "posts", "user_id", "users", false)],
    );
    let json = serde_json::to_value(&graph).unwrap();
    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["edges"][0]["constraint_name"], "posts_user_fk");
    assert_eq!(json["metadata"]["max_depth"], 1);
}
