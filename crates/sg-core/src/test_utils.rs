//! Shared test helpers for sg-core

use crate::classifier::TableMetadata;
use crate::graph::{DependencyGraph, DependencyGraphBuilder};
use crate::relationship::{ReferentialAction, RelationshipEdge};

/// A `public` schema foreign key `from.column -> to.id`
pub(crate) fn fk(
    name: &str,
    from: &str,
    column: &str,
    to: &str,
    nullable: bool,
) -> RelationshipEdge {
    RelationshipEdge {
        constraint_name: name.to_string(),
        schema: "public".to_string(),
        from_table: from.to_string(),
        from_column: column.to_string(),
        to_schema: "public".to_string(),
        to_table: to.to_string(),
        to_column: "id".to_string(),
        on_delete: ReferentialAction::NoAction,
        on_update: ReferentialAction::NoAction,
        is_nullable: nullable,
        is_deferrable: false,
        initially_deferred: false,
    }
}

/// Same as [`fk`] but `DEFERRABLE`
pub(crate) fn deferrable_fk(name: &str, from: &str, column: &str, to: &str) -> RelationshipEdge {
    RelationshipEdge {
        is_deferrable: true,
        ..fk(name, from, column, to, false)
    }
}

/// Build a graph over `tables` (default metadata) and `edges`
pub(crate) fn graph_of(tables: &[&str], edges: Vec<RelationshipEdge>) -> DependencyGraph {
    builder_of(tables, edges).build()
}

pub(crate) fn builder_of(tables: &[&str], edges: Vec<RelationshipEdge>) -> DependencyGraphBuilder {
    let mut builder = DependencyGraphBuilder::new();
    for table in tables {
        builder.add_node(table, "public", TableMetadata::default());
    }
    for edge in edges {
        builder.add_relationship(edge);
    }
    builder
}

/// Build a graph where each table carries the given metadata
pub(crate) fn graph_with_metadata(
    tables: &[(&str, TableMetadata)],
    edges: Vec<RelationshipEdge>,
) -> DependencyGraph {
    let mut builder = DependencyGraphBuilder::new();
    for (table, metadata) in tables {
        builder.add_node(table, "public", metadata.clone());
    }
    for edge in edges {
        builder.add_relationship(edge);
    }
    builder.build()
}
