//! sg-core - Core library for Seedgraph
//!
//! This crate provides the synchronous analysis engine: introspection row
//! types, foreign-key normalization, table classification, the dependency
//! graph, cycle resolution, phase-based seeding order, result caching, and
//! configuration shared by every Seedgraph component.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod cycles;
pub mod error;
pub mod fingerprint;
pub mod graph;
pub mod introspection;
pub mod recommendations;
pub mod relationship;
pub mod result;
pub mod seeding_order;
pub(crate) mod serde_helpers;
pub mod table_name;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cache::AnalysisCache;
pub use classifier::{EstimatedSize, SeedingComplexity, TableClassifier, TableMetadata};
pub use config::{
    AnalysisOptions, CacheConfig, ClassifierConfig, Config, IntrospectionConfig, OutputConfig,
    SeedingOptions,
};
pub use cycles::{CycleResolution, CycleResolver, DeferredRelationship, DetectedCycle};
pub use error::{CoreError, CoreResult};
pub use fingerprint::{analysis_fingerprint, compute_checksum};
pub use graph::{DependencyGraph, DependencyGraphBuilder, GraphMetadata, TableNode};
pub use introspection::{ColumnInfo, FlagValue, RawForeignKeyRow, TableInfo};
pub use relationship::{
    normalize_foreign_keys, ReferentialAction, RelationshipEdge, RelationshipKind,
    TableDependency,
};
pub use result::{AnalysisMetadata, RelationshipAnalysisResult};
pub use seeding_order::{
    OrderComplexity, SeedingMetadata, SeedingOrderCalculator, SeedingOrderResult,
};
pub use table_name::{table_key, DEFAULT_SCHEMA};
