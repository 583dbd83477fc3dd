//! sg-analysis - Relationship analysis for Seedgraph
//!
//! This crate drives a [`SchemaSnapshotProvider`](sg_db::SchemaSnapshotProvider)
//! through the sg-core engine: it fetches the catalog with bounded
//! concurrency, builds the dependency graph, computes the seeding order and
//! caches results by configuration fingerprint.

pub mod analyzer;
pub mod error;
pub mod snapshot;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use analyzer::RelationshipAnalyzer;
pub use error::{AnalysisError, AnalysisResult};
pub use snapshot::{fetch_snapshot, SchemaSnapshot};
