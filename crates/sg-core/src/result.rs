//! The assembled output of one relationship analysis run

use crate::error::CoreResult;
use crate::graph::DependencyGraph;
use crate::relationship::{RelationshipEdge, TableDependency};
use crate::seeding_order::SeedingOrderResult;
use crate::serde_helpers::serialize_duration_ms;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Summary counters for an analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetadata {
    pub tables_analyzed: usize,
    pub relationships_found: usize,
    /// Keys of tables classified as junction tables
    pub junction_tables: Vec<String>,
    /// Keys of tables carrying a tenant column
    pub tenant_tables: Vec<String>,
    pub circular_dependencies: usize,
    pub max_depth: usize,
    pub timestamp: DateTime<Utc>,
    pub confidence: f64,
    /// Set when the result was served from the analysis cache
    pub cache_hit: bool,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            tables_analyzed: 0,
            relationships_found: 0,
            junction_tables: Vec::new(),
            tenant_tables: Vec::new(),
            circular_dependencies: 0,
            max_depth: 0,
            timestamp: Utc::now(),
            confidence: 1.0,
            cache_hit: false,
        }
    }
}

/// Everything an analysis run produces
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipAnalysisResult {
    pub success: bool,
    pub dependency_graph: DependencyGraph,
    /// Every normalized foreign key, including ones left out of the graph
    pub foreign_key_relationships: Vec<RelationshipEdge>,
    pub table_dependencies: Vec<TableDependency>,
    pub analysis_metadata: AnalysisMetadata,
    pub seeding_order: SeedingOrderResult,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    #[serde(serialize_with = "serialize_duration_ms")]
    pub execution_time: Duration,
}

impl RelationshipAnalysisResult {
    /// A failed run: empty graph and order, with `message` as the only error
    pub fn failure(
        message: impl Into<String>,
        warnings: Vec<String>,
        execution_time: Duration,
    ) -> Self {
        Self {
            success: false,
            dependency_graph: DependencyGraph::empty(),
            foreign_key_relationships: Vec::new(),
            table_dependencies: Vec::new(),
            analysis_metadata: AnalysisMetadata::default(),
            seeding_order: SeedingOrderResult::default(),
            recommendations: Vec::new(),
            warnings,
            errors: vec![message.into()],
            execution_time,
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
