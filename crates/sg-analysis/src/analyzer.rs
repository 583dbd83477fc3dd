//! Relationship analysis orchestration

use crate::error::{AnalysisError, AnalysisResult};
use crate::snapshot::{fetch_snapshot, SchemaSnapshot};
use chrono::Utc;
use futures::FutureExt;
use sg_core::cache::AnalysisCache;
use sg_core::classifier::{TableClassifier, TableMetadata};
use sg_core::config::Config;
use sg_core::fingerprint::analysis_fingerprint;
use sg_core::graph::{DependencyGraph, DependencyGraphBuilder};
use sg_core::recommendations::generate as generate_recommendations;
use sg_core::relationship::{normalize_foreign_keys, RelationshipEdge, TableDependency};
use sg_core::result::{AnalysisMetadata, RelationshipAnalysisResult};
use sg_core::seeding_order::SeedingOrderCalculator;
use sg_core::table_name::table_key;
use sg_db::SchemaSnapshotProvider;
use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Analyzes a database's foreign-key graph and computes a seeding order
pub struct RelationshipAnalyzer {
    provider: Arc<dyn SchemaSnapshotProvider>,
    config: Config,
    cache: Option<Arc<AnalysisCache>>,
}

impl RelationshipAnalyzer {
    /// Create an analyzer with its own cache (when caching is enabled)
    pub fn new(provider: Arc<dyn SchemaSnapshotProvider>, mut config: Config) -> Self {
        config.sync_toggles();
        let cache = config.cache.enabled.then(|| {
            Arc::new(match config.cache_ttl() {
                Some(ttl) => AnalysisCache::with_ttl(ttl),
                None => AnalysisCache::new(),
            })
        });
        Self {
            provider,
            config,
            cache,
        }
    }

    /// Create an analyzer sharing `cache` with other analyzers
    pub fn with_cache(
        provider: Arc<dyn SchemaSnapshotProvider>,
        mut config: Config,
        cache: Arc<AnalysisCache>,
    ) -> Self {
        config.sync_toggles();
        Self {
            provider,
            config,
            cache: Some(cache),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> Option<&Arc<AnalysisCache>> {
        self.cache.as_ref()
    }

    /// Cache key for the current configuration
    pub fn fingerprint(&self) -> String {
        analysis_fingerprint(&self.config)
    }

    /// Drop every cached result
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Run the full analysis.
    ///
    /// Never fails: introspection problems degrade to warnings, and internal
    /// errors (including panics) produce a result with `success: false`.
    pub async fn analyze_relationships(&self) -> RelationshipAnalysisResult {
        let started = Instant::now();
        let fingerprint = self.fingerprint();

        if let Some(mut cached) = self.cache.as_ref().and_then(|c| c.get(&fingerprint)) {
            log::debug!("Serving relationship analysis from cache");
            cached.analysis_metadata.cache_hit = true;
            return cached;
        }

        let result = match self.run(started).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("Relationship analysis failed: {}", e);
                RelationshipAnalysisResult::failure(e.to_string(), Vec::new(), started.elapsed())
            }
        };

        if result.success {
            if let Some(cache) = &self.cache {
                cache.set(fingerprint, result.clone());
            }
        }
        result
    }

    /// Analyze, then restrict the dependency graph to `tables`
    pub async fn dependency_subgraph(&self, tables: &[&str]) -> DependencyGraph {
        self.analyze_relationships()
            .await
            .dependency_graph
            .subgraph(tables)
    }

    async fn run(&self, started: Instant) -> AnalysisResult<RelationshipAnalysisResult> {
        let snapshot = AssertUnwindSafe(fetch_snapshot(
            self.provider.as_ref(),
            &self.config.analysis.schemas,
            &self.config.introspection,
        ))
        .catch_unwind()
        .await
        .map_err(|payload| panicked("introspection", payload))?;

        catch_unwind(AssertUnwindSafe(|| self.assemble(snapshot, started)))
            .map_err(|payload| panicked("analysis", payload))?
    }

    /// The synchronous pipeline: normalize, classify, build, order
    fn assemble(
        &self,
        snapshot: SchemaSnapshot,
        started: Instant,
    ) -> AnalysisResult<RelationshipAnalysisResult> {
        let analysis = &self.config.analysis;
        let default_schema = self.config.default_schema.as_str();

        let tables: Vec<_> = snapshot
            .tables
            .iter()
            .filter(|t| t.is_base_table() && analysis.is_table_in_scope(&t.table_name))
            .collect();
        let in_scope: BTreeSet<String> = tables
            .iter()
            .map(|t| table_key(&t.schema, &t.table_name, default_schema))
            .collect();

        let foreign_keys: Vec<RelationshipEdge> =
            normalize_foreign_keys(&snapshot.foreign_keys, &snapshot.columns)
                .into_iter()
                .filter(|edge| {
                    in_scope.contains(&table_key(&edge.schema, &edge.from_table, default_schema))
                })
                .collect();

        let classifier = TableClassifier::new(&self.config.classifier);
        let mut builder = DependencyGraphBuilder::new()
            .with_default_schema(default_schema)
            .with_self_references(analysis.detect_self_references);

        for table in &tables {
            let columns: Vec<_> = snapshot
                .columns_of(&table.schema, &table.table_name)
                .cloned()
                .collect();
            let outgoing: Vec<RelationshipEdge> = foreign_keys
                .iter()
                .filter(|e| e.schema == table.schema && e.from_table == table.table_name)
                .cloned()
                .collect();
            let metadata = classifier.classify(&columns, &outgoing);
            builder.add_node(&table.table_name, &table.schema, metadata);
        }

        let mut skipped_optional = 0usize;
        for edge in &foreign_keys {
            if edge.is_nullable && !analysis.include_optional_relationships {
                skipped_optional += 1;
                continue;
            }
            builder.add_relationship(edge.clone());
        }
        if skipped_optional > 0 {
            log::debug!("Left {} optional foreign key(s) out of the graph", skipped_optional);
        }

        let graph = builder.build();
        let mut order = SeedingOrderCalculator::new(&self.config.seeding).calculate(&graph)?;

        let recommendations = if self.config.output.include_recommendations {
            generate_recommendations(&graph, &order)
        } else {
            order.metadata.recommendations.clear();
            Vec::new()
        };

        if self.config.output.verbose {
            for (i, phase) in order.phases.iter().enumerate() {
                log::info!("Phase {}: {}", i + 1, phase.join(", "));
            }
            for deferred in &order.circular_dependencies_resolved {
                log::info!(
                    "Deferred {}.{} -> {} ({})",
                    deferred.from_table,
                    deferred.from_column,
                    deferred.to_table,
                    deferred.constraint_name
                );
            }
        }

        let table_dependencies: Vec<TableDependency> = graph
            .edges()
            .map(|edge| TableDependency::from_edge(edge, default_schema))
            .collect();

        let keys_where = |predicate: fn(&TableMetadata) -> bool| -> Vec<String> {
            graph
                .nodes()
                .filter(|n| predicate(&n.metadata))
                .map(|n| n.key.clone())
                .collect()
        };

        let analysis_metadata = AnalysisMetadata {
            tables_analyzed: graph.len(),
            relationships_found: foreign_keys.len(),
            junction_tables: keys_where(|m| m.is_junction_table),
            tenant_tables: keys_where(|m| m.is_tenant_scoped),
            circular_dependencies: graph.cycles().len(),
            max_depth: graph.metadata().max_depth,
            timestamp: Utc::now(),
            confidence: graph.metadata().confidence,
            cache_hit: false,
        };

        let mut warnings = snapshot.warnings;
        warnings.extend(graph.metadata().warnings.iter().cloned());
        warnings.extend(order.warnings.iter().cloned());
        let errors = order.errors.clone();

        log::debug!(
            "Analyzed {} tables and {} foreign keys into {} phases",
            analysis_metadata.tables_analyzed,
            analysis_metadata.relationships_found,
            order.metadata.total_phases
        );

        Ok(RelationshipAnalysisResult {
            success: true,
            dependency_graph: graph,
            foreign_key_relationships: foreign_keys,
            table_dependencies,
            analysis_metadata,
            seeding_order: order,
            recommendations,
            warnings,
            errors,
            execution_time: started.elapsed(),
        })
    }
}

fn panicked(stage: &str, payload: Box<dyn Any + Send>) -> AnalysisError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    AnalysisError::Panicked {
        stage: stage.to_string(),
        message,
    }
}

#[cfg(test)]
#[path = "analyzer_test.rs"]
mod tests;
