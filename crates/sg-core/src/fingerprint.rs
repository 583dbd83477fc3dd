//! SHA-256 fingerprints for cache keys.

use crate::config::Config;
use serde_json::json;
use sha2::{Digest, Sha256};

/// Compute SHA256 checksum of a string
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

fn sorted(values: &[String]) -> Vec<&str> {
    let mut values: Vec<&str> = values.iter().map(String::as_str).collect();
    values.sort_unstable();
    values.dedup();
    values
}

/// Fingerprint every option that can change an analysis result.
///
/// List-valued options are sorted first, so `[a, b]` and `[b, a]` share a
/// fingerprint. Introspection limits and cache settings are not part of it.
pub fn analysis_fingerprint(config: &Config) -> String {
    let analysis = &config.analysis;
    let seeding = &config.seeding;
    let classifier = &config.classifier;

    let tenant_columns: Vec<String> = classifier
        .tenant_columns
        .iter()
        .map(|c| c.to_lowercase())
        .collect();

    // serde_json objects keep keys sorted, so this serializes canonically
    let canonical = json!({
        "default_schema": config.default_schema,
        "schemas": sorted(&analysis.schemas),
        "include_tables": sorted(&analysis.include_tables),
        "exclude_tables": sorted(&analysis.exclude_tables),
        "detect_junction_tables": analysis.detect_junction_tables,
        "analyze_tenant_scoping": analysis.analyze_tenant_scoping,
        "include_optional_relationships": analysis.include_optional_relationships,
        "detect_self_references": analysis.detect_self_references,
        "respect_circular_dependencies": seeding.respect_circular_dependencies,
        "prioritize_junction_tables": seeding.prioritize_junction_tables,
        "group_by_tenant": seeding.group_by_tenant,
        "junction_max_payload_columns": classifier.junction_max_payload_columns,
        "small_max_columns": classifier.small_max_columns,
        "medium_max_columns": classifier.medium_max_columns,
        "simple_max_score": classifier.simple_max_score,
        "moderate_max_score": classifier.moderate_max_score,
        "tenant_columns": sorted(&tenant_columns),
        "include_recommendations": config.output.include_recommendations,
    });

    compute_checksum(&canonical.to_string())
}
