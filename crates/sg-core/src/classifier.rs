//! Table classification heuristics
//!
//! Derives per-table metadata from columns and outgoing foreign keys. The
//! results are hints for ordering and generation; a misclassified table is
//! never a hard seeding constraint.

use crate::config::ClassifierConfig;
use crate::introspection::ColumnInfo;
use crate::relationship::RelationshipEdge;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Columns that carry no domain payload
const HOUSEKEEPING_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

const TIMESTAMP_COLUMNS: &[&str] = &["created_at", "updated_at"];

/// Rough table width bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EstimatedSize {
    #[default]
    Small,
    Medium,
    Large,
}

/// How much work generating a row for this table takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeedingComplexity {
    #[default]
    Simple,
    Moderate,
    Complex,
}

/// Classification metadata attached to every graph node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TableMetadata {
    pub is_junction_table: bool,
    pub is_tenant_scoped: bool,
    pub has_timestamps: bool,
    pub primary_key_columns: Vec<String>,
    pub foreign_key_count: usize,
    pub column_count: usize,
    pub estimated_size: EstimatedSize,
    pub seeding_complexity: SeedingComplexity,
    pub complexity_score: usize,
}

/// Applies the classification heuristics with configurable thresholds
#[derive(Debug, Clone)]
pub struct TableClassifier {
    config: ClassifierConfig,
    tenant_columns: HashSet<String>,
}

impl TableClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            tenant_columns: config
                .tenant_columns
                .iter()
                .map(|c| c.to_ascii_lowercase())
                .collect(),
            config: config.clone(),
        }
    }

    /// Classify one table from its columns and outgoing foreign keys
    pub fn classify(
        &self,
        columns: &[ColumnInfo],
        foreign_keys: &[RelationshipEdge],
    ) -> TableMetadata {
        let fk_columns: HashSet<&str> = foreign_keys
            .iter()
            .map(|fk| fk.from_column.as_str())
            .collect();

        let mut primary_key_columns: Vec<String> = Vec::new();
        for col in columns.iter().filter(|c| c.is_primary_key) {
            if !primary_key_columns.contains(&col.column_name) {
                primary_key_columns.push(col.column_name.clone());
            }
        }

        let foreign_key_count = foreign_keys.len();
        let column_count = columns.len();

        let is_junction_table = self.config.detect_junction_tables
            && is_junction(
                columns,
                &primary_key_columns,
                &fk_columns,
                foreign_key_count,
                self.config.junction_max_payload_columns,
            );

        let is_tenant_scoped = self.config.analyze_tenant_scoping
            && columns
                .iter()
                .any(|c| self.tenant_columns.contains(&c.column_name.to_ascii_lowercase()));

        let has_timestamps = columns
            .iter()
            .any(|c| TIMESTAMP_COLUMNS.contains(&c.column_name.as_str()));

        let estimated_size = if column_count <= self.config.small_max_columns {
            EstimatedSize::Small
        } else if column_count <= self.config.medium_max_columns {
            EstimatedSize::Medium
        } else {
            EstimatedSize::Large
        };

        let non_nullable = columns.iter().filter(|c| !c.is_nullable).count();
        let complex = columns
            .iter()
            .filter(|c| is_complex_type(&c.data_type))
            .count();
        let complexity_score = foreign_key_count * 2 + non_nullable + complex * 3;

        let seeding_complexity = if complexity_score <= self.config.simple_max_score {
            SeedingComplexity::Simple
        } else if complexity_score <= self.config.moderate_max_score {
            SeedingComplexity::Moderate
        } else {
            SeedingComplexity::Complex
        };

        TableMetadata {
            is_junction_table,
            is_tenant_scoped,
            has_timestamps,
            primary_key_columns,
            foreign_key_count,
            column_count,
            estimated_size,
            seeding_complexity,
            complexity_score,
        }
    }
}

impl Default for TableClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

/// At least two FKs, a key made of FK columns (a surrogate `id` is allowed),
/// and little payload besides.
fn is_junction(
    columns: &[ColumnInfo],
    primary_key_columns: &[String],
    fk_columns: &HashSet<&str>,
    foreign_key_count: usize,
    max_payload: usize,
) -> bool {
    if foreign_key_count < 2 {
        return false;
    }

    let key_is_fk = primary_key_columns
        .iter()
        .filter(|c| !HOUSEKEEPING_COLUMNS.contains(&c.as_str()))
        .all(|c| fk_columns.contains(c.as_str()));
    if !key_is_fk {
        return false;
    }

    let payload = columns
        .iter()
        .filter(|c| {
            !fk_columns.contains(c.column_name.as_str())
                && !HOUSEKEEPING_COLUMNS.contains(&c.column_name.as_str())
        })
        .count();
    payload <= max_payload
}

/// JSON, arrays, spatial and extension types need structured generators
fn is_complex_type(data_type: &str) -> bool {
    let t = data_type.trim().to_ascii_lowercase();
    t.starts_with("json")
        || t.ends_with("[]")
        || t.starts_with('_')
        || t.starts_with("array")
        || t.contains("geometry")
        || t.contains("geography")
        || t == "hstore"
        || t == "user-defined"
}

#[cfg(test)]
#[path = "classifier_test.rs"]
mod tests;
