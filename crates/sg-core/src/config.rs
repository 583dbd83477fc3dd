//! Configuration types and parsing for seedgraph.yml

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_true;
use crate::table_name::{matches_filter, DEFAULT_SCHEMA};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration from seedgraph.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Schema whose tables are addressed by bare name
    #[serde(default = "default_schema")]
    pub default_schema: String,

    /// Relationship analysis scope and toggles
    #[serde(default)]
    pub analysis: AnalysisOptions,

    /// Seeding-order options
    #[serde(default)]
    pub seeding: SeedingOptions,

    /// Table classifier thresholds
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Introspection query limits
    #[serde(default)]
    pub introspection: IntrospectionConfig,

    /// Analysis cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Output toggles
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which part of the database is analyzed, and which heuristics run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisOptions {
    /// Schemas to introspect
    #[serde(default = "default_schemas")]
    pub schemas: Vec<String>,

    /// Only analyze tables matching one of these (exact or `prefix*`)
    #[serde(default)]
    pub include_tables: Vec<String>,

    /// Skip tables matching one of these (exact or `prefix*`)
    #[serde(default)]
    pub exclude_tables: Vec<String>,

    #[serde(default = "default_true")]
    pub detect_junction_tables: bool,

    #[serde(default = "default_true")]
    pub analyze_tenant_scoping: bool,

    /// Keep nullable foreign keys as graph edges
    #[serde(default = "default_true")]
    pub include_optional_relationships: bool,

    /// Report self-referencing foreign keys as cycles
    #[serde(default = "default_true")]
    pub detect_self_references: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            schemas: default_schemas(),
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
            detect_junction_tables: true,
            analyze_tenant_scoping: true,
            include_optional_relationships: true,
            detect_self_references: true,
        }
    }
}

impl AnalysisOptions {
    /// Check whether a table passes the include/exclude filters
    pub fn is_table_in_scope(&self, table: &str) -> bool {
        let included = self.include_tables.is_empty()
            || self.include_tables.iter().any(|p| matches_filter(table, p));
        included && !self.exclude_tables.iter().any(|p| matches_filter(table, p))
    }
}

/// Options steering the seeding-order calculator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedingOptions {
    /// Defer nullable/deferrable edges to break cycles.
    /// When off, each cycle is cut at its first edge without deferral bookkeeping.
    #[serde(default = "default_true")]
    pub respect_circular_dependencies: bool,

    /// Place junction tables last within their phase
    #[serde(default = "default_true")]
    pub prioritize_junction_tables: bool,

    /// Keep tenant-scoped tables together where dependencies allow
    #[serde(default)]
    pub group_by_tenant: bool,
}

impl Default for SeedingOptions {
    fn default() -> Self {
        Self {
            respect_circular_dependencies: true,
            prioritize_junction_tables: true,
            group_by_tenant: false,
        }
    }
}

/// Thresholds for the table classifier heuristics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    #[serde(default = "default_junction_max_payload_columns")]
    pub junction_max_payload_columns: usize,

    #[serde(default = "default_small_max_columns")]
    pub small_max_columns: usize,

    #[serde(default = "default_medium_max_columns")]
    pub medium_max_columns: usize,

    #[serde(default = "default_simple_max_score")]
    pub simple_max_score: usize,

    #[serde(default = "default_moderate_max_score")]
    pub moderate_max_score: usize,

    /// Column names that mark a table as tenant-scoped
    #[serde(default = "default_tenant_columns")]
    pub tenant_columns: Vec<String>,

    #[serde(default = "default_true")]
    pub detect_junction_tables: bool,

    #[serde(default = "default_true")]
    pub analyze_tenant_scoping: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            junction_max_payload_columns: default_junction_max_payload_columns(),
            small_max_columns: default_small_max_columns(),
            medium_max_columns: default_medium_max_columns(),
            simple_max_score: default_simple_max_score(),
            moderate_max_score: default_moderate_max_score(),
            tenant_columns: default_tenant_columns(),
            detect_junction_tables: true,
            analyze_tenant_scoping: true,
        }
    }
}

/// Limits applied to schema introspection queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntrospectionConfig {
    /// Maximum number of introspection queries in flight
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,

    /// Per-query timeout in milliseconds
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_queries: default_max_concurrent_queries(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl IntrospectionConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

/// Analysis cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entry lifetime in seconds; entries never expire when unset
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: None,
        }
    }
}

/// Output verbosity toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Log per-phase detail at info level
    #[serde(default)]
    pub verbose: bool,

    #[serde(default = "default_true")]
    pub include_recommendations: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            include_recommendations: true,
        }
    }
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_schemas() -> Vec<String> {
    vec![DEFAULT_SCHEMA.to_string()]
}

fn default_junction_max_payload_columns() -> usize {
    2
}

fn default_small_max_columns() -> usize {
    5
}

fn default_medium_max_columns() -> usize {
    15
}

fn default_simple_max_score() -> usize {
    5
}

fn default_moderate_max_score() -> usize {
    15
}

fn default_tenant_columns() -> Vec<String> {
    [
        "account_id",
        "tenant_id",
        "organization_id",
        "org_id",
        "team_id",
        "workspace_id",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_concurrent_queries() -> usize {
    5
}

fn default_query_timeout_ms() -> u64 {
    30_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_schema: default_schema(),
            analysis: AnalysisOptions::default(),
            seeding: SeedingOptions::default(),
            classifier: ClassifierConfig::default(),
            introspection: IntrospectionConfig::default(),
            cache: CacheConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a directory
    /// Looks for seedgraph.yml or seedgraph.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("seedgraph.yml");
        let yaml_path = dir.join("seedgraph.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let mut config: Config =
            serde_yaml::from_str(content).map_err(|e| CoreError::ConfigParseError {
                message: e.to_string(),
            })?;
        config.sync_toggles();
        config.validate()?;
        Ok(config)
    }

    /// Copy the analysis toggles into the sections that consume them.
    ///
    /// The classifier carries its own copy so it can be used without the
    /// full analysis options.
    pub fn sync_toggles(&mut self) {
        self.classifier.detect_junction_tables = self.analysis.detect_junction_tables;
        self.classifier.analyze_tenant_scoping = self.analysis.analyze_tenant_scoping;
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.default_schema.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "default_schema cannot be empty".to_string(),
            });
        }

        if self.analysis.schemas.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one schema must be listed under analysis.schemas".to_string(),
            });
        }

        if self.introspection.max_concurrent_queries == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "introspection.max_concurrent_queries must be at least 1".to_string(),
            });
        }

        if self.introspection.query_timeout_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "introspection.query_timeout_ms must be greater than 0".to_string(),
            });
        }

        let c = &self.classifier;
        if c.small_max_columns > c.medium_max_columns {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "classifier.small_max_columns ({}) exceeds medium_max_columns ({})",
                    c.small_max_columns, c.medium_max_columns
                ),
            });
        }
        if c.simple_max_score > c.moderate_max_score {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "classifier.simple_max_score ({}) exceeds moderate_max_score ({})",
                    c.simple_max_score, c.moderate_max_score
                ),
            });
        }

        Ok(())
    }

    /// Cache entry lifetime, if configured
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache.ttl_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
