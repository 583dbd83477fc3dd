use super::*;

#[test]
fn test_parse_empty_config_uses_defaults() {
    let config = Config::from_yaml("{}").unwrap();
    assert_eq!(config.default_schema, "public");
    assert_eq!(config.analysis.schemas, vec!["public".to_string()]);
    assert!(config.analysis.detect_junction_tables);
    assert!(config.seeding.respect_circular_dependencies);
    assert!(!config.seeding.group_by_tenant);
    assert_eq!(config.classifier.junction_max_payload_columns, 2);
    assert_eq!(config.introspection.max_concurrent_queries, 5);
    assert!(config.cache.enabled);
    assert_eq!(config.cache_ttl(), None);
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
default_schema: main
analysis:
  schemas: [main, auth]
  include_tables: ["users", "post*"]
  exclude_tables: ["posts_archive"]
  detect_junction_tables: false
  detect_self_references: false
seeding:
  group_by_tenant: true
classifier:
  junction_max_payload_columns: 3
  tenant_columns: [company_id]
introspection:
  max_concurrent_queries: 8
  query_timeout_ms: 5000
cache:
  ttl_secs: 60
output:
  verbose: true
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.default_schema, "main");
    assert_eq!(config.analysis.schemas.len(), 2);
    assert!(config.seeding.group_by_tenant);
    assert_eq!(config.classifier.tenant_columns, vec!["company_id"]);
    assert_eq!(config.introspection.query_timeout(), Duration::from_secs(5));
    assert_eq!(config.cache_ttl(), Some(Duration::from_secs(60)));
    assert!(config.output.verbose);
}

#[test]
fn test_toggles_are_synced() {
    let yaml = r#"
analysis:
  detect_junction_tables: false
  analyze_tenant_scoping: false
  detect_self_references: false
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert!(!config.classifier.detect_junction_tables);
    assert!(!config.classifier.analyze_tenant_scoping);
    assert!(!config.analysis.detect_self_references);
}

#[test]
fn test_unknown_field_rejected() {
    let result = Config::from_yaml("analysis:\n  bogus: true\n");
    assert!(matches!(result, Err(CoreError::ConfigParseError { .. })));
}

#[test]
fn test_zero_concurrency_rejected() {
    let result = Config::from_yaml("introspection:\n  max_concurrent_queries: 0\n");
    assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
}

#[test]
fn test_inverted_thresholds_rejected() {
    let yaml = "classifier:\n  simple_max_score: 20\n  moderate_max_score: 10\n";
    let result = Config::from_yaml(yaml);
    assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
}

#[test]
fn test_empty_schema_list_rejected() {
    let result = Config::from_yaml("analysis:\n  schemas: []\n");
    assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
}

#[test]
fn test_table_scope_filters() {
    let options = AnalysisOptions {
        include_tables: vec!["users".to_string(), "post*".to_string()],
        exclude_tables: vec!["posts_archive".to_string()],
        ..AnalysisOptions::default()
    };
    assert!(options.is_table_in_scope("users"));
    assert!(options.is_table_in_scope("posts"));
    assert!(!options.is_table_in_scope("posts_archive"));
    assert!(!options.is_table_in_scope("comments"));
}

#[test]
fn test_load_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("seedgraph.yml"),
        "default_schema: main\n",
    )
    .unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.default_schema, "main");
}

#[test]
fn test_load_from_dir_missing() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load_from_dir(dir.path());
    assert!(matches!(result, Err(CoreError::ConfigNotFound { .. })));
}
