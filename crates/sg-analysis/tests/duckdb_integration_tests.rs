//! Relationship analysis against a real DuckDB catalog

use async_trait::async_trait;
use sg_analysis::RelationshipAnalyzer;
use sg_core::introspection::{ColumnInfo, RawForeignKeyRow, TableInfo};
use sg_core::{Config, RelationshipKind};
use sg_db::{DbError, DbResult, DuckDbIntrospector, SchemaSnapshotProvider};
use std::sync::Arc;

const SHOP: &str = "
    CREATE TABLE customers (
        id INTEGER PRIMARY KEY,
        email VARCHAR NOT NULL,
        created_at TIMESTAMP
    );
    CREATE TABLE products (
        id INTEGER PRIMARY KEY,
        name VARCHAR NOT NULL,
        description VARCHAR
    );
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        customer_id INTEGER NOT NULL REFERENCES customers(id),
        referrer_id INTEGER REFERENCES customers(id),
        status VARCHAR NOT NULL,
        total DECIMAL(10, 2),
        placed_at TIMESTAMP
    );
    CREATE TABLE order_items (
        id INTEGER PRIMARY KEY,
        order_id INTEGER NOT NULL REFERENCES orders(id),
        product_id INTEGER NOT NULL REFERENCES products(id)
    );
    CREATE VIEW big_orders AS SELECT * FROM orders;
";

fn duckdb_config() -> Config {
    let mut config = Config::default();
    config.default_schema = "main".to_string();
    config.analysis.schemas = vec!["main".to_string()];
    config
}

fn shop() -> Arc<DuckDbIntrospector> {
    let db = DuckDbIntrospector::in_memory().unwrap();
    db.execute_batch(SHOP).unwrap();
    Arc::new(db)
}

#[tokio::test]
async fn test_duckdb_shop_seeding_order() {
    let analyzer = RelationshipAnalyzer::new(shop(), duckdb_config());
    let result = analyzer.analyze_relationships().await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(
        result.dependency_graph.table_keys(),
        vec!["customers", "order_items", "orders", "products"]
    );
    assert_eq!(
        result.seeding_order.phases,
        vec![
            vec!["customers", "products"],
            vec!["orders"],
            vec!["order_items"],
        ]
    );
    assert_eq!(result.analysis_metadata.relationships_found, 4);
    assert_eq!(result.analysis_metadata.junction_tables, vec!["order_items"]);
    assert_eq!(result.analysis_metadata.max_depth, 2);
}

#[tokio::test]
async fn test_duckdb_nullability_and_primary_keys() {
    let analyzer = RelationshipAnalyzer::new(shop(), duckdb_config());
    let result = analyzer.analyze_relationships().await;

    let referrer = result
        .table_dependencies
        .iter()
        .find(|d| d.foreign_key.from_column == "referrer_id")
        .unwrap();
    assert_eq!(referrer.kind, RelationshipKind::Optional);
    assert_eq!(referrer.to_table, "customers");

    let customer = result
        .table_dependencies
        .iter()
        .find(|d| d.foreign_key.from_column == "customer_id")
        .unwrap();
    assert_eq!(customer.kind, RelationshipKind::Required);

    let customers = result.dependency_graph.node("customers").unwrap();
    assert_eq!(customers.metadata.primary_key_columns, vec!["id"]);
    assert!(customers.metadata.has_timestamps);
}

#[tokio::test]
async fn test_duckdb_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.duckdb");
    {
        let db = DuckDbIntrospector::from_path(&path).unwrap();
        db.execute_batch(SHOP).unwrap();
    }

    let db = DuckDbIntrospector::from_path(&path).unwrap();
    let result = RelationshipAnalyzer::new(Arc::new(db), duckdb_config())
        .analyze_relationships()
        .await;
    assert!(result.success);
    assert_eq!(result.seeding_order.seeding_order.len(), 4);
}

#[tokio::test]
async fn test_duckdb_wrong_default_schema_qualifies_keys() {
    let result = RelationshipAnalyzer::new(shop(), {
        let mut config = Config::default();
        config.analysis.schemas = vec!["main".to_string()];
        config
    })
    .analyze_relationships()
    .await;

    assert!(result.success);
    assert_eq!(result.seeding_order.phases[0], vec!["main.customers", "main.products"]);
}

/// DuckDB catalog whose primary foreign-key query always fails
struct WithoutRichForeignKeys(DuckDbIntrospector);

#[async_trait]
impl SchemaSnapshotProvider for WithoutRichForeignKeys {
    async fn list_tables(&self, schemas: &[String]) -> DbResult<Vec<TableInfo>> {
        self.0.list_tables(schemas).await
    }

    async fn list_columns(&self, schema: &str, table: &str) -> DbResult<Vec<ColumnInfo>> {
        self.0.list_columns(schema, table).await
    }

    async fn primary_key_columns(&self, schema: &str, table: &str) -> DbResult<Vec<String>> {
        self.0.primary_key_columns(schema, table).await
    }

    async fn foreign_keys(&self, _schemas: &[String]) -> DbResult<Vec<RawForeignKeyRow>> {
        Err(DbError::IntrospectionError {
            query: "foreign keys".to_string(),
            message: "duckdb_constraints() unavailable".to_string(),
        })
    }

    async fn foreign_keys_fallback(&self, schemas: &[String]) -> DbResult<Vec<RawForeignKeyRow>> {
        self.0.foreign_keys_fallback(schemas).await
    }

    fn backend_name(&self) -> &'static str {
        self.0.backend_name()
    }
}

#[tokio::test]
async fn test_duckdb_fallback_query_orders_shop() {
    let db = DuckDbIntrospector::in_memory().unwrap();
    db.execute_batch(SHOP).unwrap();
    let provider = Arc::new(WithoutRichForeignKeys(db));

    let result = RelationshipAnalyzer::new(provider, duckdb_config())
        .analyze_relationships()
        .await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("degraded to the catalog fallback query")));
    assert_eq!(
        result.seeding_order.phases,
        vec![
            vec!["customers", "products"],
            vec!["orders"],
            vec!["order_items"],
        ]
    );
    assert_eq!(result.dependency_graph.dependencies_of("orders"), vec!["customers"]);
    assert_eq!(
        result.dependency_graph.dependencies_of("order_items"),
        vec!["orders", "products"]
    );
}
