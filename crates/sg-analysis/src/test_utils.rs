//! Shared test utilities for sg-analysis
//!
//! [`StaticSnapshotProvider`] serves a fixed catalog from memory and can be
//! told to fail, stall or panic on individual queries.

use async_trait::async_trait;
use sg_core::introspection::{ColumnInfo, RawForeignKeyRow, TableInfo};
use sg_db::{DbError, DbResult, SchemaSnapshotProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Query counters shared between clones of a provider
#[derive(Debug, Default)]
pub struct CallStats {
    pub list_tables: AtomicUsize,
    pub foreign_key_fallbacks: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

/// In-memory schema snapshot provider
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshotProvider {
    tables: Vec<TableInfo>,
    columns: Vec<ColumnInfo>,
    primary_keys: Vec<(String, String, String)>,
    foreign_keys: Vec<RawForeignKeyRow>,
    fail_tables: bool,
    fail_columns_of: Option<String>,
    fail_foreign_keys: bool,
    fail_fallback: bool,
    panic_on_foreign_keys: bool,
    column_delay: Option<Duration>,
    stats: Arc<CallStats>,
}

impl StaticSnapshotProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `public` table with an `id` primary key
    pub fn table(self, name: &str) -> Self {
        self.table_in("public", name)
            .column(name, "id", "integer", false)
            .primary_key(name, "id")
    }

    /// Add a table without any columns
    pub fn table_in(mut self, schema: &str, name: &str) -> Self {
        self.tables.push(TableInfo::new(schema, name));
        self
    }

    /// Add a view, which providers report but analysis must skip
    pub fn view(mut self, name: &str) -> Self {
        self.tables.push(TableInfo {
            table_type: "VIEW".to_string(),
            ..TableInfo::new("public", name)
        });
        self
    }

    pub fn column(mut self, table: &str, name: &str, data_type: &str, nullable: bool) -> Self {
        self.columns
            .push(ColumnInfo::new("public", table, name, data_type, nullable));
        self
    }

    pub fn primary_key(mut self, table: &str, column: &str) -> Self {
        self.primary_keys
            .push(("public".to_string(), table.to_string(), column.to_string()));
        self
    }

    /// Add `from.column -> to.id`, creating the column with the given nullability
    pub fn foreign_key(
        self,
        constraint: &str,
        from: &str,
        column: &str,
        to: &str,
        nullable: bool,
    ) -> Self {
        self.column(from, column, "integer", nullable)
            .raw_foreign_key(RawForeignKeyRow::new(constraint, "public", from, column, to, "id"))
    }

    /// Add a foreign-key row exactly as given
    pub fn raw_foreign_key(mut self, row: RawForeignKeyRow) -> Self {
        self.foreign_keys.push(row);
        self
    }

    pub fn failing_tables(mut self) -> Self {
        self.fail_tables = true;
        self
    }

    pub fn failing_columns_of(mut self, table: &str) -> Self {
        self.fail_columns_of = Some(table.to_string());
        self
    }

    /// Make the primary foreign-key query fail so the fallback is used
    pub fn failing_foreign_keys(mut self) -> Self {
        self.fail_foreign_keys = true;
        self
    }

    pub fn failing_fallback(mut self) -> Self {
        self.fail_fallback = true;
        self
    }

    pub fn panicking_foreign_keys(mut self) -> Self {
        self.panic_on_foreign_keys = true;
        self
    }

    /// Delay every column query
    pub fn with_column_delay(mut self, delay: Duration) -> Self {
        self.column_delay = Some(delay);
        self
    }

    pub fn stats(&self) -> Arc<CallStats> {
        Arc::clone(&self.stats)
    }

    fn fail(query: &str) -> DbError {
        DbError::IntrospectionError {
            query: query.to_string(),
            message: "simulated failure".to_string(),
        }
    }
}

#[async_trait]
impl SchemaSnapshotProvider for StaticSnapshotProvider {
    async fn list_tables(&self, schemas: &[String]) -> DbResult<Vec<TableInfo>> {
        self.stats.list_tables.fetch_add(1, Ordering::SeqCst);
        if self.fail_tables {
            return Err(Self::fail("tables"));
        }
        Ok(self
            .tables
            .iter()
            .filter(|t| schemas.contains(&t.schema) && t.is_base_table())
            .cloned()
            .collect())
    }

    async fn list_columns(&self, schema: &str, table: &str) -> DbResult<Vec<ColumnInfo>> {
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.column_delay {
            tokio::time::sleep(delay).await;
        }
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_columns_of.as_deref() == Some(table) {
            return Err(Self::fail("columns"));
        }
        Ok(self
            .columns
            .iter()
            .filter(|c| c.schema == schema && c.table_name == table)
            .cloned()
            .collect())
    }

    async fn primary_key_columns(&self, schema: &str, table: &str) -> DbResult<Vec<String>> {
        Ok(self
            .primary_keys
            .iter()
            .filter(|(s, t, _)| s == schema && t == table)
            .map(|(_, _, c)| c.clone())
            .collect())
    }

    async fn foreign_keys(&self, schemas: &[String]) -> DbResult<Vec<RawForeignKeyRow>> {
        if self.panic_on_foreign_keys {
            panic!("simulated provider panic");
        }
        if self.fail_foreign_keys {
            return Err(Self::fail("foreign keys"));
        }
        Ok(self.rows_in(schemas))
    }

    async fn foreign_keys_fallback(&self, schemas: &[String]) -> DbResult<Vec<RawForeignKeyRow>> {
        self.stats.foreign_key_fallbacks.fetch_add(1, Ordering::SeqCst);
        if self.fail_fallback {
            return Err(Self::fail("foreign keys (fallback)"));
        }
        Ok(self.rows_in(schemas))
    }

    fn backend_name(&self) -> &'static str {
        "static"
    }
}

impl StaticSnapshotProvider {
    fn rows_in(&self, schemas: &[String]) -> Vec<RawForeignKeyRow> {
        self.foreign_keys
            .iter()
            .filter(|row| {
                row.table_schema
                    .as_ref()
                    .map_or(true, |schema| schemas.contains(schema))
            })
            .cloned()
            .collect()
    }
}
