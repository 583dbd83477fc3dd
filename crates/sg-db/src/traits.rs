//! Schema snapshot provider trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use sg_core::introspection::{ColumnInfo, RawForeignKeyRow, TableInfo};

/// Read-only access to a database catalog
///
/// Implementations must be Send + Sync for async operation. Every method is
/// one logical catalog query; callers decide on concurrency and timeouts.
#[async_trait]
pub trait SchemaSnapshotProvider: Send + Sync {
    /// Base tables (no views) in the given schemas
    async fn list_tables(&self, schemas: &[String]) -> DbResult<Vec<TableInfo>>;

    /// Columns of one table in ordinal order, without primary-key flags
    async fn list_columns(&self, schema: &str, table: &str) -> DbResult<Vec<ColumnInfo>>;

    /// Primary-key column names of one table, in key order
    async fn primary_key_columns(&self, schema: &str, table: &str) -> DbResult<Vec<String>>;

    /// One row per foreign-key column pair, from the richest catalog source
    async fn foreign_keys(&self, schemas: &[String]) -> DbResult<Vec<RawForeignKeyRow>>;

    /// Same as [`foreign_keys`](Self::foreign_keys) through a plainer catalog join
    async fn foreign_keys_fallback(&self, schemas: &[String]) -> DbResult<Vec<RawForeignKeyRow>>;

    /// Backend identifier for logging
    fn backend_name(&self) -> &'static str;
}
