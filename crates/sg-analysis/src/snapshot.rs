//! Schema snapshot fetching
//!
//! Tables are listed first, then columns and primary keys are fetched per
//! table with at most `max_concurrent_queries` catalog queries in flight.
//! Every query runs under the configured timeout. A failed or timed-out
//! query degrades to an empty answer plus a warning; it never fails the
//! whole snapshot.

use futures::future::join_all;
use sg_core::config::IntrospectionConfig;
use sg_core::introspection::{ColumnInfo, RawForeignKeyRow, TableInfo};
use sg_db::{DbError, DbResult, SchemaSnapshotProvider};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Everything read from the catalog for one analysis run
#[derive(Debug, Clone, Default)]
pub struct SchemaSnapshot {
    pub tables: Vec<TableInfo>,
    /// Columns of every table, primary-key flags applied
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<RawForeignKeyRow>,
    /// Degradation notices collected while fetching
    pub warnings: Vec<String>,
}

impl SchemaSnapshot {
    /// Columns of one table, in catalog order
    pub fn columns_of<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> impl Iterator<Item = &'a ColumnInfo> + 'a {
        self.columns
            .iter()
            .filter(move |c| c.schema == schema && c.table_name == table)
    }
}

/// Run `query` under `timeout`, mapping expiry to [`DbError::Timeout`]
async fn bounded<T>(
    name: &str,
    timeout: Duration,
    query: impl Future<Output = DbResult<T>>,
) -> DbResult<T> {
    match tokio::time::timeout(timeout, query).await {
        Ok(result) => result,
        Err(_) => Err(DbError::Timeout {
            query: name.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

fn degrade<T: Default>(result: DbResult<T>, context: &str, warnings: &mut Vec<String>) -> T {
    result.unwrap_or_else(|e| {
        let message = format!("{}: {}", context, e);
        log::warn!("{}", message);
        warnings.push(message);
        T::default()
    })
}

/// Read tables, columns, primary keys and foreign keys for `schemas`
pub async fn fetch_snapshot(
    provider: &dyn SchemaSnapshotProvider,
    schemas: &[String],
    config: &IntrospectionConfig,
) -> SchemaSnapshot {
    let timeout = config.query_timeout();
    let mut warnings = Vec::new();

    log::debug!(
        "Introspecting schemas [{}] via {}",
        schemas.join(", "),
        provider.backend_name()
    );

    let tables = degrade(
        bounded("tables", timeout, provider.list_tables(schemas)).await,
        "Could not list tables",
        &mut warnings,
    );

    let semaphore = Semaphore::new(config.max_concurrent_queries.max(1));
    let per_table = tables.iter().map(|table| {
        let semaphore = &semaphore;
        async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return (Ok(Vec::new()), Ok(Vec::new()));
            };
            let columns = bounded(
                "columns",
                timeout,
                provider.list_columns(&table.schema, &table.table_name),
            )
            .await;
            let primary_key = bounded(
                "primary keys",
                timeout,
                provider.primary_key_columns(&table.schema, &table.table_name),
            )
            .await;
            (columns, primary_key)
        }
    });
    let fetched = join_all(per_table).await;

    let mut columns = Vec::new();
    for (table, (table_columns, primary_key)) in tables.iter().zip(fetched) {
        let qualified = format!("{}.{}", table.schema, table.table_name);
        let table_columns = degrade(
            table_columns,
            &format!("Could not read columns of {}", qualified),
            &mut warnings,
        );
        let primary_key = degrade(
            primary_key,
            &format!("Could not read primary key of {}", qualified),
            &mut warnings,
        );
        columns.extend(table_columns.into_iter().map(|column| {
            if primary_key.contains(&column.column_name) {
                column.primary_key()
            } else {
                column
            }
        }));
    }

    let foreign_keys = match bounded("foreign keys", timeout, provider.foreign_keys(schemas)).await
    {
        Ok(rows) => rows,
        Err(e) => {
            log::debug!("Foreign key query failed, trying fallback: {}", e);
            let fallback = bounded(
                "foreign keys (fallback)",
                timeout,
                provider.foreign_keys_fallback(schemas),
            )
            .await;
            match fallback {
                Ok(rows) => {
                    let message = format!(
                        "Foreign key introspection degraded to the catalog fallback query: {}",
                        e
                    );
                    log::warn!("{}", message);
                    warnings.push(message);
                    rows
                }
                Err(fallback_err) => degrade(
                    Err(fallback_err),
                    &format!("Could not read foreign keys ({})", e),
                    &mut warnings,
                ),
            }
        }
    };

    log::debug!(
        "Snapshot: {} tables, {} columns, {} foreign key rows",
        tables.len(),
        columns.len(),
        foreign_keys.len()
    );

    SchemaSnapshot {
        tables,
        columns,
        foreign_keys,
        warnings,
    }
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
