//! DuckDB schema introspection

use crate::error::{DbError, DbResult};
use crate::traits::SchemaSnapshotProvider;
use async_trait::async_trait;
use duckdb::{params_from_iter, Connection};
use sg_core::introspection::{ColumnInfo, FlagValue, RawForeignKeyRow, TableInfo};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Foreign keys from `duckdb_constraints()`; column lists are zipped by `UNNEST`
const FOREIGN_KEYS_SQL: &str = "
    SELECT constraint_name, schema_name, table_name, column_name,
           referenced_table, referenced_column
    FROM (
        SELECT c.constraint_name,
               c.schema_name,
               c.table_name,
               UNNEST(c.constraint_column_names) AS column_name,
               c.referenced_table,
               UNNEST(c.referenced_column_names) AS referenced_column
        FROM duckdb_constraints() c
        WHERE c.constraint_type = 'FOREIGN KEY'
          AND c.referenced_table IS NOT NULL
          AND c.schema_name IN ({schemas})
    )
    ORDER BY schema_name, table_name, constraint_name, column_name";

/// Foreign keys from the standard `information_schema` views
const FOREIGN_KEYS_FALLBACK_SQL: &str = "
    SELECT rc.constraint_name,
           kcu.table_schema,
           kcu.table_name,
           kcu.column_name,
           ref.table_schema AS foreign_table_schema,
           ref.table_name AS foreign_table_name,
           ref.column_name AS foreign_column_name,
           rc.update_rule,
           rc.delete_rule
    FROM information_schema.referential_constraints rc
    JOIN information_schema.key_column_usage kcu
      ON kcu.constraint_schema = rc.constraint_schema
     AND kcu.constraint_name = rc.constraint_name
    JOIN information_schema.key_column_usage ref
      ON ref.constraint_schema = rc.unique_constraint_schema
     AND ref.constraint_name = rc.unique_constraint_name
     AND ref.ordinal_position = kcu.position_in_unique_constraint
    WHERE kcu.table_schema IN ({schemas})
    ORDER BY kcu.table_schema, kcu.table_name, rc.constraint_name, kcu.ordinal_position";

/// DuckDB catalog reader
pub struct DuckDbIntrospector {
    conn: Mutex<Connection>,
}

impl DuckDbIntrospector {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        log::debug!("Opening DuckDB catalog at {}", path.display());
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Wrap an already open connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run setup SQL, e.g. to create fixture tables
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn list_tables_sync(&self, schemas: &[String]) -> DbResult<Vec<TableInfo>> {
        if schemas.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT table_schema, table_name, table_type
             FROM information_schema.tables
             WHERE table_schema IN ({})
             ORDER BY table_schema, table_name",
            placeholders(schemas.len())
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(|e| introspection("tables", e))?;
        let tables: Vec<TableInfo> = stmt
            .query_map(params_from_iter(schemas.iter()), |row| {
                Ok(TableInfo {
                    schema: row.get(0)?,
                    table_name: row.get(1)?,
                    table_type: row.get(2)?,
                })
            })
            .map_err(|e| introspection("tables", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| introspection("tables", e))?;

        Ok(tables.into_iter().filter(TableInfo::is_base_table).collect())
    }

    fn list_columns_sync(&self, schema: &str, table: &str) -> DbResult<Vec<ColumnInfo>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT column_name, data_type, is_nullable
                 FROM information_schema.columns
                 WHERE table_schema = ? AND table_name = ?
                 ORDER BY ordinal_position",
            )
            .map_err(|e| introspection("columns", e))?;
        let columns = stmt
            .query_map(duckdb::params![schema, table], |row| {
                let name: String = row.get(0)?;
                let data_type: String = row.get(1)?;
                let nullable: String = row.get(2)?;
                Ok(ColumnInfo::new(
                    schema,
                    table,
                    name,
                    data_type,
                    FlagValue::Text(nullable).as_bool(),
                ))
            })
            .map_err(|e| introspection("columns", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| introspection("columns", e))?;
        Ok(columns)
    }

    fn primary_key_columns_sync(&self, schema: &str, table: &str) -> DbResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT UNNEST(constraint_column_names)
                 FROM duckdb_constraints()
                 WHERE constraint_type = 'PRIMARY KEY'
                   AND schema_name = ? AND table_name = ?",
            )
            .map_err(|e| introspection("primary keys", e))?;
        let mut columns: Vec<String> = stmt
            .query_map(duckdb::params![schema, table], |row| row.get::<_, String>(0))
            .map_err(|e| introspection("primary keys", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| introspection("primary keys", e))?;
        let mut seen = std::collections::HashSet::new();
        columns.retain(|c| seen.insert(c.clone()));
        Ok(columns)
    }

    fn foreign_keys_sync(&self, schemas: &[String]) -> DbResult<Vec<RawForeignKeyRow>> {
        if schemas.is_empty() {
            return Ok(Vec::new());
        }
        let sql = FOREIGN_KEYS_SQL.replace("{schemas}", &placeholders(schemas.len()));
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| introspection("foreign keys", e))?;
        let rows = stmt
            .query_map(params_from_iter(schemas.iter()), |row| {
                Ok(RawForeignKeyRow {
                    constraint_name: row.get(0)?,
                    table_schema: row.get(1)?,
                    table_name: row.get(2)?,
                    column_name: row.get(3)?,
                    foreign_table_name: row.get(4)?,
                    foreign_column_name: row.get(5)?,
                    ..RawForeignKeyRow::default()
                })
            })
            .map_err(|e| introspection("foreign keys", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| introspection("foreign keys", e))?;
        log::debug!("duckdb_constraints() returned {} foreign key rows", rows.len());
        Ok(rows)
    }

    fn foreign_keys_fallback_sync(&self, schemas: &[String]) -> DbResult<Vec<RawForeignKeyRow>> {
        if schemas.is_empty() {
            return Ok(Vec::new());
        }
        let sql = FOREIGN_KEYS_FALLBACK_SQL.replace("{schemas}", &placeholders(schemas.len()));
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| introspection("foreign keys (fallback)", e))?;
        let rows = stmt
            .query_map(params_from_iter(schemas.iter()), |row| {
                Ok(RawForeignKeyRow {
                    constraint_name: row.get(0)?,
                    table_schema: row.get(1)?,
                    table_name: row.get(2)?,
                    column_name: row.get(3)?,
                    foreign_table_schema: row.get(4)?,
                    foreign_table_name: row.get(5)?,
                    foreign_column_name: row.get(6)?,
                    update_rule: row.get(7)?,
                    delete_rule: row.get(8)?,
                    ..RawForeignKeyRow::default()
                })
            })
            .map_err(|e| introspection("foreign keys (fallback)", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| introspection("foreign keys (fallback)", e))?;
        log::debug!("information_schema returned {} foreign key rows", rows.len());
        Ok(rows)
    }
}

/// `?, ?, ?` for `n` bind parameters
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn introspection(query: &str, err: duckdb::Error) -> DbError {
    DbError::IntrospectionError {
        query: query.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl SchemaSnapshotProvider for DuckDbIntrospector {
    async fn list_tables(&self, schemas: &[String]) -> DbResult<Vec<TableInfo>> {
        self.list_tables_sync(schemas)
    }

    async fn list_columns(&self, schema: &str, table: &str) -> DbResult<Vec<ColumnInfo>> {
        self.list_columns_sync(schema, table)
    }

    async fn primary_key_columns(&self, schema: &str, table: &str) -> DbResult<Vec<String>> {
        self.primary_key_columns_sync(schema, table)
    }

    async fn foreign_keys(&self, schemas: &[String]) -> DbResult<Vec<RawForeignKeyRow>> {
        self.foreign_keys_sync(schemas)
    }

    async fn foreign_keys_fallback(&self, schemas: &[String]) -> DbResult<Vec<RawForeignKeyRow>> {
        self.foreign_keys_fallback_sync(schemas)
    }

    fn backend_name(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
