//! Table key helpers.
//!
//! Tables are addressed by a *key*: the bare table name when it lives in the
//! default schema, `schema.table` otherwise. Keys are what phases, seeding
//! order and graph lookups speak.

/// Default schema for PostgreSQL-style databases.
pub const DEFAULT_SCHEMA: &str = "public";

/// Build the key for `schema.table` relative to `default_schema`.
pub fn table_key(schema: &str, table: &str, default_schema: &str) -> String {
    if schema.is_empty() || schema == default_schema {
        table.to_string()
    } else {
        format!("{}.{}", schema, table)
    }
}

/// Match a table name against a filter pattern (exact, or `prefix*`).
pub fn matches_filter(name: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => name == pattern,
    }
}
