//! sg-db - Schema introspection layer for Seedgraph
//!
//! This crate provides the `SchemaSnapshotProvider` trait through which the
//! analyzer reads tables, columns, primary keys and foreign keys, and a
//! DuckDB implementation of it.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbIntrospector;
pub use error::{DbError, DbResult};
pub use traits::SchemaSnapshotProvider;
