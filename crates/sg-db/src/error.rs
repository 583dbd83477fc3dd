//! Error types for sg-db

use thiserror::Error;

/// Introspection errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Catalog query failed (D003)
    #[error("[D003] Introspection query '{query}' failed: {message}")]
    IntrospectionError { query: String, message: String },

    /// Mutex poisoned (D004)
    #[error("[D004] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Query exceeded its time budget (D005)
    #[error("[D005] Introspection query '{query}' timed out after {timeout_ms}ms")]
    Timeout { query: String, timeout_ms: u64 },
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}
