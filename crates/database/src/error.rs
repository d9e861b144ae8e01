//! Database error types.

use thiserror::Error;

use crate::store::BackendKind;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A store operation was called before a backend was selected.
    #[error("database not initialized")]
    NotInitialized,

    /// The backend could not be reached or its schema could not be created.
    #[error("{backend} storage unavailable: {source}")]
    StorageUnavailable {
        backend: BackendKind,
        #[source]
        source: sqlx::Error,
    },

    /// A write against a healthy backend failed.
    #[error("write failed in {operation}: {source}")]
    Write {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A read against a healthy backend failed.
    #[error("read failed in {operation}: {source}")]
    Read {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A stored sender value was neither `user` nor `bot`.
    #[error("invalid message sender: {0}")]
    InvalidSender(String),
}

impl DatabaseError {
    pub(crate) fn unavailable(backend: BackendKind) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| DatabaseError::StorageUnavailable { backend, source }
    }

    pub(crate) fn write(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| DatabaseError::Write { operation, source }
    }

    pub(crate) fn read(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| DatabaseError::Read { operation, source }
    }

    /// Whether retrying the same call could succeed.
    ///
    /// Covers lost connections, pool exhaustion, lock contention and
    /// server restarts. Constraint and data errors are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            DatabaseError::Write { source, .. } | DatabaseError::Read { source, .. } => {
                is_transient_source(source)
            }
            _ => false,
        }
    }
}

fn is_transient_source(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|code| is_transient_code(&code)),
        _ => false,
    }
}

/// SQLite reports numeric result codes, PostgreSQL five-character SQLSTATEs.
fn is_transient_code(code: &str) -> bool {
    if let Ok(sqlite_code) = code.parse::<i32>() {
        // SQLITE_BUSY and SQLITE_LOCKED, including their extended codes
        return matches!(sqlite_code & 0xff, 5 | 6);
    }

    // Connection exceptions, serialization failures and deadlocks, too many
    // connections, and server shutdown or startup
    code.starts_with("08")
        || matches!(code, "40001" | "40P01" | "53300" | "57P01" | "57P02" | "57P03")
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
