//! # Store Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        Stored JSON that no longer parses    │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError ← which entity, which column, which unique field              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (harvest-api) ← {success: false, message} envelope           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Failures surfaced by either store.
#[derive(Debug, Error)]
pub enum DbError {
    /// An update or delete matched no row, or a row vanished between a read
    /// and the write that followed it.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write: order numbers, account emails and
    /// image filenames are all unique.
    #[error("{field} '{value}' is already taken")]
    UniqueViolation { field: String, value: String },

    /// The store could not be opened or its pool has been closed.
    #[error("store unavailable: {0}")]
    ConnectionFailed(String),

    #[error("migration error: {0}")]
    MigrationFailed(String),

    /// SQLite refused the statement.
    #[error("sqlite: {0}")]
    QueryFailed(String),

    /// A row came back that no longer maps onto the domain types, e.g. an
    /// order's `items` JSON edited by hand or an unknown status string.
    #[error("bad value in {column}: {reason}")]
    InvalidData { column: String, reason: String },

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("all store connections are busy")]
    PoolExhausted,

    #[error("{0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn invalid_data(column: impl Into<String>, reason: impl ToString) -> Self {
        DbError::InvalidData {
            column: column.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

/// ```text
/// RowNotFound            → NotFound
/// Database (UNIQUE ...)  → UniqueViolation
/// Database (other)       → QueryFailed
/// PoolTimedOut           → PoolExhausted
/// PoolClosed             → ConnectionFailed
/// ColumnDecode           → InvalidData
/// anything else          → Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                match msg.split("UNIQUE constraint failed: ").nth(1) {
                    Some(field) => DbError::duplicate(field, "unknown"),
                    None => DbError::QueryFailed(msg.to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),

            sqlx::Error::ColumnDecode { index, source } => DbError::invalid_data(index, source),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::invalid_data("json", err)
    }
}

pub type DbResult<T> = Result<T, DbError>;
