//! # Database Error Types
//!
//! Error types for storage operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  SQLite Error (sqlx::Error)                                         │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  DbError (this module) ← adds context and categorization            │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ApiError (puesto-ledger) ← serialized for the frontend             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The unavailable subset (connection/pool failures) is the only class a
//! caller may retry; everything else reports a bug or a constraint hit.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in the database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate id, second cash-out row).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation (dangling flavor/customer reference).
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation. The repositories validate first, so this
    /// surfacing means a write slipped past a guard.
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed to begin or commit.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether this error means storage itself was unreachable.
    ///
    /// This is the retry-safe class: the operation never reached the
    /// database, so retrying cannot double-apply it. Everything else must
    /// surface to the caller unretried.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionFailed(_) | DbError::PoolExhausted
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// SQLite reports constraint failures as database errors with a message
/// prefix; we parse the prefix to categorize.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Store Error
// =============================================================================

/// Combined error for repository operations that enforce business rules
/// inside their transactions.
///
/// The invariant-preserving operations (stock debits, batch registration,
/// payments, day close) perform their precondition checks against the live
/// record *inside* the transaction, so a rule violation and a storage
/// failure can both surface from the same call. Pure CRUD methods keep
/// returning plain [`DbResult`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A business rule rejected the operation (typed, expected).
    #[error(transparent)]
    Rule(#[from] puesto_core::CoreError),

    /// Storage itself failed.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl StoreError {
    /// Whether this failure is safe to retry (storage unreachable only).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Db(e) if e.is_unavailable())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Db(err.into())
    }
}

impl From<puesto_core::ValidationError> for StoreError {
    fn from(err: puesto_core::ValidationError) -> Self {
        StoreError::Rule(err.into())
    }
}

/// Result type for rule-enforcing repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        assert!(DbError::PoolExhausted.is_unavailable());
        assert!(DbError::ConnectionFailed("down".to_string()).is_unavailable());
        assert!(!DbError::not_found("Flavor", "f1").is_unavailable());
        assert!(!DbError::QueryFailed("syntax".to_string()).is_unavailable());
    }
}
