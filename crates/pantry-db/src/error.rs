//! # Database Error Types
//!
//! Error types for store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error / MigrateError)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds categorization                           │
//! │       │                                                                 │
//! │       ├── opening a store        → StorageInit                         │
//! │       ├── duplicate key, NOT NULL → ConstraintViolation                │
//! │       ├── pool closed            → Closed                              │
//! │       └── anything else          → Storage / PoolExhausted             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Immediate caller decides: retry, report, ignore                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A no-op `update`/`delete` (key not present) is never an error.

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Constructing a database container failed.
    ///
    /// ## When This Occurs
    /// - Data directory can't be created
    /// - Database file is corrupt or not a database
    /// - Applied schema doesn't match the embedded migrations
    /// - File permissions issue
    #[error("Storage initialization failed: {0}")]
    StorageInit(String),

    /// A schema constraint rejected a mutation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate primary key under the reject policy
    /// - NOT NULL / CHECK failures
    #[error("Constraint violation on {constraint}: {message}")]
    ConstraintViolation {
        constraint: String,
        message: String,
    },

    /// The storage handle was closed.
    #[error("Storage handle is closed")]
    Closed,

    /// Pool exhausted (all connections in use until the acquire timeout).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Generic engine or I/O failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Storage settings could not be read or parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DbError {
    /// Creates a ConstraintViolation error.
    pub fn constraint(constraint: impl Into<String>, message: impl Into<String>) -> Self {
        DbError::ConstraintViolation {
            constraint: constraint.into(),
            message: message.into(),
        }
    }

    /// Returns true for constraint violations (e.g. duplicate keys).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DbError::ConstraintViolation { .. })
    }

    /// Returns true when the error came from a closed storage handle.
    pub fn is_closed(&self) -> bool {
        matches!(self, DbError::Closed)
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database (constraint kind)  → DbError::ConstraintViolation
/// sqlx::Error::Database (other)            → DbError::Storage
/// sqlx::Error::PoolClosed                  → DbError::Closed
/// sqlx::Error::PoolTimedOut                → DbError::PoolExhausted
/// Other                                    → DbError::Storage
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports constraint failures as
                // "<KIND> constraint failed: <table>.<column>"
                let constraint = msg
                    .split(" constraint failed: ")
                    .nth(1)
                    .unwrap_or("unknown")
                    .to_string();

                match db_err.kind() {
                    ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation => DbError::constraint(constraint, msg),
                    _ if msg.contains("constraint failed") => DbError::constraint(constraint, msg),
                    _ => DbError::Storage(msg.to_string()),
                }
            }

            sqlx::Error::PoolClosed => DbError::Closed,

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            _ => DbError::Storage(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::StorageInit(format!("migration failed: {}", err))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_map_to_categories() {
        assert!(DbError::from(sqlx::Error::PoolClosed).is_closed());
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::Storage(_)
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = DbError::constraint("products.id", "UNIQUE constraint failed: products.id");
        assert!(err.is_constraint_violation());
        assert_eq!(
            err.to_string(),
            "Constraint violation on products.id: UNIQUE constraint failed: products.id"
        );
        assert_eq!(DbError::Closed.to_string(), "Storage handle is closed");
    }
}
