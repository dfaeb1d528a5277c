//! # Database Error Types
//!
//! Storage-level errors, plus transparent pass-through of domain errors
//! raised inside repository logic.
//!
//! ## Error Flow
//! ```text
//! sqlx::Error ──► DbError (this module) ──► ErrorKind / ApiResponse
//!                    ▲
//! DomainError ───────┘ (carried transparently, message unchanged)
//! ```

use thiserror::Error;

use gstbill_core::error::{DomainError, ErrorKind};

/// Result alias used throughout the repositories.
pub type DbResult<T> = Result<T, DbError>;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A business-rule failure detected inside a repository. The variant
    /// is transparent so the caller sees the domain message unchanged.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Entity not found in the database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate SKU, invoice number, ...).
    #[error("Duplicate value for {field}: already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Lock contention or pool exhaustion; safe to retry.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Any other query failure.
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound { entity: entity.into(), id: id.into() }
    }

    /// The machine-readable kind for the response envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Domain(inner) => inner.kind(),
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } => ErrorKind::Conflict,
            DbError::ForeignKeyViolation(_) => ErrorKind::Conflict,
            DbError::Timeout(_) => ErrorKind::Timeout,
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_) => ErrorKind::Internal,
        }
    }

    /// Whether this is a unique violation on the given column (used by
    /// the invoice-number retry loop).
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field } if field.contains(column))
    }
}

/// Convert sqlx errors to DbError.
///
/// SQLite reports constraint failures as messages:
///   UNIQUE (column): "UNIQUE constraint failed: <table>.<column>"
///   UNIQUE (expression index): "UNIQUE constraint failed: index '<name>'"
///   FOREIGN KEY: "FOREIGN KEY constraint failed"
///
/// Expression-index names must therefore contain the column they guard
/// for [`DbError::is_unique_violation_on`] to recognize them.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();

                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    return DbError::UniqueViolation { field: field.to_string() };
                }
                if msg.contains("FOREIGN KEY constraint failed") {
                    return DbError::ForeignKeyViolation(msg);
                }
                if msg.contains("database is locked") {
                    return DbError::Timeout(msg);
                }
                DbError::QueryFailed(msg)
            }

            sqlx::Error::PoolTimedOut => {
                DbError::Timeout("connection pool exhausted".to_string())
            }

            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),

            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}
