use std::fmt;
use thiserror::Error;

/// Input rejected before any statement is sent to the database
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("auto_user_pct must be within [0, 100], got {0}")]
    PercentageOutOfRange(i16),

    #[error("user_id must not be the nil UUID")]
    NilUserId,

    #[error("subscription must reference at least one segment title")]
    NoSegmentTitles,

    #[error("segment titles must not be empty")]
    EmptySegmentTitle,
}

/// Point in a transaction's lifetime where the driver failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    Begin,
    Commit,
}

impl fmt::Display for TxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStage::Begin => write!(f, "begin"),
            TxStage::Commit => write!(f, "commit"),
        }
    }
}

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Request failed validation; nothing was sent to the database
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The statement and the row shape it was decoded into disagree
    #[error("Failed to build statement to {operation}: {source}")]
    QueryBuild {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Entity not found by the given identifier (or already soft-deleted)
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Driver or database failure while running a statement
    #[error("Failed to {operation}: {source}")]
    Execution {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Failure to begin or commit a transaction
    #[error("Transaction {stage} failed: {source}")]
    Transaction {
        stage: TxStage,
        #[source]
        source: sqlx::Error,
    },
}

impl DbError {
    /// Categorize a sqlx error, tagging non-recoverable ones with the operation that failed
    pub fn from_sqlx(operation: &'static str, err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnIndexOutOfBounds { .. } | sqlx::Error::TypeNotFound { .. } => {
                DbError::QueryBuild { operation, source: err }
            }
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else {
                    DbError::Execution { operation, source: err }
                }
            }
            _ => DbError::Execution { operation, source: err },
        }
    }

    pub fn transaction(stage: TxStage, source: sqlx::Error) -> Self {
        DbError::Transaction { stage, source }
    }
}

/// Convert from sqlx::Error when no more specific operation name is available
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from_sqlx("execute statement", err)
    }
}

/// Attach the name of the failing operation to a driver error.
pub trait SqlxResultExt<T> {
    fn during(self, operation: &'static str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn during(self, operation: &'static str) -> Result<T> {
        self.map_err(|e| DbError::from_sqlx(operation, e))
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
