use thiserror::Error;

use crate::Table;

/// Errors that can occur when interacting with the row store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the operation (constraint violation, simulated
    /// outage, etc.). Carries the store's own diagnostics.
    #[error("{message}")]
    Rejected {
        table: Table,
        message: String,
        code: Option<String>,
        details: Option<String>,
    },

    /// A row or filter referenced a column the table does not have.
    #[error("Unknown column '{column}' for table {table}")]
    UnknownColumn { table: Table, column: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates a rejection without store diagnostics.
    pub fn rejected(table: Table, message: impl Into<String>) -> Self {
        StoreError::Rejected {
            table,
            message: message.into(),
            code: None,
            details: None,
        }
    }

    /// Returns true if the store itself turned the request down, as opposed
    /// to the request being malformed on our side.
    pub fn is_rejection(&self) -> bool {
        matches!(self, StoreError::Rejected { .. } | StoreError::Database(_))
    }

    /// Store-specific error code (SQLSTATE for PostgreSQL), if any.
    pub fn code(&self) -> Option<String> {
        match self {
            StoreError::Rejected { code, .. } => code.clone(),
            StoreError::UnknownColumn { .. } => Some("42703".to_string()),
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().map(|c| c.into_owned())
            }
            _ => None,
        }
    }

    /// Additional diagnostics, if any.
    pub fn details(&self) -> Option<String> {
        match self {
            StoreError::Rejected { details, .. } => details.clone(),
            StoreError::Database(sqlx::Error::Database(db_err)) => db_err
                .constraint()
                .map(|constraint| format!("constraint: {constraint}")),
            _ => None,
        }
    }
}

/// Result type for row store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
