// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Store error types.

use thiserror::Error;

/// Record store error types.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A unique key would be duplicated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A foreign key is missing or still referenced.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Coarse classification of a store failure for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Duplicate,
    Constraint,
    NotFound,
    InvalidInput,
    Unavailable,
    Failed,
}

impl ErrorCategory {
    /// Sanitized message safe to show to staff.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::Duplicate => "This entry already exists.",
            ErrorCategory::Constraint => {
                "This record is still referenced by other records and cannot be changed."
            }
            ErrorCategory::NotFound => "The requested record was not found.",
            ErrorCategory::InvalidInput => "The request contained invalid input.",
            ErrorCategory::Unavailable => "The database is currently unavailable.",
            ErrorCategory::Failed => "The operation failed.",
        }
    }
}

impl StoreError {
    /// Classifies this error for display.
    pub fn category(&self) -> ErrorCategory {
        match self {
            StoreError::Conflict(_) => ErrorCategory::Duplicate,
            StoreError::Constraint(_) => ErrorCategory::Constraint,
            StoreError::NotFound(_) => ErrorCategory::NotFound,
            StoreError::InvalidQuery(_) => ErrorCategory::InvalidInput,
            StoreError::Database(e) => match e.sqlite_error_code() {
                Some(rusqlite::ErrorCode::DatabaseBusy)
                | Some(rusqlite::ErrorCode::DatabaseLocked)
                | Some(rusqlite::ErrorCode::CannotOpen) => ErrorCategory::Unavailable,
                _ => ErrorCategory::Failed,
            },
            StoreError::Serialization(_) | StoreError::Backend(_) | StoreError::Migration(_) => {
                ErrorCategory::Failed
            }
        }
    }
}

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_duplicate() {
        let err = StoreError::Conflict("registrations".into());
        assert_eq!(err.category(), ErrorCategory::Duplicate);
        assert_eq!(err.category().user_message(), "This entry already exists.");
    }

    #[test]
    fn test_backend_error_is_generic_failure() {
        let err = StoreError::Backend("lost".into());
        assert_eq!(err.category(), ErrorCategory::Failed);
    }

    #[test]
    fn test_busy_database_is_unavailable() {
        let err = StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert_eq!(err.category(), ErrorCategory::Unavailable);
    }
}
