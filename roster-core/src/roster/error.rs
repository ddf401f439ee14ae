// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Roster Error Types
//!
//! Unified error type for the participant and activity services.

use thiserror::Error;

use crate::dedup::MergeError;
use crate::participant::ValidationError;
use crate::store::{ErrorCategory, StoreError};

/// Unified error type for roster operations.
#[derive(Error, Debug)]
pub enum RosterError {
    /// Input failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Record store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Participant merge failed.
    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    /// Record not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl RosterError {
    /// Classifies this error for display.
    pub fn category(&self) -> ErrorCategory {
        match self {
            RosterError::Validation(_) => ErrorCategory::InvalidInput,
            RosterError::Store(e) => e.category(),
            RosterError::Merge(MergeError::PrimaryNotFound(_)) => ErrorCategory::NotFound,
            RosterError::Merge(MergeError::Store(e)) => e.category(),
            RosterError::Merge(MergeError::Incomplete { .. }) => ErrorCategory::Failed,
            RosterError::NotFound(_) => ErrorCategory::NotFound,
        }
    }

    /// Message safe to show to staff.
    ///
    /// Validation messages are already user-facing; everything else is
    /// reduced to its category message.
    pub fn user_message(&self) -> String {
        match self {
            RosterError::Validation(e) => e.to_string(),
            RosterError::Merge(e) if e.is_retryable() => {
                "The merge was interrupted. Run it again to finish.".to_string()
            }
            other => other.category().user_message().to_string(),
        }
    }
}

/// Result type for roster operations.
pub type RosterResult<T> = Result<T, RosterError>;
