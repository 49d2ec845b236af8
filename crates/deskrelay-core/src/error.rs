// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the deskrelay coordinator.

use thiserror::Error;

/// The primary error type used across deskrelay capability traits.
///
/// Coordinator code never lets these escape to callers: storage and desk
/// failures are folded into default values, `false`, or `None`. Only
/// [`RelayError::InvalidRequest`] is meant to reach a command caller.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Remote desk errors (transport failure, non-2xx status, malformed body).
    #[error("desk error: {message}")]
    Desk {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Caller input errors, rejected before any I/O.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Shorthand for wrapping any error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        RelayError::Storage {
            source: Box::new(err),
        }
    }

    /// Returns true if this error came from bad caller input.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, RelayError::InvalidRequest(_))
    }
}
