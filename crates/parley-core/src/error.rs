// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley support chat.

use thiserror::Error;

/// The primary error type used across all Parley adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Caller input was rejected before any side effect took place.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller exceeded a rate limit or is banned.
    #[error("rate limit exceeded")]
    RateLimited,

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Generative AI provider errors (HTTP failure, safety block, malformed response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Staff notification delivery failed.
    #[error("notification error: {message}")]
    Notify {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Shorthand for a [`ParleyError::NotFound`] on a conversation id.
    pub fn conversation_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "conversation",
            id: id.to_string(),
        }
    }

    /// Returns true for errors caused by the caller rather than the system.
    ///
    /// These are rejected with a 4xx-equivalent and never leave partial writes.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::RateLimited | Self::NotFound { .. }
        )
    }
}
