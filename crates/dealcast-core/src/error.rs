// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Dealcast posting engine.

use thiserror::Error;

/// The primary error type used across all Dealcast adapter traits and engine operations.
#[derive(Debug, Error)]
pub enum DealcastError {
    /// Configuration errors (invalid TOML, missing required fields, rejected campaign settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Product search collaborator errors (HTTP failure, malformed response).
    #[error("search error: {message}")]
    Search {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Posting transport errors (channel unreachable, rate limiting).
    #[error("delivery error: {message}")]
    Delivery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Notification sink errors.
    #[error("notification error: {message}")]
    Notify {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint was violated (duplicate campaign name, etc.).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A campaign status change was refused by the lifecycle rules.
    #[error("cannot move campaign from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DealcastError {
    /// Shorthand for a [`DealcastError::NotFound`] on a campaign id.
    pub fn campaign_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "campaign",
            id: id.to_string(),
        }
    }
}
