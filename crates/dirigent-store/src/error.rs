//! Error types for dirigent-store

use thiserror::Error;

/// Errors produced by the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Directive does not exist
    #[error("directive not found: {directive_id}")]
    DirectiveNotFound { directive_id: String },

    /// Handoff does not exist
    #[error("handoff not found: {handoff_id}")]
    HandoffNotFound { handoff_id: String },

    /// Rollout has no recorded history
    #[error("rollout not found: {rollout_id}")]
    RolloutNotFound { rollout_id: String },

    /// Serialization error
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Backend-specific failure (connection, query, transaction)
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
