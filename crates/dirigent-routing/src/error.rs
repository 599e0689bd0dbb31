//! Error types for intent routing.

/// Errors produced by the routing layer.
///
/// `route` itself degrades gracefully and never surfaces semantic-scorer
/// failures; these variants exist for scorer implementors and the profile
/// configuration path.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("semantic scorer unavailable: {reason}")]
    SemanticUnavailable { reason: String },

    #[error("profile configuration invalid: {reason}")]
    InvalidProfile { reason: String },

    #[error("profile source error: {0}")]
    ProfileSource(String),
}

/// Result type for routing operations.
pub type RoutingResult<T> = std::result::Result<T, RoutingError>;
