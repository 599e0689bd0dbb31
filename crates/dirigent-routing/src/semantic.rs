//! Semantic scoring service contract.
//!
//! The embedding-similarity service is an external collaborator; any
//! transport works as long as the future is cancellable, because the router
//! drops the whole semantic pass at its deadline.

use async_trait::async_trait;

use crate::error::RoutingResult;

/// External embedding-similarity scorer.
#[async_trait]
pub trait SemanticScorer: Send + Sync {
    /// Similarity of `text` to the agent's semantic descriptor, 0-100.
    ///
    /// Implementations should return `RoutingError::SemanticUnavailable` for
    /// transport failures; the router logs and degrades to keyword scoring.
    async fn score(&self, text: &str, profile_id: &str) -> RoutingResult<f64>;
}
