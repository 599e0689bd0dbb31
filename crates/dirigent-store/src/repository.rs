//! Repository trait definitions for Dirigent
//!
//! These traits define the storage contracts consumed by the orchestration
//! crates:
//! - `DirectiveRepository`: directive and handoff persistence
//! - `RolloutLedger`: append-only rollout stage history
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;

use crate::records::{Directive, DirectiveId, Handoff, HandoffId, RolloutId, StageTransition};
use crate::StoreResult;

/// Directive and handoff store.
///
/// Guarantees:
/// - Strong read-after-write consistency for a single directive.
/// - At most one `Pending` handoff per directive: `save_handoff` rejects a
///   second pending handoff for the same directive with
///   `StoreError::Backend`. Callers are expected to check
///   `load_pending_handoff` first and treat the save failure as a race.
#[async_trait]
pub trait DirectiveRepository: Send + Sync {
    /// Load a directive by ID. Returns `StoreError::DirectiveNotFound` if absent.
    async fn load_directive(&self, id: &DirectiveId) -> StoreResult<Directive>;

    /// Insert or update a directive.
    async fn save_directive(&self, directive: &Directive) -> StoreResult<()>;

    /// Insert or update a handoff.
    async fn save_handoff(&self, handoff: &Handoff) -> StoreResult<()>;

    /// Load a handoff by ID. Returns `StoreError::HandoffNotFound` if absent.
    async fn load_handoff(&self, id: &HandoffId) -> StoreResult<Handoff>;

    /// The directive's pending handoff, if one exists.
    async fn load_pending_handoff(&self, directive_id: &DirectiveId)
        -> StoreResult<Option<Handoff>>;

    /// All handoffs for a directive, ordered by creation time.
    ///
    /// Progress recomputation replays the accepted subset of this list.
    async fn list_handoffs(&self, directive_id: &DirectiveId) -> StoreResult<Vec<Handoff>>;
}

/// Append-only rollout stage history.
///
/// Semantics:
/// - `append_transition` never overwrites; history only grows.
/// - `history` returns the complete transition chain oldest-first, so a
///   controller can be reconstructed by replaying it front to back.
#[async_trait]
pub trait RolloutLedger: Send + Sync {
    /// Append one transition to the rollout's history.
    async fn append_transition(
        &self,
        rollout_id: &RolloutId,
        transition: StageTransition,
    ) -> StoreResult<()>;

    /// Full transition history for a rollout, oldest first.
    ///
    /// Returns an empty vec for a rollout with no recorded transitions.
    async fn history(&self, rollout_id: &RolloutId) -> StoreResult<Vec<StageTransition>>;
}
