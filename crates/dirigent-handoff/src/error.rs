//! Error types for the handoff state machine.

/// Errors produced by the phase handoff state machine.
///
/// Every variant except `Store` is a contract violation the caller can
/// recover from by retrying with corrected state.
#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("invalid transition for directive {directive_id}: {from} -> {to}")]
    InvalidTransition {
        directive_id: String,
        from: String,
        to: String,
    },

    #[error("directive {directive_id} already has a pending handoff")]
    ConflictingHandoff { directive_id: String },

    #[error("handoff {handoff_id} is already resolved")]
    AlreadyResolved { handoff_id: String },

    #[error("handoff {handoff_id} has not passed validation")]
    ValidationRequired { handoff_id: String },

    #[error("validation score {score:.1} is below the required {required:.1}")]
    ValidationBelowThreshold { score: f64, required: f64 },

    #[error("invalid phase plan: {reason}")]
    InvalidPlan { reason: String },

    #[error("directive {directive_id} is not active")]
    DirectiveInactive { directive_id: String },

    #[error("store error: {0}")]
    Store(#[from] dirigent_store::StoreError),
}

/// Result type for handoff operations.
pub type HandoffResult<T> = std::result::Result<T, HandoffError>;
