//! Error types for rollout control.

/// Errors produced by the canary rollout controller.
#[derive(Debug, thiserror::Error)]
pub enum RolloutError {
    #[error("rollout is already at the maximum stage (100%)")]
    AlreadyAtMaximum,

    #[error("rollout is paused")]
    Paused,

    #[error("rollout has been rolled back; resume or override to re-arm")]
    RolledBack,

    #[error("stage {stage} is not in the configured stage set")]
    InvalidStage { stage: u8 },

    #[error("invalid stage set: {reason}")]
    InvalidStageSet { reason: String },

    #[error("quality metrics unavailable: {reason}")]
    MetricsUnavailable { reason: String },

    #[error("store error: {0}")]
    Store(#[from] dirigent_store::StoreError),
}

/// Result type for rollout operations.
pub type RolloutResult<T> = std::result::Result<T, RolloutError>;
