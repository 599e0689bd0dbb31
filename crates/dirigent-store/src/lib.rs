//! Dirigent-Store: Persistence Abstractions for Dirigent
//!
//! This crate defines the entity records and repository traits that the
//! orchestration crates build on. It holds no I/O of its own: backends
//! implement the traits, and in-memory fakes are provided for tests and
//! embedding.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: Record shapes, trait contracts, and replayable history.
//!
//! ## Key Components
//!
//! - `Directive` / `Handoff`: the phase-gated workflow entities
//! - `StageTransition`: append-only rollout history records
//! - `DirectiveRepository` / `RolloutLedger`: async storage contracts
//! - `fakes`: `Mutex<HashMap>`-backed implementations of both traits

mod error;
pub mod fakes;
mod records;
pub mod repository;
pub mod telemetry;

pub use error::StoreError;
pub use records::{
    Directive, DirectiveId, DirectiveStatus, Handoff, HandoffId, HandoffStatus, RolloutId,
    StageTransition, TransitionKind,
};
pub use repository::{DirectiveRepository, RolloutLedger};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
