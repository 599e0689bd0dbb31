//! Dirigent-Handoff: Phase Handoff State Machine
//!
//! Moves directives strictly forward through their declared phase sequence:
//! - `propose_handoff` creates the single pending handoff for a directive
//! - `validate_handoff` scores a weighted checklist against a per-phase-pair
//!   threshold without mutating status
//! - `accept_handoff` advances the directive and recomputes progress by
//!   replaying accepted-handoff history
//! - `reject_handoff` resolves the handoff, optionally terminating the
//!   directive
//!
//! Mutating operations are serialized per directive by an in-process keyed
//! lock; distinct directives proceed fully concurrently.

pub mod checklist;
pub mod error;
pub mod locks;
pub mod machine;
pub mod plan;

pub use checklist::{Checklist, ChecklistItem};
pub use error::{HandoffError, HandoffResult};
pub use machine::{HandoffMachine, HandoffObserver};
pub use plan::{PhasePlan, PhaseSpec, ValidationPolicy};
