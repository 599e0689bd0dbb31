//! Entity records shared across the orchestration crates.
//!
//! All records are plain serde structs. Mutation rules live in the crates
//! that own each entity: `dirigent-handoff` is the only writer of
//! `Directive`/`Handoff`, `dirigent-rollout` the only writer of
//! `StageTransition` history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a directive (a unit of work moving through phases).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectiveId(pub String);

impl DirectiveId {
    /// Generate a new random DirectiveId
    pub fn new() -> Self {
        DirectiveId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for DirectiveId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DirectiveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a handoff record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandoffId(pub String);

impl HandoffId {
    /// Generate a new random HandoffId
    pub fn new() -> Self {
        HandoffId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for HandoffId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HandoffId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a rollout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RolloutId(pub String);

impl RolloutId {
    /// Generate a new random RolloutId
    pub fn new() -> Self {
        RolloutId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for RolloutId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RolloutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveStatus {
    Active,
    Completed,
    Rejected,
}

/// A unit of work progressing through an ordered phase sequence.
///
/// `progress` is a cached value; the handoff state machine always
/// recomputes it from accepted-handoff history before writing it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    pub id: DirectiveId,
    /// Declared phase sequence, in order (e.g. LEAD, PLAN, EXEC, VERIFY, APPROVE)
    pub phases: Vec<String>,
    /// Phase the directive currently sits in
    pub current_phase: String,
    /// Aggregate progress, 0-100
    pub progress: u8,
    pub status: DirectiveStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Directive {
    /// Create a new active directive at the first phase of `phases`.
    ///
    /// Returns `None` when `phases` is empty.
    pub fn new(phases: Vec<String>) -> Option<Self> {
        let first = phases.first()?.clone();
        let now = Utc::now();
        Some(Self {
            id: DirectiveId::new(),
            phases,
            current_phase: first,
            progress: 0,
            status: DirectiveStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Resolution status of a handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A proposed transition of a directive from one phase to the next.
///
/// Terminal once accepted or rejected. At most one `Pending` handoff may
/// exist per directive at a time; the repository enforces this on save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Handoff {
    pub id: HandoffId,
    pub directive_id: DirectiveId,
    pub from_phase: String,
    pub to_phase: String,
    pub status: HandoffStatus,
    /// Checklist score recorded by a successful validation, 0-100
    pub validation_score: Option<f64>,
    /// Rejection reason, when rejected
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Handoff {
    /// Create a new pending handoff for `directive_id`.
    pub fn pending(
        directive_id: DirectiveId,
        from_phase: impl Into<String>,
        to_phase: impl Into<String>,
    ) -> Self {
        Self {
            id: HandoffId::new(),
            directive_id,
            from_phase: from_phase.into(),
            to_phase: to_phase.into(),
            status: HandoffStatus::Pending,
            validation_score: None,
            reason: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}

/// What kind of state change a rollout transition records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Advance,
    Override,
    Rollback,
    Pause,
    Resume,
}

/// One immutable entry in a rollout's stage history.
///
/// History is the sole source of truth for the controller's state: replaying
/// the full transition list reconstructs stage and paused/rolled-back flags.
/// Pause and resume are recorded with `from == to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    /// Stage before the transition (percentage)
    pub from: u8,
    /// Stage after the transition (percentage)
    pub to: u8,
    pub kind: TransitionKind,
    /// Why the transition happened; never empty for rollbacks
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl StageTransition {
    pub fn new(from: u8, to: u8, kind: TransitionKind, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            kind,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}
