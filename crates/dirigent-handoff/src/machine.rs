//! The phase handoff state machine.
//!
//! A directive's `current_phase` moves strictly forward through its declared
//! sequence; the only backward edge is the terminal `rejected` status. Each
//! mutating operation runs under the directive's keyed lock, and aggregate
//! progress is always recomputed by replaying accepted-handoff history —
//! there is no accumulated counter that can drift.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use dirigent_store::{
    Directive, DirectiveId, DirectiveRepository, DirectiveStatus, Handoff, HandoffId,
    HandoffStatus,
};

use crate::checklist::Checklist;
use crate::error::{HandoffError, HandoffResult};
use crate::locks::DirectiveLocks;
use crate::plan::{PhasePlan, ValidationPolicy};

/// Cross-component notification hook.
///
/// Invoked after a handoff has been accepted and the directive persisted,
/// outside of any entity mutation — the rollout controller hooks gate
/// re-evaluation here.
#[async_trait]
pub trait HandoffObserver: Send + Sync {
    async fn handoff_accepted(&self, directive: &Directive, handoff: &Handoff);
}

/// Recompute aggregate progress from accepted-handoff history.
///
/// A phase counts as complete once an accepted handoff leaves it; the
/// terminal phase counts as complete once an accepted handoff arrives at it.
/// Idempotent: replaying the same history always yields the same value.
pub fn replay_progress(plan: &PhasePlan, phases: &[String], accepted: &[Handoff]) -> u8 {
    let terminal = match phases.last() {
        Some(name) => name.as_str(),
        None => return 0,
    };

    let mut total: u32 = 0;
    for phase in phases {
        let completed = if phase == terminal {
            accepted.iter().any(|h| h.to_phase == *phase)
        } else {
            accepted.iter().any(|h| h.from_phase == *phase)
        };
        if completed {
            total += plan.weight_of(phase) as u32;
        }
    }
    total.min(100) as u8
}

/// Orchestrates directive phase transitions against a repository.
pub struct HandoffMachine<R: DirectiveRepository> {
    repo: Arc<R>,
    plan: PhasePlan,
    policy: ValidationPolicy,
    locks: DirectiveLocks,
    observer: Option<Arc<dyn HandoffObserver>>,
}

impl<R: DirectiveRepository> HandoffMachine<R> {
    pub fn new(repo: Arc<R>, plan: PhasePlan, policy: ValidationPolicy) -> Self {
        Self {
            repo,
            plan,
            policy,
            locks: DirectiveLocks::new(),
            observer: None,
        }
    }

    /// Attach a post-acceptance observer.
    pub fn with_observer(mut self, observer: Arc<dyn HandoffObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Create and persist a new directive following this machine's plan.
    pub async fn create_directive(&self) -> HandoffResult<Directive> {
        let directive =
            Directive::new(self.plan.phase_names()).ok_or_else(|| HandoffError::InvalidPlan {
                reason: "plan has no phases".to_string(),
            })?;
        self.repo.save_directive(&directive).await?;
        info!(event = "directive.created", directive_id = %directive.id);
        Ok(directive)
    }

    /// Propose a `from -> to` handoff for a directive.
    ///
    /// Fails with `InvalidTransition` unless `from` is the directive's
    /// current phase and `to` its immediate successor, and with
    /// `ConflictingHandoff` when a pending handoff already exists.
    pub async fn propose_handoff(
        &self,
        directive_id: &DirectiveId,
        from_phase: &str,
        to_phase: &str,
    ) -> HandoffResult<HandoffId> {
        let _guard = self.locks.acquire(directive_id).await;

        let directive = self.repo.load_directive(directive_id).await?;
        if directive.status != DirectiveStatus::Active {
            return Err(HandoffError::DirectiveInactive {
                directive_id: directive_id.to_string(),
            });
        }

        let successor = successor_of(&directive.phases, &directive.current_phase);
        let legal = from_phase == directive.current_phase
            && successor.map(|s| s == to_phase).unwrap_or(false);
        if !legal {
            return Err(HandoffError::InvalidTransition {
                directive_id: directive_id.to_string(),
                from: from_phase.to_string(),
                to: to_phase.to_string(),
            });
        }

        if self
            .repo
            .load_pending_handoff(directive_id)
            .await?
            .is_some()
        {
            return Err(HandoffError::ConflictingHandoff {
                directive_id: directive_id.to_string(),
            });
        }

        let handoff = Handoff::pending(directive_id.clone(), from_phase, to_phase);
        self.repo.save_handoff(&handoff).await?;
        info!(
            event = "handoff.proposed",
            directive_id = %directive_id,
            handoff_id = %handoff.id,
            from = %from_phase,
            to = %to_phase,
        );
        Ok(handoff.id)
    }

    /// Score a checklist against the handoff's phase-pair threshold.
    ///
    /// A passing score is recorded on the handoff; a failing score mutates
    /// nothing and returns `ValidationBelowThreshold`.
    pub async fn validate_handoff(
        &self,
        handoff_id: &HandoffId,
        checklist: &Checklist,
    ) -> HandoffResult<f64> {
        let directive_id = self.repo.load_handoff(handoff_id).await?.directive_id;
        let _guard = self.locks.acquire(&directive_id).await;

        let mut handoff = self.repo.load_handoff(handoff_id).await?;
        if handoff.status != HandoffStatus::Pending {
            return Err(HandoffError::AlreadyResolved {
                handoff_id: handoff_id.to_string(),
            });
        }

        let score = checklist.score();
        let required = self
            .policy
            .threshold(&handoff.from_phase, &handoff.to_phase);
        if score < required {
            info!(
                event = "handoff.validation_failed",
                handoff_id = %handoff_id,
                score = score,
                required = required,
                failures = ?checklist.failures(),
            );
            return Err(HandoffError::ValidationBelowThreshold { score, required });
        }

        handoff.validation_score = Some(score);
        self.repo.save_handoff(&handoff).await?;
        info!(
            event = "handoff.validated",
            handoff_id = %handoff_id,
            score = score,
        );
        Ok(score)
    }

    /// Accept a validated pending handoff and advance the directive.
    ///
    /// Recomputes progress from the full accepted-handoff history and marks
    /// the directive completed on reaching the terminal phase.
    pub async fn accept_handoff(&self, handoff_id: &HandoffId) -> HandoffResult<Directive> {
        let directive_id = self.repo.load_handoff(handoff_id).await?.directive_id;
        let _guard = self.locks.acquire(&directive_id).await;

        let mut handoff = self.repo.load_handoff(handoff_id).await?;
        if handoff.status != HandoffStatus::Pending {
            return Err(HandoffError::AlreadyResolved {
                handoff_id: handoff_id.to_string(),
            });
        }
        if handoff.validation_score.is_none() {
            return Err(HandoffError::ValidationRequired {
                handoff_id: handoff_id.to_string(),
            });
        }

        let mut directive = self.repo.load_directive(&directive_id).await?;
        // A stale handoff can outlive an administrative phase change.
        if handoff.from_phase != directive.current_phase {
            return Err(HandoffError::InvalidTransition {
                directive_id: directive_id.to_string(),
                from: handoff.from_phase.clone(),
                to: handoff.to_phase.clone(),
            });
        }

        handoff.status = HandoffStatus::Accepted;
        handoff.resolved_at = Some(Utc::now());
        self.repo.save_handoff(&handoff).await?;

        let accepted: Vec<Handoff> = self
            .repo
            .list_handoffs(&directive_id)
            .await?
            .into_iter()
            .filter(|h| h.status == HandoffStatus::Accepted)
            .collect();

        directive.current_phase = handoff.to_phase.clone();
        directive.progress = replay_progress(&self.plan, &directive.phases, &accepted);
        if directive.phases.last() == Some(&directive.current_phase) {
            directive.status = DirectiveStatus::Completed;
        }
        directive.updated_at = Utc::now();
        self.repo.save_directive(&directive).await?;

        info!(
            event = "handoff.accepted",
            directive_id = %directive_id,
            handoff_id = %handoff_id,
            phase = %directive.current_phase,
            progress = directive.progress,
        );

        if let Some(observer) = &self.observer {
            observer.handoff_accepted(&directive, &handoff).await;
        }
        Ok(directive)
    }

    /// Reject a pending handoff.
    ///
    /// The directive's phase is unchanged; a `terminal` rejection also moves
    /// the directive to `Rejected` status.
    pub async fn reject_handoff(
        &self,
        handoff_id: &HandoffId,
        reason: impl Into<String>,
        terminal: bool,
    ) -> HandoffResult<()> {
        let directive_id = self.repo.load_handoff(handoff_id).await?.directive_id;
        let _guard = self.locks.acquire(&directive_id).await;

        let mut handoff = self.repo.load_handoff(handoff_id).await?;
        if handoff.status != HandoffStatus::Pending {
            return Err(HandoffError::AlreadyResolved {
                handoff_id: handoff_id.to_string(),
            });
        }

        let reason = reason.into();
        handoff.status = HandoffStatus::Rejected;
        handoff.reason = Some(reason.clone());
        handoff.resolved_at = Some(Utc::now());
        self.repo.save_handoff(&handoff).await?;

        if terminal {
            let mut directive = self.repo.load_directive(&directive_id).await?;
            directive.status = DirectiveStatus::Rejected;
            directive.updated_at = Utc::now();
            self.repo.save_directive(&directive).await?;
        }

        info!(
            event = "handoff.rejected",
            directive_id = %directive_id,
            handoff_id = %handoff_id,
            terminal = terminal,
            reason = %reason,
        );
        Ok(())
    }

    /// Aggregate progress, recomputed from accepted-handoff history alone.
    pub async fn progress(&self, directive_id: &DirectiveId) -> HandoffResult<u8> {
        let directive = self.repo.load_directive(directive_id).await?;
        let accepted: Vec<Handoff> = self
            .repo
            .list_handoffs(directive_id)
            .await?
            .into_iter()
            .filter(|h| h.status == HandoffStatus::Accepted)
            .collect();
        Ok(replay_progress(&self.plan, &directive.phases, &accepted))
    }
}

/// The immediate successor of `current` in `phases`, if any.
fn successor_of<'a>(phases: &'a [String], current: &str) -> Option<&'a str> {
    let idx = phases.iter().position(|p| p == current)?;
    phases.get(idx + 1).map(|s| s.as_str())
}
