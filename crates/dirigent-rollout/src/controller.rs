//! Canary rollout controller.
//!
//! The controller owns one rollout's live state (current stage, running /
//! paused / rolled-back) and every mutation appends a `StageTransition` to
//! the ledger before the in-memory state changes. The ledger is the sole
//! source of truth: `replay` reconstructs the same state from history, and
//! `from_history` resumes a controller after a restart.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use dirigent_store::{RolloutLedger, StageTransition, TransitionKind};

use crate::error::{RolloutError, RolloutResult};
use crate::gate::{GateMetrics, GatePolicy, QualityGateResult};
use crate::retry::RetryConfig;
use crate::spec::RolloutSpec;
use crate::stage::StageSet;

/// Context handed to the metrics collaborator when fetching a snapshot.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Rollout the metrics are scoped to
    pub rollout_id: String,
    /// Stage whose traffic slice the window covers
    pub stage: u8,
}

/// Metrics collaborator.
///
/// Implementations fetch the latest quality window for the rollout's
/// canary slice. Fetch failures are treated as transient; the controller
/// retries with backoff before giving up.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch(&self, ctx: &StageContext) -> RolloutResult<GateMetrics>;
}

/// Lifecycle state of a rollout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutStatus {
    /// Advancing normally; gates are evaluated on schedule
    Running,
    /// Held by an operator; no advancement or gate evaluation
    Paused,
    /// Collapsed to 0% by a failing gate or manual rollback
    RolledBack,
}

/// Outcome of one scheduled gate evaluation.
#[derive(Debug)]
pub enum EvalOutcome {
    /// Gates passed; the rollout stays at its stage
    Passed(QualityGateResult),
    /// Gates failed; the rollout was collapsed to 0%
    RolledBack(QualityGateResult),
    /// A previous evaluation was still in flight
    Skipped,
    /// Rollout is paused, rolled back, or still at stage 0
    NotRunning,
}

struct ControllerState {
    stage: u8,
    status: RolloutStatus,
    last_evaluated_at: Option<DateTime<Utc>>,
}

/// Controller for one staged canary rollout.
pub struct CanaryController<L, M> {
    spec: RolloutSpec,
    ledger: Arc<L>,
    metrics: Arc<M>,
    stages: StageSet,
    policy: GatePolicy,
    retry: RetryConfig,
    state: Mutex<ControllerState>,
    // Held for the duration of one gate evaluation; try_lock failure means
    // an evaluation is already in flight and the new one is skipped.
    eval_guard: Mutex<()>,
}

impl<L, M> CanaryController<L, M>
where
    L: RolloutLedger,
    M: MetricsSource,
{
    /// Start a fresh controller at stage 0, running.
    pub fn new(
        spec: RolloutSpec,
        ledger: Arc<L>,
        metrics: Arc<M>,
        stages: StageSet,
        policy: GatePolicy,
        retry: RetryConfig,
    ) -> Self {
        Self {
            spec,
            ledger,
            metrics,
            stages,
            policy,
            retry,
            state: Mutex::new(ControllerState {
                stage: 0,
                status: RolloutStatus::Running,
                last_evaluated_at: None,
            }),
            eval_guard: Mutex::new(()),
        }
    }

    /// Resume a controller from its recorded history.
    ///
    /// Replays the ledger front to back and starts from the reconstructed
    /// stage and status. A rollout with no history starts fresh at 0%.
    pub async fn from_history(
        spec: RolloutSpec,
        ledger: Arc<L>,
        metrics: Arc<M>,
        stages: StageSet,
        policy: GatePolicy,
        retry: RetryConfig,
    ) -> RolloutResult<Self> {
        let history = ledger.history(&spec.rollout_id).await?;
        let (stage, status) = replay(&history);
        info!(
            event = "rollout.resumed",
            rollout_id = %spec.rollout_id,
            stage,
            status = ?status,
            transitions = history.len(),
            "controller reconstructed from ledger"
        );
        Ok(Self {
            spec,
            ledger,
            metrics,
            stages,
            policy,
            retry,
            state: Mutex::new(ControllerState {
                stage,
                status,
                last_evaluated_at: None,
            }),
            eval_guard: Mutex::new(()),
        })
    }

    pub fn spec(&self) -> &RolloutSpec {
        &self.spec
    }

    pub async fn current_stage(&self) -> u8 {
        self.state.lock().await.stage
    }

    pub async fn status(&self) -> RolloutStatus {
        self.state.lock().await.status
    }

    pub async fn last_evaluated_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_evaluated_at
    }

    /// Full transition history for this rollout, oldest first.
    pub async fn history(&self) -> RolloutResult<Vec<StageTransition>> {
        Ok(self.ledger.history(&self.spec.rollout_id).await?)
    }

    /// Advance to the next stage in the set.
    ///
    /// Fails when paused, rolled back, or already at 100%. The transition
    /// is appended to the ledger before the live stage changes; if the
    /// append fails the stage does not move.
    pub async fn advance(&self, reason: impl Into<String>) -> RolloutResult<u8> {
        let mut state = self.state.lock().await;
        match state.status {
            RolloutStatus::Paused => return Err(RolloutError::Paused),
            RolloutStatus::RolledBack => return Err(RolloutError::RolledBack),
            RolloutStatus::Running => {}
        }
        let next = self
            .stages
            .next_after(state.stage)
            .ok_or(RolloutError::AlreadyAtMaximum)?;

        let transition =
            StageTransition::new(state.stage, next, TransitionKind::Advance, reason);
        self.ledger
            .append_transition(&self.spec.rollout_id, transition)
            .await?;

        info!(
            event = "rollout.advanced",
            rollout_id = %self.spec.rollout_id,
            from = state.stage,
            to = next,
            "advanced to next stage"
        );
        state.stage = next;
        Ok(next)
    }

    /// Administratively set the stage to any member of the stage set.
    ///
    /// The override bypasses pause and rollback alike: the rollout comes
    /// out running at the requested stage.
    pub async fn set_stage(&self, stage: u8, reason: impl Into<String>) -> RolloutResult<u8> {
        if !self.stages.contains(stage) {
            return Err(RolloutError::InvalidStage { stage });
        }
        let mut state = self.state.lock().await;

        let transition =
            StageTransition::new(state.stage, stage, TransitionKind::Override, reason);
        self.ledger
            .append_transition(&self.spec.rollout_id, transition)
            .await?;

        warn!(
            event = "rollout.stage_override",
            rollout_id = %self.spec.rollout_id,
            from = state.stage,
            to = stage,
            "stage set administratively"
        );
        state.stage = stage;
        state.status = RolloutStatus::Running;
        Ok(stage)
    }

    /// Pause the rollout. Idempotent; a second pause appends nothing.
    pub async fn pause(&self, reason: impl Into<String>) -> RolloutResult<()> {
        let mut state = self.state.lock().await;
        if state.status == RolloutStatus::Paused {
            return Ok(());
        }

        let transition =
            StageTransition::new(state.stage, state.stage, TransitionKind::Pause, reason);
        self.ledger
            .append_transition(&self.spec.rollout_id, transition)
            .await?;

        info!(
            event = "rollout.paused",
            rollout_id = %self.spec.rollout_id,
            stage = state.stage,
            "rollout paused"
        );
        state.status = RolloutStatus::Paused;
        Ok(())
    }

    /// Resume a paused or rolled-back rollout at its current stage.
    /// Idempotent; resuming a running rollout appends nothing.
    pub async fn resume(&self, reason: impl Into<String>) -> RolloutResult<()> {
        let mut state = self.state.lock().await;
        if state.status == RolloutStatus::Running {
            return Ok(());
        }

        let transition =
            StageTransition::new(state.stage, state.stage, TransitionKind::Resume, reason);
        self.ledger
            .append_transition(&self.spec.rollout_id, transition)
            .await?;

        info!(
            event = "rollout.resumed",
            rollout_id = %self.spec.rollout_id,
            stage = state.stage,
            "rollout resumed"
        );
        state.status = RolloutStatus::Running;
        Ok(())
    }

    /// Collapse the rollout to 0%.
    ///
    /// The reason is mandatory and recorded in the transition so every
    /// rollback in history is diagnosable. Idempotent once rolled back.
    pub async fn rollback(&self, reason: impl Into<String>) -> RolloutResult<()> {
        let mut state = self.state.lock().await;
        if state.status == RolloutStatus::RolledBack && state.stage == 0 {
            return Ok(());
        }

        let transition = StageTransition::new(state.stage, 0, TransitionKind::Rollback, reason);
        let reason_str = transition.reason.clone();
        self.ledger
            .append_transition(&self.spec.rollout_id, transition)
            .await?;

        error!(
            event = "rollout.rolled_back",
            rollout_id = %self.spec.rollout_id,
            from = state.stage,
            reason = %reason_str,
            "rollout collapsed to 0%"
        );
        state.stage = 0;
        state.status = RolloutStatus::RolledBack;
        Ok(())
    }

    /// Run one quality-gate evaluation.
    ///
    /// Overlap-safe: if a previous evaluation is still in flight this one
    /// returns `Skipped` immediately rather than queueing. Metric fetches
    /// are retried with backoff; when every attempt fails the rollout is
    /// rolled back with the fetch failure as the reason.
    pub async fn evaluate_quality_gates(&self) -> RolloutResult<EvalOutcome> {
        let _guard = match self.eval_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!(
                    event = "rollout.eval_skipped",
                    rollout_id = %self.spec.rollout_id,
                    "previous evaluation still in flight"
                );
                return Ok(EvalOutcome::Skipped);
            }
        };

        let ctx = {
            let state = self.state.lock().await;
            if state.status != RolloutStatus::Running || state.stage == 0 {
                return Ok(EvalOutcome::NotRunning);
            }
            StageContext {
                rollout_id: self.spec.rollout_id.to_string(),
                stage: state.stage,
            }
        };

        let verdict = match self.fetch_metrics_with_retry(&ctx).await {
            Ok(metrics) => self.policy.evaluate(metrics),
            Err(err) => {
                let reason = format!("quality metrics unavailable: {err}");
                warn!(
                    event = "rollout.metrics_exhausted",
                    rollout_id = %self.spec.rollout_id,
                    stage = ctx.stage,
                    error = %err,
                    "metric fetch retries exhausted"
                );
                self.rollback(&reason).await?;
                self.state.lock().await.last_evaluated_at = Some(Utc::now());
                return Ok(EvalOutcome::RolledBack(QualityGateResult {
                    passed: false,
                    violations: vec![reason.clone()],
                    message: reason,
                    metrics: GateMetrics {
                        sample_count: 0,
                        error_rate: 0.0,
                        latency_p95_ms: 0,
                        baseline_latency_p95_ms: None,
                    },
                }));
            }
        };

        self.state.lock().await.last_evaluated_at = Some(Utc::now());

        if verdict.passed {
            debug!(
                event = "rollout.gates_passed",
                rollout_id = %self.spec.rollout_id,
                stage = ctx.stage,
                message = %verdict.message,
                "quality gates passed"
            );
            return Ok(EvalOutcome::Passed(verdict));
        }

        let reason = verdict.violations.join("; ");
        self.rollback(&reason).await?;
        Ok(EvalOutcome::RolledBack(verdict))
    }

    async fn fetch_metrics_with_retry(&self, ctx: &StageContext) -> RolloutResult<GateMetrics> {
        let mut attempt = 0u32;
        loop {
            match self.metrics.fetch(ctx).await {
                Ok(metrics) => return Ok(metrics),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        return Err(RolloutError::MetricsUnavailable {
                            reason: format!("{} attempts failed: {err}", self.retry.max_attempts),
                        });
                    }
                    let delay = self.retry.delay_for(attempt - 1);
                    debug!(
                        event = "rollout.metrics_retry",
                        rollout_id = %ctx.rollout_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "metric fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Reconstruct (stage, status) by replaying a transition history.
///
/// Stage is the `to` of the last transition; status follows from the last
/// transition's kind. Empty history is a fresh rollout at 0%, running.
pub fn replay(history: &[StageTransition]) -> (u8, RolloutStatus) {
    let Some(last) = history.last() else {
        return (0, RolloutStatus::Running);
    };
    let status = match last.kind {
        TransitionKind::Pause => RolloutStatus::Paused,
        TransitionKind::Rollback => RolloutStatus::RolledBack,
        TransitionKind::Advance | TransitionKind::Override | TransitionKind::Resume => {
            RolloutStatus::Running
        }
    };
    (last.to, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(from: u8, to: u8, kind: TransitionKind) -> StageTransition {
        StageTransition::new(from, to, kind, "test")
    }

    #[test]
    fn test_replay_empty_history_is_fresh() {
        assert_eq!(replay(&[]), (0, RolloutStatus::Running));
    }

    #[test]
    fn test_replay_advances() {
        let history = vec![
            t(0, 5, TransitionKind::Advance),
            t(5, 25, TransitionKind::Advance),
        ];
        assert_eq!(replay(&history), (25, RolloutStatus::Running));
    }

    #[test]
    fn test_replay_pause_holds_stage() {
        let history = vec![
            t(0, 5, TransitionKind::Advance),
            t(5, 5, TransitionKind::Pause),
        ];
        assert_eq!(replay(&history), (5, RolloutStatus::Paused));
    }

    #[test]
    fn test_replay_resume_after_pause() {
        let history = vec![
            t(0, 5, TransitionKind::Advance),
            t(5, 5, TransitionKind::Pause),
            t(5, 5, TransitionKind::Resume),
        ];
        assert_eq!(replay(&history), (5, RolloutStatus::Running));
    }

    #[test]
    fn test_replay_rollback_collapses_to_zero() {
        let history = vec![
            t(0, 5, TransitionKind::Advance),
            t(5, 25, TransitionKind::Advance),
            t(25, 0, TransitionKind::Rollback),
        ];
        assert_eq!(replay(&history), (0, RolloutStatus::RolledBack));
    }

    #[test]
    fn test_replay_override_rearms_after_rollback() {
        let history = vec![
            t(0, 5, TransitionKind::Advance),
            t(5, 0, TransitionKind::Rollback),
            t(0, 50, TransitionKind::Override),
        ];
        assert_eq!(replay(&history), (50, RolloutStatus::Running));
    }
}
