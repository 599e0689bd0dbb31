//! Cross-component flow: handoff acceptance triggers a gate evaluation.
//!
//! The handoff machine's observer hook is the only coupling point between
//! the two components; this wires it to a controller and verifies that a
//! regressing rollout collapses as soon as an acceptance fires the gates.

use std::sync::Arc;

use async_trait::async_trait;

use dirigent_handoff::{
    Checklist, ChecklistItem, HandoffMachine, HandoffObserver, PhasePlan, PhaseSpec,
    ValidationPolicy,
};
use dirigent_rollout::{
    CanaryController, GateMetrics, GatePolicy, MetricsSource, RetryConfig, RolloutResult,
    RolloutSpec, RolloutStatus, StageContext, StageSet,
};
use dirigent_store::fakes::{MemoryDirectiveRepository, MemoryRolloutLedger};
use dirigent_store::{Directive, Handoff};

struct RegressingMetrics;

#[async_trait]
impl MetricsSource for RegressingMetrics {
    async fn fetch(&self, _ctx: &StageContext) -> RolloutResult<GateMetrics> {
        Ok(GateMetrics {
            sample_count: 500,
            error_rate: 0.25,
            latency_p95_ms: 400,
            baseline_latency_p95_ms: Some(380),
        })
    }
}

/// Re-evaluates the rollout's gates whenever a handoff is accepted.
struct GateHook {
    controller: Arc<CanaryController<MemoryRolloutLedger, RegressingMetrics>>,
}

#[async_trait]
impl HandoffObserver for GateHook {
    async fn handoff_accepted(&self, _directive: &Directive, _handoff: &Handoff) {
        let _ = self.controller.evaluate_quality_gates().await;
    }
}

fn plan() -> PhasePlan {
    PhasePlan::new(vec![
        PhaseSpec {
            name: "PLAN".to_string(),
            weight: 50,
        },
        PhaseSpec {
            name: "EXEC".to_string(),
            weight: 50,
        },
    ])
    .unwrap()
}

#[tokio::test]
async fn test_accepted_handoff_fires_gate_evaluation() {
    let controller = Arc::new(CanaryController::new(
        RolloutSpec::new(b"routing-config-v2"),
        Arc::new(MemoryRolloutLedger::new()),
        Arc::new(RegressingMetrics),
        StageSet::default(),
        GatePolicy::default(),
        RetryConfig::default(),
    ));
    controller.advance("initial canary").await.unwrap();
    assert_eq!(controller.current_stage().await, 5);

    let machine = HandoffMachine::new(
        Arc::new(MemoryDirectiveRepository::new()),
        plan(),
        ValidationPolicy::default(),
    )
    .with_observer(Arc::new(GateHook {
        controller: controller.clone(),
    }));

    let directive = machine.create_directive().await.unwrap();
    let handoff = machine
        .propose_handoff(&directive.id, "PLAN", "EXEC")
        .await
        .unwrap();
    let checklist = Checklist::new(vec![ChecklistItem::new("deliverables complete", 100, true)]);
    machine.validate_handoff(&handoff, &checklist).await.unwrap();
    machine.accept_handoff(&handoff).await.unwrap();

    // The observer ran the gates against regressing metrics.
    assert_eq!(controller.current_stage().await, 0);
    assert_eq!(controller.status().await, RolloutStatus::RolledBack);
}
