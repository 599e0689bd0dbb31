//! Integration tests for the handoff state machine with MemoryDirectiveRepository.

use std::sync::Arc;

use dirigent_handoff::{
    Checklist, ChecklistItem, HandoffError, HandoffMachine, PhasePlan, PhaseSpec,
    ValidationPolicy,
};
use dirigent_store::fakes::MemoryDirectiveRepository;
use dirigent_store::DirectiveStatus;

fn plan() -> PhasePlan {
    PhasePlan::new(vec![
        PhaseSpec {
            name: "LEAD".to_string(),
            weight: 20,
        },
        PhaseSpec {
            name: "PLAN".to_string(),
            weight: 30,
        },
        PhaseSpec {
            name: "EXEC".to_string(),
            weight: 50,
        },
    ])
    .unwrap()
}

fn machine() -> HandoffMachine<MemoryDirectiveRepository> {
    HandoffMachine::new(
        Arc::new(MemoryDirectiveRepository::new()),
        plan(),
        ValidationPolicy::default(),
    )
}

fn passing_checklist() -> Checklist {
    Checklist::new(vec![ChecklistItem::new("deliverables complete", 100, true)])
}

/// Test: the full propose -> validate -> accept flow across every phase
#[tokio::test]
async fn test_full_lifecycle_reaches_100_progress() {
    let machine = machine();
    let directive = machine.create_directive().await.unwrap();
    assert_eq!(directive.current_phase, "LEAD");

    let h1 = machine
        .propose_handoff(&directive.id, "LEAD", "PLAN")
        .await
        .unwrap();
    machine
        .validate_handoff(&h1, &passing_checklist())
        .await
        .unwrap();
    let after_first = machine.accept_handoff(&h1).await.unwrap();
    assert_eq!(after_first.current_phase, "PLAN");
    assert_eq!(after_first.progress, 20);

    let h2 = machine
        .propose_handoff(&directive.id, "PLAN", "EXEC")
        .await
        .unwrap();
    machine
        .validate_handoff(&h2, &passing_checklist())
        .await
        .unwrap();
    let after_second = machine.accept_handoff(&h2).await.unwrap();

    assert_eq!(after_second.current_phase, "EXEC");
    assert_eq!(after_second.progress, 100);
    assert_eq!(after_second.status, DirectiveStatus::Completed);

    // Replaying history yields the same answer as the cached value.
    assert_eq!(machine.progress(&directive.id).await.unwrap(), 100);
}

/// Test: backward transitions are rejected
#[tokio::test]
async fn test_backward_transition_is_invalid() {
    let machine = machine();
    let directive = machine.create_directive().await.unwrap();

    // Advance LEAD -> PLAN first.
    let h1 = machine
        .propose_handoff(&directive.id, "LEAD", "PLAN")
        .await
        .unwrap();
    machine
        .validate_handoff(&h1, &passing_checklist())
        .await
        .unwrap();
    machine.accept_handoff(&h1).await.unwrap();

    // PLAN -> LEAD goes backward.
    let result = machine
        .propose_handoff(&directive.id, "PLAN", "LEAD")
        .await;
    assert!(matches!(
        result,
        Err(HandoffError::InvalidTransition { .. })
    ));
}

/// Test: phases cannot be skipped
#[tokio::test]
async fn test_skipping_a_phase_is_invalid() {
    let machine = machine();
    let directive = machine.create_directive().await.unwrap();

    let result = machine
        .propose_handoff(&directive.id, "LEAD", "EXEC")
        .await;
    assert!(matches!(
        result,
        Err(HandoffError::InvalidTransition { .. })
    ));
}

/// Test: a second proposal without resolving the first conflicts
#[tokio::test]
async fn test_double_proposal_conflicts() {
    let machine = machine();
    let directive = machine.create_directive().await.unwrap();

    machine
        .propose_handoff(&directive.id, "LEAD", "PLAN")
        .await
        .unwrap();
    let second = machine
        .propose_handoff(&directive.id, "LEAD", "PLAN")
        .await;
    assert!(matches!(
        second,
        Err(HandoffError::ConflictingHandoff { .. })
    ));
}

/// Test: failing checklist blocks validation without mutating the handoff
#[tokio::test]
async fn test_validation_below_threshold_blocks_acceptance() {
    let machine = machine();
    let directive = machine.create_directive().await.unwrap();

    let handoff_id = machine
        .propose_handoff(&directive.id, "LEAD", "PLAN")
        .await
        .unwrap();

    let failing = Checklist::new(vec![
        ChecklistItem::new("tests pass", 60, true),
        ChecklistItem::new("docs updated", 40, false),
    ]);
    let result = machine.validate_handoff(&handoff_id, &failing).await;
    match result {
        Err(HandoffError::ValidationBelowThreshold { score, required }) => {
            assert!((score - 60.0).abs() < f64::EPSILON);
            assert!((required - 100.0).abs() < f64::EPSILON);
        }
        other => panic!("expected ValidationBelowThreshold, got {other:?}"),
    }

    // Acceptance without a recorded validation is refused.
    let accept = machine.accept_handoff(&handoff_id).await;
    assert!(matches!(
        accept,
        Err(HandoffError::ValidationRequired { .. })
    ));
}

/// Test: an advisory threshold admits a partial checklist
#[tokio::test]
async fn test_advisory_threshold_admits_partial_checklist() {
    let mut policy = ValidationPolicy::default();
    policy.set_threshold("LEAD", "PLAN", 50.0);
    let machine = HandoffMachine::new(
        Arc::new(MemoryDirectiveRepository::new()),
        plan(),
        policy,
    );
    let directive = machine.create_directive().await.unwrap();

    let handoff_id = machine
        .propose_handoff(&directive.id, "LEAD", "PLAN")
        .await
        .unwrap();
    let partial = Checklist::new(vec![
        ChecklistItem::new("tests pass", 60, true),
        ChecklistItem::new("docs updated", 40, false),
    ]);
    let score = machine.validate_handoff(&handoff_id, &partial).await.unwrap();
    assert!((score - 60.0).abs() < f64::EPSILON);

    machine.accept_handoff(&handoff_id).await.unwrap();
}

/// Test: accepting twice fails with AlreadyResolved
#[tokio::test]
async fn test_double_accept_is_already_resolved() {
    let machine = machine();
    let directive = machine.create_directive().await.unwrap();

    let handoff_id = machine
        .propose_handoff(&directive.id, "LEAD", "PLAN")
        .await
        .unwrap();
    machine
        .validate_handoff(&handoff_id, &passing_checklist())
        .await
        .unwrap();
    machine.accept_handoff(&handoff_id).await.unwrap();

    let again = machine.accept_handoff(&handoff_id).await;
    assert!(matches!(again, Err(HandoffError::AlreadyResolved { .. })));
}

/// Test: rejection leaves the phase alone; terminal rejection kills the directive
#[tokio::test]
async fn test_terminal_rejection_terminates_directive() {
    let machine = machine();
    let directive = machine.create_directive().await.unwrap();

    let handoff_id = machine
        .propose_handoff(&directive.id, "LEAD", "PLAN")
        .await
        .unwrap();
    machine
        .reject_handoff(&handoff_id, "scope change", true)
        .await
        .unwrap();

    let progress = machine.progress(&directive.id).await.unwrap();
    assert_eq!(progress, 0);

    // A rejected directive accepts no further proposals.
    let next = machine
        .propose_handoff(&directive.id, "LEAD", "PLAN")
        .await;
    assert!(matches!(
        next,
        Err(HandoffError::DirectiveInactive { .. })
    ));
}

/// Test: non-terminal rejection allows a fresh proposal
#[tokio::test]
async fn test_non_terminal_rejection_allows_retry() {
    let machine = machine();
    let directive = machine.create_directive().await.unwrap();

    let first = machine
        .propose_handoff(&directive.id, "LEAD", "PLAN")
        .await
        .unwrap();
    machine
        .reject_handoff(&first, "checklist incomplete", false)
        .await
        .unwrap();

    // The pending slot is free again.
    machine
        .propose_handoff(&directive.id, "LEAD", "PLAN")
        .await
        .unwrap();
}

/// Test: two directives advance concurrently without interference
#[tokio::test]
async fn test_independent_directives_advance_concurrently() {
    let machine = Arc::new(machine());
    let a = machine.create_directive().await.unwrap();
    let b = machine.create_directive().await.unwrap();

    let mut handles = Vec::new();
    for directive in [a.clone(), b.clone()] {
        let machine = machine.clone();
        handles.push(tokio::spawn(async move {
            let h = machine
                .propose_handoff(&directive.id, "LEAD", "PLAN")
                .await
                .unwrap();
            machine
                .validate_handoff(&h, &passing_checklist())
                .await
                .unwrap();
            machine.accept_handoff(&h).await.unwrap()
        }));
    }
    for handle in handles {
        let advanced = handle.await.unwrap();
        assert_eq!(advanced.current_phase, "PLAN");
        assert_eq!(advanced.progress, 20);
    }
}
