//! In-memory fakes for repository traits (testing and embedding)
//!
//! Provides `MemoryDirectiveRepository` and `MemoryRolloutLedger` that
//! satisfy the trait contracts without any external dependencies.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::records::*;
use crate::repository::{DirectiveRepository, RolloutLedger};
use crate::StoreResult;

// ---------------------------------------------------------------------------
// MemoryDirectiveRepository
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct DirectiveTables {
    directives: HashMap<String, Directive>,
    handoffs: HashMap<String, Handoff>,
}

/// In-memory directive/handoff store backed by `HashMap`s under one `Mutex`.
///
/// The single lock gives the strong read-after-write consistency the trait
/// contract requires for a single directive.
#[derive(Debug, Default)]
pub struct MemoryDirectiveRepository {
    tables: Mutex<DirectiveTables>,
}

impl MemoryDirectiveRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectiveRepository for MemoryDirectiveRepository {
    async fn load_directive(&self, id: &DirectiveId) -> StoreResult<Directive> {
        let tables = self.tables.lock().unwrap();
        tables
            .directives
            .get(&id.0)
            .cloned()
            .ok_or_else(|| StoreError::DirectiveNotFound {
                directive_id: id.0.clone(),
            })
    }

    async fn save_directive(&self, directive: &Directive) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .directives
            .insert(directive.id.0.clone(), directive.clone());
        Ok(())
    }

    async fn save_handoff(&self, handoff: &Handoff) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        // Pending-uniqueness: a second pending handoff for the same directive
        // is a contract violation, not an upsert.
        if handoff.status == HandoffStatus::Pending {
            let conflicting = tables.handoffs.values().any(|h| {
                h.directive_id == handoff.directive_id
                    && h.status == HandoffStatus::Pending
                    && h.id != handoff.id
            });
            if conflicting {
                return Err(StoreError::Backend(format!(
                    "directive {} already has a pending handoff",
                    handoff.directive_id
                )));
            }
        }
        tables.handoffs.insert(handoff.id.0.clone(), handoff.clone());
        Ok(())
    }

    async fn load_handoff(&self, id: &HandoffId) -> StoreResult<Handoff> {
        let tables = self.tables.lock().unwrap();
        tables
            .handoffs
            .get(&id.0)
            .cloned()
            .ok_or_else(|| StoreError::HandoffNotFound {
                handoff_id: id.0.clone(),
            })
    }

    async fn load_pending_handoff(
        &self,
        directive_id: &DirectiveId,
    ) -> StoreResult<Option<Handoff>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .handoffs
            .values()
            .find(|h| &h.directive_id == directive_id && h.status == HandoffStatus::Pending)
            .cloned())
    }

    async fn list_handoffs(&self, directive_id: &DirectiveId) -> StoreResult<Vec<Handoff>> {
        let tables = self.tables.lock().unwrap();
        let mut handoffs: Vec<Handoff> = tables
            .handoffs
            .values()
            .filter(|h| &h.directive_id == directive_id)
            .cloned()
            .collect();
        handoffs.sort_by_key(|h| h.created_at);
        Ok(handoffs)
    }
}

// ---------------------------------------------------------------------------
// MemoryRolloutLedger
// ---------------------------------------------------------------------------

/// In-memory rollout ledger backed by a `HashMap<RolloutId, Vec<StageTransition>>`.
///
/// Append-only: entries are never mutated or removed.
#[derive(Debug, Default)]
pub struct MemoryRolloutLedger {
    transitions: Mutex<HashMap<String, Vec<StageTransition>>>,
}

impl MemoryRolloutLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RolloutLedger for MemoryRolloutLedger {
    async fn append_transition(
        &self,
        rollout_id: &RolloutId,
        transition: StageTransition,
    ) -> StoreResult<()> {
        let mut transitions = self.transitions.lock().unwrap();
        transitions
            .entry(rollout_id.0.clone())
            .or_default()
            .push(transition);
        Ok(())
    }

    async fn history(&self, rollout_id: &RolloutId) -> StoreResult<Vec<StageTransition>> {
        let transitions = self.transitions.lock().unwrap();
        Ok(transitions.get(&rollout_id.0).cloned().unwrap_or_default())
    }
}
