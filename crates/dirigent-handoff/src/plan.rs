//! Phase plans and validation thresholds.
//!
//! A plan declares the ordered phase sequence with static completion
//! weights; the weights sum to exactly 100 so replayed progress lands on
//! 100 for a fully traversed directive.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{HandoffError, HandoffResult};

/// One phase in a plan, with its contribution to aggregate progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub name: String,
    /// Progress weight, 0-100; all weights in a plan sum to 100
    pub weight: u8,
}

/// An ordered, validated phase sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasePlan {
    phases: Vec<PhaseSpec>,
}

impl PhasePlan {
    /// Build a plan, validating structure up front.
    ///
    /// Requires at least two phases, unique names, and weights summing
    /// to exactly 100.
    pub fn new(phases: Vec<PhaseSpec>) -> HandoffResult<Self> {
        if phases.len() < 2 {
            return Err(HandoffError::InvalidPlan {
                reason: "a plan needs at least two phases".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for phase in &phases {
            if phase.name.trim().is_empty() {
                return Err(HandoffError::InvalidPlan {
                    reason: "phase names must not be empty".to_string(),
                });
            }
            if !seen.insert(phase.name.as_str()) {
                return Err(HandoffError::InvalidPlan {
                    reason: format!("duplicate phase name: {}", phase.name),
                });
            }
        }
        let total: u32 = phases.iter().map(|p| p.weight as u32).sum();
        if total != 100 {
            return Err(HandoffError::InvalidPlan {
                reason: format!("phase weights must sum to 100, got {total}"),
            });
        }
        Ok(Self { phases })
    }

    /// Phase names in declared order.
    pub fn phase_names(&self) -> Vec<String> {
        self.phases.iter().map(|p| p.name.clone()).collect()
    }

    /// Weight of the named phase; 0 for phases outside the plan.
    pub fn weight_of(&self, name: &str) -> u8 {
        self.phases
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.weight)
            .unwrap_or(0)
    }

    /// The plan's terminal phase name.
    pub fn terminal_phase(&self) -> &str {
        // Non-empty by construction
        &self.phases[self.phases.len() - 1].name
    }
}

/// Minimum validation scores per phase pair.
///
/// The default is a hard gate (100); advisory gates register a lower
/// threshold for specific pairs.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    default_min: f64,
    per_pair: HashMap<(String, String), f64>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            default_min: 100.0,
            per_pair: HashMap::new(),
        }
    }
}

impl ValidationPolicy {
    pub fn new(default_min: f64) -> Self {
        Self {
            default_min,
            per_pair: HashMap::new(),
        }
    }

    /// Register an advisory (or stricter) threshold for one phase pair.
    pub fn set_threshold(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        min_score: f64,
    ) {
        self.per_pair.insert((from.into(), to.into()), min_score);
    }

    /// Minimum score required to validate a `from -> to` handoff.
    pub fn threshold(&self, from: &str, to: &str) -> f64 {
        self.per_pair
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .unwrap_or(self.default_min)
    }
}
