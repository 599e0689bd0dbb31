//! Weighted checklist scoring for handoff validation.

use serde::{Deserialize, Serialize};

/// One gate criterion with its weight and observed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub name: String,
    pub weight: u32,
    pub satisfied: bool,
}

impl ChecklistItem {
    pub fn new(name: impl Into<String>, weight: u32, satisfied: bool) -> Self {
        Self {
            name: name.into(),
            weight,
            satisfied,
        }
    }
}

/// Caller-supplied validation checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub items: Vec<ChecklistItem>,
}

impl Checklist {
    pub fn new(items: Vec<ChecklistItem>) -> Self {
        Self { items }
    }

    /// Percentage of total weight satisfied, 0-100.
    ///
    /// An empty checklist (or one with zero total weight) gates nothing
    /// and scores 100.
    pub fn score(&self) -> f64 {
        let total: u64 = self.items.iter().map(|i| i.weight as u64).sum();
        if total == 0 {
            return 100.0;
        }
        let satisfied: u64 = self
            .items
            .iter()
            .filter(|i| i.satisfied)
            .map(|i| i.weight as u64)
            .sum();
        100.0 * satisfied as f64 / total as f64
    }

    /// Names of unsatisfied items, for rejection reasons and logs.
    pub fn failures(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| !i.satisfied)
            .map(|i| i.name.as_str())
            .collect()
    }
}
