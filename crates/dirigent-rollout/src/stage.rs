//! Ordered canary stage sets.
//!
//! The stage set is configuration, not a hard-coded ladder; the default
//! matches the conventional 0/5/25/50/100 percentage ramp.

use serde::{Deserialize, Serialize};

use crate::error::{RolloutError, RolloutResult};

/// A validated, strictly ascending set of rollout stages (percentages).
///
/// Invariants: starts at 0, ends at 100, strictly ascending. A stage only
/// ever advances to the next value in the set or collapses to 0 on
/// rollback; it never skips forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSet(Vec<u8>);

impl Default for StageSet {
    fn default() -> Self {
        StageSet(vec![0, 5, 25, 50, 100])
    }
}

impl StageSet {
    /// Build a stage set, validating the invariants up front.
    pub fn new(stages: Vec<u8>) -> RolloutResult<Self> {
        if stages.first() != Some(&0) {
            return Err(RolloutError::InvalidStageSet {
                reason: "stage set must start at 0".to_string(),
            });
        }
        if stages.last() != Some(&100) {
            return Err(RolloutError::InvalidStageSet {
                reason: "stage set must end at 100".to_string(),
            });
        }
        if !stages.windows(2).all(|w| w[0] < w[1]) {
            return Err(RolloutError::InvalidStageSet {
                reason: "stages must be strictly ascending".to_string(),
            });
        }
        Ok(StageSet(stages))
    }

    /// Whether `stage` is a member of the set.
    pub fn contains(&self, stage: u8) -> bool {
        self.0.contains(&stage)
    }

    /// The next stage after `stage`, or `None` at the maximum.
    pub fn next_after(&self, stage: u8) -> Option<u8> {
        let idx = self.0.iter().position(|&s| s == stage)?;
        self.0.get(idx + 1).copied()
    }

    /// The maximum stage (always 100 for a valid set).
    pub fn max(&self) -> u8 {
        *self.0.last().unwrap_or(&100)
    }

    /// All stages, ascending.
    pub fn stages(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_is_canonical_ramp() {
        let set = StageSet::default();
        assert_eq!(set.stages(), &[0, 5, 25, 50, 100]);
    }

    #[test]
    fn test_next_after_walks_the_ramp() {
        let set = StageSet::default();
        assert_eq!(set.next_after(0), Some(5));
        assert_eq!(set.next_after(50), Some(100));
        assert_eq!(set.next_after(100), None);
        assert_eq!(set.next_after(7), None);
    }

    #[test]
    fn test_set_must_start_at_zero() {
        assert!(matches!(
            StageSet::new(vec![5, 25, 100]),
            Err(RolloutError::InvalidStageSet { .. })
        ));
    }

    #[test]
    fn test_set_must_end_at_hundred() {
        assert!(matches!(
            StageSet::new(vec![0, 5, 25]),
            Err(RolloutError::InvalidStageSet { .. })
        ));
    }

    #[test]
    fn test_set_must_ascend() {
        assert!(matches!(
            StageSet::new(vec![0, 25, 5, 100]),
            Err(RolloutError::InvalidStageSet { .. })
        ));
    }

    #[test]
    fn test_custom_set_is_valid() {
        let set = StageSet::new(vec![0, 10, 100]).unwrap();
        assert!(set.contains(10));
        assert!(!set.contains(5));
    }
}
