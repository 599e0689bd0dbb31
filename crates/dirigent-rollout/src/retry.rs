//! Bounded retry with exponential backoff for metric fetches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry schedule for transient external failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-indexed: the delay after the
    /// first failure is `delay_for(0)`), capped at `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis((base as u64).min(self.max_delay_ms))
    }
}
