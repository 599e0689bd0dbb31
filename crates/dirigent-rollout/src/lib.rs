//! Dirigent-Rollout: Canary Rollout Control
//!
//! Manages the staged percentage rollout of a new routing/handler
//! configuration:
//! - ordered stage set (0 -> 5 -> 25 -> 50 -> 100) with administrative
//!   override, pause, and resume
//! - scheduled quality-gate evaluation with retry-with-backoff metric
//!   fetches and automatic rollback on failure
//! - append-only transition history as the sole source of truth; the
//!   controller is reconstructible by replaying its ledger
//!
//! The auto-rollback on a failing gate is the core safety property: no
//! manual intervention is required to collapse a regressing rollout to 0%.

pub mod controller;
pub mod error;
pub mod gate;
pub mod monitor;
pub mod retry;
pub mod spec;
pub mod stage;

pub use controller::{CanaryController, EvalOutcome, MetricsSource, RolloutStatus, StageContext};
pub use error::{RolloutError, RolloutResult};
pub use gate::{GateMetrics, GatePolicy, QualityGateResult};
pub use monitor::{MonitorConfig, RolloutMonitor};
pub use retry::RetryConfig;
pub use spec::RolloutSpec;
pub use stage::StageSet;
