//! Quality gate evaluation for rollout pass/fail criteria.

use serde::{Deserialize, Serialize};

/// Metric snapshot fetched from the metrics collaborator for one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateMetrics {
    /// Requests observed in the evaluation window
    pub sample_count: u64,
    /// Failed fraction of those requests, 0.0-1.0
    pub error_rate: f64,
    /// p95 latency over the window
    pub latency_p95_ms: u64,
    /// Pre-rollout baseline p95, when one has been established
    pub baseline_latency_p95_ms: Option<u64>,
}

/// Gate evaluation verdict plus the snapshot it was computed from.
///
/// Consumed by the controller; not retained beyond the most recent
/// decision — durable metric history is the collaborator's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityGateResult {
    /// Whether the gate passed.
    pub passed: bool,

    /// Violations that caused failure (empty if passed).
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,

    /// The metrics the verdict was computed from.
    pub metrics: GateMetrics,
}

/// Thresholds for gate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Maximum tolerated error rate before rollback
    pub error_rate_threshold: f64,
    /// Maximum tolerated p95 latency as a multiple of baseline
    pub latency_multiplier_threshold: f64,
    /// Below this sample count the gate passes as inconclusive
    pub min_samples: u64,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            error_rate_threshold: 0.05,
            latency_multiplier_threshold: 2.0,
            min_samples: 10,
        }
    }
}

impl GatePolicy {
    /// Evaluate a metric snapshot against the thresholds.
    ///
    /// Gate rules:
    /// - Too few samples: pass, noted as inconclusive (a thin window must
    ///   not trigger rollback).
    /// - Error rate above threshold: fail.
    /// - p95 latency above `baseline × multiplier`: fail (skipped when no
    ///   baseline is established).
    pub fn evaluate(&self, metrics: GateMetrics) -> QualityGateResult {
        if metrics.sample_count < self.min_samples {
            return QualityGateResult {
                passed: true,
                violations: Vec::new(),
                message: format!(
                    "insufficient data: {} of {} required samples",
                    metrics.sample_count, self.min_samples
                ),
                metrics,
            };
        }

        let mut violations = Vec::new();

        if metrics.error_rate > self.error_rate_threshold {
            violations.push(format!(
                "error rate {:.1}% exceeds threshold {:.1}%",
                metrics.error_rate * 100.0,
                self.error_rate_threshold * 100.0
            ));
        }

        if let Some(baseline) = metrics.baseline_latency_p95_ms {
            if baseline > 0 {
                let multiplier = metrics.latency_p95_ms as f64 / baseline as f64;
                if multiplier > self.latency_multiplier_threshold {
                    violations.push(format!(
                        "p95 latency {:.1}x baseline exceeds threshold {:.1}x",
                        multiplier, self.latency_multiplier_threshold
                    ));
                }
            }
        }

        let passed = violations.is_empty();
        let message = if passed {
            "all gates passed".to_string()
        } else {
            format!("gate failed with {} violation(s)", violations.len())
        };

        QualityGateResult {
            passed,
            violations,
            message,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(samples: u64, error_rate: f64, p95: u64, baseline: Option<u64>) -> GateMetrics {
        GateMetrics {
            sample_count: samples,
            error_rate,
            latency_p95_ms: p95,
            baseline_latency_p95_ms: baseline,
        }
    }

    #[test]
    fn test_healthy_metrics_pass() {
        let verdict = GatePolicy::default().evaluate(metrics(100, 0.01, 400, Some(350)));
        assert!(verdict.passed);
        assert!(verdict.violations.is_empty());
    }

    #[test]
    fn test_insufficient_samples_pass_as_inconclusive() {
        let verdict = GatePolicy::default().evaluate(metrics(3, 1.0, 99_000, Some(100)));
        assert!(verdict.passed);
        assert!(verdict.message.contains("insufficient data"));
    }

    #[test]
    fn test_error_rate_violation_fails() {
        let verdict = GatePolicy::default().evaluate(metrics(100, 0.12, 400, Some(350)));
        assert!(!verdict.passed);
        assert_eq!(verdict.violations.len(), 1);
        assert!(verdict.violations[0].contains("error rate"));
    }

    #[test]
    fn test_latency_multiplier_violation_fails() {
        let verdict = GatePolicy::default().evaluate(metrics(100, 0.0, 900, Some(300)));
        assert!(!verdict.passed);
        assert!(verdict.violations[0].contains("p95 latency"));
    }

    #[test]
    fn test_latency_gate_skipped_without_baseline() {
        let verdict = GatePolicy::default().evaluate(metrics(100, 0.0, 900, None));
        assert!(verdict.passed);
    }

    #[test]
    fn test_both_violations_reported() {
        let verdict = GatePolicy::default().evaluate(metrics(100, 0.5, 900, Some(300)));
        assert!(!verdict.passed);
        assert_eq!(verdict.violations.len(), 2);
    }
}
