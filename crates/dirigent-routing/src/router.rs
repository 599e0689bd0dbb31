//! Intent routing: score, blend, classify, rank.
//!
//! The keyword pass runs synchronously over the profile snapshot. The
//! semantic pass, when a scorer is configured, runs concurrently for all
//! profiles inside one hard deadline; if the deadline passes the pass is
//! dropped (cancelling the in-flight futures) and routing proceeds on
//! keyword scores alone.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::profile::{AgentProfile, ProfileSet};
use crate::scorer::keyword_score;
use crate::semantic::SemanticScorer;

/// Which scoring path produced a decision's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMethod {
    Keyword,
    Semantic,
    Combined,
}

/// How a candidate should be acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Confidence is high enough to activate the agent directly
    AutoTrigger,
    /// Present the candidate for a human/caller choice
    Suggest,
}

/// One ranked routing recommendation.
///
/// Produced fresh per routing call; never persisted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub agent_id: String,
    /// Blended confidence, 0-100
    pub score: f64,
    pub method: ScoreMethod,
    pub decision: Decision,
    /// Keywords that contributed to the keyword score
    pub matched: Vec<String>,
}

/// Router thresholds and semantic blend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Score at or above which a candidate auto-triggers
    pub auto_trigger_threshold: f64,
    /// Score at or above which a candidate is at least suggested
    pub suggest_threshold: f64,
    /// Semantic share of the blended score, 0.0-1.0
    pub semantic_weight: f64,
    /// Hard deadline for the whole semantic pass
    pub semantic_budget: Duration,
    /// Cap on returned decisions (`None` = unlimited)
    pub max_results: Option<usize>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            auto_trigger_threshold: 70.0,
            suggest_threshold: 50.0,
            semantic_weight: 0.4,
            semantic_budget: Duration::from_millis(300),
            max_results: None,
        }
    }
}

/// Routes task descriptions to ranked agent recommendations.
pub struct IntentRouter {
    profiles: Arc<ProfileSet>,
    semantic: Option<Arc<dyn SemanticScorer>>,
    config: RouterConfig,
}

impl IntentRouter {
    pub fn new(profiles: Arc<ProfileSet>, config: RouterConfig) -> Self {
        Self {
            profiles,
            semantic: None,
            config,
        }
    }

    /// Attach a semantic scorer raced against the configured budget.
    pub fn with_semantic(mut self, scorer: Arc<dyn SemanticScorer>) -> Self {
        self.semantic = Some(scorer);
        self
    }

    /// Route a task description to ranked, classified agent candidates.
    ///
    /// An empty (or all-whitespace) description yields an empty list.
    /// Semantic failures and timeouts degrade to keyword-only scoring and
    /// are never surfaced as routing failures.
    pub async fn route(&self, description: &str) -> Vec<RoutingDecision> {
        if description.trim().is_empty() {
            return Vec::new();
        }

        let snapshot = self.profiles.snapshot();
        let semantic_scores = self.semantic_pass(description, &snapshot).await;

        let mut candidates: Vec<RoutingDecision> = Vec::new();
        for (idx, profile) in snapshot.iter().enumerate() {
            let kw = keyword_score(description, profile);
            let semantic = semantic_scores.as_ref().and_then(|scores| scores[idx]);

            let (score, method) = match semantic {
                Some(sem) => {
                    let w = self.config.semantic_weight.clamp(0.0, 1.0);
                    let blended = (kw.score * (1.0 - w) + sem * w).clamp(0.0, 100.0);
                    let method = if w >= 1.0 {
                        ScoreMethod::Semantic
                    } else {
                        ScoreMethod::Combined
                    };
                    (blended, method)
                }
                None => (kw.score, ScoreMethod::Keyword),
            };

            if score < self.config.suggest_threshold {
                continue;
            }

            candidates.push(RoutingDecision {
                agent_id: profile.agent_id.clone(),
                score,
                method,
                // Placeholder; classification needs the full medium band
                decision: Decision::Suggest,
                matched: kw.matched.into_iter().map(|m| m.term).collect(),
            });
        }

        // Medium-band policy: a sole qualifying candidate in the band is
        // promoted to auto-trigger; two or more all stay suggestions.
        let medium_count = candidates
            .iter()
            .filter(|c| c.score < self.config.auto_trigger_threshold)
            .count();
        for candidate in &mut candidates {
            candidate.decision = if candidate.score >= self.config.auto_trigger_threshold {
                Decision::AutoTrigger
            } else if medium_count == 1 {
                Decision::AutoTrigger
            } else {
                Decision::Suggest
            };
        }

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.agent_id.cmp(&b.agent_id))
        });
        if let Some(cap) = self.config.max_results {
            candidates.truncate(cap);
        }

        debug!(
            event = "route.completed",
            candidates = candidates.len(),
            semantic = semantic_scores.is_some(),
        );
        candidates
    }

    /// Run the semantic scorer for every profile inside one deadline.
    ///
    /// Returns `None` when no scorer is configured, the blend weight is
    /// zero, or the deadline passed; per-profile entries are `None` when
    /// that profile has no semantic descriptor or its call failed.
    async fn semantic_pass(
        &self,
        description: &str,
        profiles: &[AgentProfile],
    ) -> Option<Vec<Option<f64>>> {
        let scorer = self.semantic.as_ref()?;
        if self.config.semantic_weight <= 0.0 {
            return None;
        }

        let calls = profiles.iter().map(|profile| {
            let scorer = scorer.clone();
            async move {
                if profile.semantic_ref.is_none() {
                    return None;
                }
                match scorer.score(description, &profile.agent_id).await {
                    Ok(score) => Some(score),
                    Err(err) => {
                        debug!(
                            event = "route.semantic_error",
                            agent_id = %profile.agent_id,
                            error = %err,
                        );
                        None
                    }
                }
            }
        });

        match tokio::time::timeout(self.config.semantic_budget, join_all(calls)).await {
            Ok(scores) => Some(scores),
            Err(_) => {
                warn!(
                    event = "route.semantic_timeout",
                    budget_ms = self.config.semantic_budget.as_millis() as u64,
                );
                None
            }
        }
    }
}
