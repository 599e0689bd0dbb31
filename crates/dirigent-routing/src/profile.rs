//! Agent profile configuration and snapshot management.
//!
//! Profiles are immutable per version: a reload replaces the whole in-memory
//! set atomically, never mutating a profile in place. Routing calls take a
//! cheap `Arc` snapshot and are unaffected by concurrent reloads.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RoutingError, RoutingResult};

/// One keyword and the weight it contributes to an agent's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedKeyword {
    pub term: String,
    pub weight: u32,
}

/// A specialized handler the router can recommend for a task description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Stable agent identifier (also the deterministic tie-breaker)
    pub agent_id: String,
    /// Weighted keywords, in declaration order
    pub keywords: Vec<WeightedKeyword>,
    /// Opaque reference to a semantic descriptor (embedding vector)
    pub semantic_ref: Option<String>,
}

impl AgentProfile {
    /// Sum of all keyword weights in this profile.
    pub fn total_weight(&self) -> u64 {
        self.keywords.iter().map(|k| k.weight as u64).sum()
    }
}

/// Source of agent profile configuration.
///
/// Implementations load the full profile population; the router treats the
/// result as a snapshot and never writes back.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Load all agent profiles.
    async fn list_agent_profiles(&self) -> RoutingResult<Vec<AgentProfile>>;
}

/// Immutable profile snapshot with atomic whole-set replacement.
///
/// Readers call [`ProfileSet::snapshot`] and work against a frozen `Arc`;
/// [`ProfileSet::reload`] swaps the set in one assignment so no reader can
/// observe a half-updated population.
#[derive(Debug, Default)]
pub struct ProfileSet {
    profiles: RwLock<Arc<[AgentProfile]>>,
}

impl ProfileSet {
    pub fn new(profiles: Vec<AgentProfile>) -> Self {
        Self {
            profiles: RwLock::new(profiles.into()),
        }
    }

    /// Current snapshot of the profile population.
    pub fn snapshot(&self) -> Arc<[AgentProfile]> {
        self.profiles.read().unwrap().clone()
    }

    /// Replace the whole set from `source`.
    pub async fn reload(&self, source: &dyn ProfileSource) -> RoutingResult<()> {
        let fresh: Arc<[AgentProfile]> = source.list_agent_profiles().await?.into();
        let count = fresh.len();
        *self.profiles.write().unwrap() = fresh;
        tracing::info!(event = "profiles.reloaded", count = count);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TOML-backed profile source
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    agents: Vec<ProfileEntry>,
}

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    id: String,
    #[serde(default)]
    semantic_ref: Option<String>,
    #[serde(default)]
    keywords: Vec<WeightedKeyword>,
}

/// Profile source reading a TOML file of the form:
///
/// ```toml
/// [[agents]]
/// id = "rca"
/// semantic_ref = "emb:rca-v2"
/// keywords = [
///     { term = "root cause", weight = 40 },
///     { term = "bug", weight = 30 },
/// ]
/// ```
#[derive(Debug, Clone)]
pub struct TomlProfileSource {
    path: PathBuf,
}

impl TomlProfileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProfileSource for TomlProfileSource {
    async fn list_agent_profiles(&self) -> RoutingResult<Vec<AgentProfile>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| RoutingError::ProfileSource(e.to_string()))?;
        let file: ProfileFile = toml::from_str(&raw).map_err(|e| RoutingError::InvalidProfile {
            reason: e.to_string(),
        })?;

        let mut profiles = Vec::with_capacity(file.agents.len());
        for entry in file.agents {
            if entry.id.trim().is_empty() {
                return Err(RoutingError::InvalidProfile {
                    reason: "agent id must not be empty".to_string(),
                });
            }
            profiles.push(AgentProfile {
                agent_id: entry.id,
                keywords: entry.keywords,
                semantic_ref: entry.semantic_ref,
            });
        }
        Ok(profiles)
    }
}
