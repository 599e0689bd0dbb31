//! Rollout specification and identity.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use dirigent_store::RolloutId;

/// Identity of one canary rollout.
///
/// The target configuration (the new routing/handler population being
/// ramped) is pinned by digest so stage history is unambiguous about what
/// was actually rolled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloutSpec {
    pub rollout_id: RolloutId,

    /// SHA-256 digest of the serialized target configuration.
    pub target_config_digest: String,
}

impl RolloutSpec {
    /// Create a spec for a fresh rollout of `target_config` bytes.
    pub fn new(target_config: &[u8]) -> Self {
        Self {
            rollout_id: RolloutId::new(),
            target_config_digest: compute_digest(target_config),
        }
    }

    /// Re-create a spec for an existing rollout.
    pub fn existing(rollout_id: RolloutId, target_config: &[u8]) -> Self {
        Self {
            rollout_id,
            target_config_digest: compute_digest(target_config),
        }
    }

    /// Short form of the digest (first 12 hex chars), for logs.
    pub fn short_digest(&self) -> &str {
        &self.target_config_digest[..12.min(self.target_config_digest.len())]
    }
}

/// Compute the SHA-256 hex digest of a configuration blob.
fn compute_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_config_same_digest() {
        let a = RolloutSpec::new(b"routing-config-v2");
        let b = RolloutSpec::new(b"routing-config-v2");
        assert_eq!(a.target_config_digest, b.target_config_digest);
        assert_ne!(a.rollout_id, b.rollout_id);
    }

    #[test]
    fn test_different_config_different_digest() {
        let a = RolloutSpec::new(b"routing-config-v2");
        let b = RolloutSpec::new(b"routing-config-v3");
        assert_ne!(a.target_config_digest, b.target_config_digest);
    }

    #[test]
    fn test_short_digest_is_12_chars() {
        let spec = RolloutSpec::new(b"config");
        assert_eq!(spec.short_digest().len(), 12);
    }
}
