//! Per-directive serialization via a keyed async mutex.
//!
//! The single-writer-per-directive contract is enforced in-process: every
//! mutating machine operation acquires the directive's lock for its full
//! load-mutate-save span. Distinct directives hold distinct locks and never
//! contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

use dirigent_store::DirectiveId;

/// Keyed lock table, one async mutex per directive.
#[derive(Debug, Default)]
pub struct DirectiveLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl DirectiveLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `directive_id`, creating it on first use.
    ///
    /// The guard is owned so it can be held across await points in the
    /// machine's load-mutate-save sequences.
    pub async fn acquire(&self, directive_id: &DirectiveId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.inner.lock().unwrap();
            table
                .entry(directive_id.0.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_directive_serializes() {
        let locks = Arc::new(DirectiveLocks::new());
        let id = DirectiveId::new();

        let guard = locks.acquire(&id).await;
        let second = {
            let locks = locks.clone();
            let id = id.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&id).await;
            })
        };
        // The second acquire parks until the first guard drops.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!second.is_finished());

        drop(guard);
        second.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_directives_do_not_contend() {
        let locks = DirectiveLocks::new();
        let _a = locks.acquire(&DirectiveId::new()).await;
        // Completes immediately while `_a` is still held.
        let _b = locks.acquire(&DirectiveId::new()).await;
    }
}
