//! Token revocation registry
//!
//! Process-local set of revoked token strings. Each entry remembers until
//! when it has to be kept: past the token's own `exp` the codec rejects the
//! token anyway, so the periodic sweep can drop it.
//!
//! Nothing here is persisted. A restart forgets every revocation; tokens
//! revoked before the restart become usable again until they expire.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::clock::Clock;

/// Thread-safe revocation set, cheap to clone (clones share state)
#[derive(Clone, Default)]
pub struct RevocationRegistry {
    /// token -> Unix timestamp after which the entry may be evicted
    entries: Arc<RwLock<HashMap<String, i64>>>,
}

impl RevocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke `token`, keeping the entry at least until `retain_until`.
    ///
    /// Returns `true` if the token was not revoked before. Empty tokens are
    /// ignored.
    pub async fn add(&self, token: &str, retain_until: i64) -> bool {
        if token.is_empty() {
            return false;
        }

        let mut entries = self.entries.write().await;
        match entries.get_mut(token) {
            Some(existing) => {
                *existing = (*existing).max(retain_until);
                false
            }
            None => {
                entries.insert(token.to_string(), retain_until);
                true
            }
        }
    }

    pub async fn contains(&self, token: &str) -> bool {
        self.entries.read().await.contains_key(token)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop entries whose retention deadline is before `now`
    pub async fn sweep_expired(&self, now: i64) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, retain_until| *retain_until >= now);
        before - entries.len()
    }
}

/// Spawn the background task that periodically evicts stale entries
pub fn spawn_sweeper(
    registry: RevocationRegistry,
    clock: Arc<dyn Clock>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await; // Registry starts empty

        loop {
            interval.tick().await;
            let evicted = registry.sweep_expired(clock.now()).await;
            if evicted > 0 {
                let remaining = registry.len().await;
                tracing::debug!(evicted, remaining, "Evicted expired revocation entries");
            }
        }
    })
}
