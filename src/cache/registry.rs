//! Cache Registry Module
//!
//! Owns the mapping of namespaces and schedules one-shot entry expiry.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::entry::{CacheEntry, ExpiryTimer};
use crate::cache::handle::CacheHandle;
use crate::cache::CacheStats;
use crate::config::CacheConfig;

// == Namespace ==
/// Per-namespace state: live entries plus observational counters.
#[derive(Debug, Default)]
pub(crate) struct Namespace {
    pub(crate) entries: HashMap<String, CacheEntry>,
    pub(crate) stats: CacheStats,
}

// == Registry Inner ==
/// State shared by a registry and all handles created from it.
#[derive(Debug, Default)]
pub(crate) struct RegistryInner {
    /// Namespace name -> namespace state
    pub(crate) spaces: RwLock<HashMap<String, Namespace>>,
    /// Source of entry epochs, strictly increasing across the registry
    epoch: AtomicU64,
}

impl RegistryInner {
    pub(crate) fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::Relaxed)
    }
}

// == Cache Registry ==
/// Registry of isolated cache namespaces.
///
/// The registry is an explicit value with a controlled lifetime: construct
/// one per process (or one per test) and create namespace handles from it.
/// Clones are cheap and address the same namespaces.
#[derive(Debug, Clone, Default)]
pub struct CacheRegistry {
    pub(crate) inner: Arc<RegistryInner>,
}

impl CacheRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // == Create Cache ==
    /// (Re)initializes `namespace` and returns a typed handle bound to it.
    ///
    /// Creating a handle for a namespace that already exists silently
    /// discards its previous contents, cancelling any pending expiry
    /// timers. Handles created with the same namespace string alias the
    /// same storage; isolation comes from distinct namespace names.
    pub async fn create_cache<T>(
        &self,
        namespace: impl Into<String>,
        config: CacheConfig,
    ) -> CacheHandle<T>
    where
        T: Any + Send + Sync,
    {
        let namespace = namespace.into();
        {
            let mut spaces = self.inner.spaces.write().await;
            spaces.insert(namespace.clone(), Namespace::default());
        }
        debug!(namespace = %namespace, "cache namespace initialized");

        CacheHandle::new(Arc::clone(&self.inner), namespace, config.max_age())
    }
}

// == Expiry Scheduling ==
/// Spawns the one-shot task that evicts `key` from `namespace` once
/// `max_age` has elapsed, unless the entry was replaced in the meantime.
///
/// The task holds only a weak registry reference, so in-flight timers do
/// not keep a dropped registry alive.
pub(crate) fn schedule_expiry(
    inner: &Arc<RegistryInner>,
    namespace: String,
    key: String,
    epoch: u64,
    max_age: Duration,
) -> ExpiryTimer {
    let registry: Weak<RegistryInner> = Arc::downgrade(inner);

    ExpiryTimer::new(tokio::spawn(async move {
        tokio::time::sleep(max_age).await;

        let inner = match registry.upgrade() {
            Some(inner) => inner,
            None => return,
        };

        let mut spaces = inner.spaces.write().await;
        let space = match spaces.get_mut(&namespace) {
            Some(space) => space,
            None => return,
        };

        // Only evict the entry this timer was armed for; a replacement
        // written under the same key carries a newer epoch and keeps its
        // own timer.
        let still_current = space
            .entries
            .get(&key)
            .map_or(false, |entry| entry.epoch() == epoch);
        if still_current {
            // Dropping the entry aborts this task's own handle, which has
            // no effect past this point: there are no further awaits.
            space.entries.remove(&key);
            space.stats.record_expiration();
            debug!(namespace = %namespace, key = %key, "cache entry expired");
        }
    }))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epochs_are_unique_and_increasing() {
        let inner = RegistryInner::default();

        let first = inner.next_epoch();
        let second = inner.next_epoch();

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_create_cache_starts_empty() {
        let registry = CacheRegistry::new();

        let cache = registry
            .create_cache::<String>("fresh", CacheConfig::default())
            .await;

        assert_eq!(cache.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recreating_namespace_discards_previous_contents() {
        let registry = CacheRegistry::new();

        let cache = registry
            .create_cache::<String>("sessions", CacheConfig::default())
            .await;
        cache.set("k", "v".to_string()).await.unwrap();

        let recreated = registry
            .create_cache::<String>("sessions", CacheConfig::default())
            .await;

        assert_eq!(recreated.count().await.unwrap(), 0);
        // The old handle aliases the re-initialized namespace as well
        assert_eq!(cache.count().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recreating_namespace_cancels_pending_timers() {
        let registry = CacheRegistry::new();

        let expiring = registry
            .create_cache::<String>("ttl", CacheConfig::new().with_max_age_secs(1))
            .await;
        expiring.set("k", "v".to_string()).await.unwrap();

        let recreated = registry
            .create_cache::<String>("ttl", CacheConfig::default())
            .await;
        recreated.set("k", "survivor".to_string()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;

        // The old entry's timer died with the namespace; the new entry has
        // no max-age and must still be there.
        let value = recreated.get("k").await.unwrap().expect("value should survive");
        assert_eq!(*value, "survivor");
    }

    #[tokio::test]
    async fn test_registries_are_independent() {
        let first = CacheRegistry::new();
        let second = CacheRegistry::new();

        let a = first
            .create_cache::<String>("ns", CacheConfig::default())
            .await;
        let b = second
            .create_cache::<String>("ns", CacheConfig::default())
            .await;

        a.set("k", "from-first".to_string()).await.unwrap();

        assert!(b.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cloned_registry_aliases_namespaces() {
        let registry = CacheRegistry::new();
        let cache = registry
            .create_cache::<String>("shared", CacheConfig::default())
            .await;
        cache.set("k", "v".to_string()).await.unwrap();

        // Re-initializing through a clone empties the namespace the
        // original handle is bound to: both address the same storage.
        let clone = registry.clone();
        clone
            .create_cache::<String>("shared", CacheConfig::default())
            .await;

        assert_eq!(cache.count().await.unwrap(), 0);
    }
}
