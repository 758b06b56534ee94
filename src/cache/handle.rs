//! Cache Handle Module
//!
//! Typed, namespace-bound accessors over the shared registry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::entry::CacheEntry;
use crate::cache::registry::{schedule_expiry, Namespace, RegistryInner};
use crate::cache::CacheStats;
use crate::error::{CacheError, Result};

// == Cache Handle ==
/// Typed accessor for one cache namespace.
///
/// Handles are created through [`CacheRegistry`](crate::CacheRegistry) and
/// stay bound to their namespace and max-age. Cloning a handle is cheap;
/// clones address the same namespace.
pub struct CacheHandle<T> {
    registry: Arc<RegistryInner>,
    namespace: String,
    max_age: Option<Duration>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for CacheHandle<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            namespace: self.namespace.clone(),
            max_age: self.max_age,
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for CacheHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHandle")
            .field("namespace", &self.namespace)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl<T> CacheHandle<T>
where
    T: Any + Send + Sync,
{
    pub(crate) fn new(
        registry: Arc<RegistryInner>,
        namespace: String,
        max_age: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            namespace,
            max_age,
            _value: PhantomData,
        }
    }

    // == Set ==
    /// Inserts or replaces the value for `key`.
    ///
    /// Replacing an entry cancels the timer of the value being replaced.
    /// When the handle carries a max-age, the new entry gets a one-shot
    /// timer that evicts it once the max-age elapses, unless it has been
    /// replaced again by then.
    pub async fn set(&self, key: impl Into<String>, value: T) -> Result<()> {
        self.insert(key.into(), Arc::new(value)).await
    }

    async fn insert(&self, key: String, value: Arc<T>) -> Result<()> {
        let mut spaces = self.registry.spaces.write().await;
        let space = self.space_mut(&mut spaces)?;

        let epoch = self.registry.next_epoch();
        let expiry = self.max_age.map(|max_age| {
            schedule_expiry(
                &self.registry,
                self.namespace.clone(),
                key.clone(),
                epoch,
                max_age,
            )
        });

        space.entries.insert(key, CacheEntry::new(value, epoch, expiry));
        Ok(())
    }

    // == Get ==
    /// Returns the value for `key`, or None when absent.
    ///
    /// Reads never extend an entry's lifetime; an entry written through a
    /// max-age handle expires on schedule no matter how often it is read.
    /// The returned `Arc` is the stored allocation itself, so repeated
    /// reads observe the same value identity.
    pub async fn get(&self, key: &str) -> Result<Option<Arc<T>>> {
        let mut spaces = self.registry.spaces.write().await;
        let space = self.space_mut(&mut spaces)?;

        match space.entries.get(key) {
            Some(entry) => {
                let value = entry.value::<T>().ok_or_else(|| CacheError::ValueTypeMismatch {
                    namespace: self.namespace.clone(),
                    key: key.to_string(),
                })?;
                space.stats.record_hit();
                Ok(Some(value))
            }
            None => {
                space.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Remove ==
    /// Removes the entry for `key`, cancelling its timer. No-op when the
    /// key is absent.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let mut spaces = self.registry.spaces.write().await;
        let space = self.space_mut(&mut spaces)?;

        space.entries.remove(key);
        Ok(())
    }

    // == Clear ==
    /// Removes every entry in the namespace.
    ///
    /// Dropping the entries cancels all of their pending timers, so a
    /// cleared namespace has no scheduled eviction left behind.
    pub async fn clear(&self) -> Result<()> {
        let mut spaces = self.registry.spaces.write().await;
        let space = self.space_mut(&mut spaces)?;

        space.entries.clear();
        debug!(namespace = %self.namespace, "cache namespace cleared");
        Ok(())
    }

    // == Count ==
    /// Returns the number of live keys in the namespace.
    pub async fn count(&self) -> Result<usize> {
        let spaces = self.registry.spaces.read().await;
        let space = self.space(&spaces)?;

        Ok(space.entries.len())
    }

    // == Stats ==
    /// Returns a snapshot of the namespace's counters.
    pub async fn stats(&self) -> Result<CacheStats> {
        let spaces = self.registry.spaces.read().await;
        let space = self.space(&spaces)?;

        let mut stats = space.stats.clone();
        stats.set_live_entries(space.entries.len());
        Ok(stats)
    }

    // == Get Or Create ==
    /// Returns the value for `key`, producing and caching it on a miss.
    ///
    /// On a hit the producer is never invoked. On a miss the producer runs
    /// outside the registry lock; its result is stored with [`set`]
    /// semantics and returned. A producer failure surfaces as
    /// [`CacheError::CreateFailed`] and nothing is cached.
    ///
    /// This is not a single-flight operation: callers racing on the same
    /// absent key each invoke their own producer and each store a result,
    /// last write wins. Every racing caller still resolves to the value
    /// its own producer built.
    ///
    /// [`set`]: CacheHandle::set
    pub async fn get_or_create<F, Fut>(&self, key: &str, create: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(existing) = self.get(key).await? {
            return Ok(existing);
        }

        let value = Arc::new(create().await.map_err(CacheError::CreateFailed)?);
        self.insert(key.to_string(), Arc::clone(&value)).await?;

        Ok(value)
    }

    // == Namespace Lookup ==
    fn space<'a>(&self, spaces: &'a HashMap<String, Namespace>) -> Result<&'a Namespace> {
        spaces
            .get(&self.namespace)
            .ok_or_else(|| CacheError::MissingNamespace(self.namespace.clone()))
    }

    fn space_mut<'a>(
        &self,
        spaces: &'a mut HashMap<String, Namespace>,
    ) -> Result<&'a mut Namespace> {
        spaces
            .get_mut(&self.namespace)
            .ok_or_else(|| CacheError::MissingNamespace(self.namespace.clone()))
    }
}
