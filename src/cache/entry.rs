//! Cache Entry Module
//!
//! Defines individual cache entries and their owned expiry timers.

use std::any::Any;
use std::sync::Arc;

use tokio::task::JoinHandle;

// == Expiry Timer ==
/// Owned handle for a scheduled one-shot expiry task.
///
/// Dropping the handle aborts the task, so every path that removes or
/// replaces an entry also cancels its timer.
#[derive(Debug)]
pub(crate) struct ExpiryTimer {
    handle: JoinHandle<()>,
}

impl ExpiryTimer {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// == Cache Entry ==
/// A single cached value plus its optional expiry timer.
///
/// The payload is type-erased so namespaces holding different value types
/// can share one registry; handles downcast on read. The epoch tags the
/// entry so an expiry timer can tell it apart from a replacement written
/// later under the same key.
pub(crate) struct CacheEntry {
    /// The stored payload
    value: Arc<dyn Any + Send + Sync>,
    /// Registry-unique tag for this particular entry
    epoch: u64,
    /// Scheduled eviction, absent when the namespace has no max-age
    expiry: Option<ExpiryTimer>,
}

impl CacheEntry {
    pub(crate) fn new(
        value: Arc<dyn Any + Send + Sync>,
        epoch: u64,
        expiry: Option<ExpiryTimer>,
    ) -> Self {
        Self {
            value,
            epoch,
            expiry,
        }
    }

    /// Returns the payload as `T`, or None if it was stored as another type.
    pub(crate) fn value<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    #[allow(dead_code)]
    pub(crate) fn has_expiry(&self) -> bool {
        self.expiry.is_some()
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("epoch", &self.epoch)
            .field("has_expiry", &self.expiry.is_some())
            .finish_non_exhaustive()
    }
}
