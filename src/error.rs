//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Operation addressed a namespace that is not present in the registry.
    ///
    /// Cannot occur through the factory path: `create_cache` always
    /// initializes the namespace before returning a handle.
    #[error("expected cache namespace '{0}' to be available")]
    MissingNamespace(String),

    /// The value stored under this key has a different concrete type than
    /// the handle requested. Only reachable when two handles of different
    /// value types alias the same namespace string.
    #[error("value under '{namespace}:{key}' was stored with a different type")]
    ValueTypeMismatch {
        /// Namespace the read went through
        namespace: String,
        /// Key whose value failed to downcast
        key: String,
    },

    /// The producer passed to `get_or_create` failed. The underlying error
    /// is surfaced as-is; nothing is cached and nothing is retried.
    #[error("cache fill failed: {0}")]
    CreateFailed(anyhow::Error),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
