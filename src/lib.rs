//! In-process namespaced key-value cache
//!
//! Values live in named, isolated namespaces and can be given a max-age,
//! after which a one-shot timer evicts them. `get_or_create` memoizes the
//! result of an asynchronous producer behind a key.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use nscache::{CacheConfig, CacheRegistry};
//!
//! #[tokio::main]
//! async fn main() -> nscache::Result<()> {
//!     let registry = CacheRegistry::new();
//!     let sessions = registry
//!         .create_cache::<String>(
//!             "sessions",
//!             CacheConfig::new().with_max_age(Duration::from_secs(60)),
//!         )
//!         .await;
//!
//!     sessions.set("alice", "token-1".to_string()).await?;
//!
//!     let token = sessions
//!         .get_or_create("bob", || async { Ok("token-2".to_string()) })
//!         .await?;
//!     assert_eq!(*token, "token-2");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheHandle, CacheRegistry, CacheStats};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
