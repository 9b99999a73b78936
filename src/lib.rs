//! gitframe - a pluggable caching layer for Git repository analytics
//!
//! Repository analytics (commit history, blame, branches, tags) are
//! expensive to extract and cheap to reuse. This crate memoizes their
//! tabular results in a pluggable key-value cache with three backends: a
//! bounded in-memory table, a compressed on-disk snapshot, and Redis with
//! server-enforced expiry. Keys are derived from the method name, the
//! owning repository and the declared arguments, so one backend instance
//! can be shared safely across many repositories and worker threads.
//!
//! The extraction itself is behind the [`source::MetricsSource`] trait;
//! wire up whatever Git plumbing produces your tabular frames.
//!
//! ```
//! use gitframe::cache::{CacheBackend, EphemeralCache};
//!
//! let cache = EphemeralCache::new(1000);
//! cache.set("commit_history|repo1|main|100", "…frame…".to_string()).unwrap();
//!
//! assert_eq!(
//!     cache.get("commit_history|repo1|main|100").unwrap(),
//!     Some("…frame…".to_string())
//! );
//! assert_eq!(cache.get("blame|repo1|HEAD").unwrap(), None); // a miss, not an error
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod repo;
pub mod source;

pub use cache::{CacheBackend, CacheInfo, CacheKey, DiskCache, EphemeralCache, SharedBackend};
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
pub use config::CacheConfig;
pub use error::{CacheError, Error};
pub use models::{BulkWarmResult, CacheStatsReport, WarmCacheResult};
pub use repo::project::{BulkWarmOptions, Project};
pub use repo::{Repository, WarmOptions};
pub use source::MetricsSource;
