//! Cache Backend Contract
//!
//! The one interface the decorator and the management surface speak. All
//! concrete backends (ephemeral, disk, redis) implement it behind interior
//! synchronization so a single instance can be shared by many owners across
//! threads.

use std::sync::Arc;

use crate::cache::entry::CacheInfo;
use crate::cache::stats::BackendStats;
use crate::error::Result;

// == Cache Backend Trait ==
/// Storage contract for cached values of type `V`.
///
/// A miss is a first-class outcome (`Ok(None)` / `Ok(false)`), never an
/// error; errors are reserved for backend I/O and misuse. Backends
/// exclusively own their stored entries: callers never mutate stored state
/// except through these operations.
pub trait CacheBackend<V>: Send + Sync {
    /// Backend implementation name, for reports and logging.
    fn name(&self) -> &'static str;

    /// Stores `value` under `key`, evicting the oldest-inserted entry first
    /// when the capacity bound would be exceeded. Overwrites any live entry
    /// under the same key with a freshly timestamped one.
    fn set(&self, key: &str, value: V) -> Result<()>;

    /// Returns the stored value, or `None` on a miss. Lookups never affect
    /// eviction order.
    fn get(&self, key: &str) -> Result<Option<V>>;

    /// Returns true when a live entry exists under `key`.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Number of live entries.
    fn len(&self) -> Result<usize>;

    /// Returns true when the backend holds no live entries.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Metadata for every live entry.
    fn list_cached_keys(&self) -> Result<Vec<CacheInfo>>;

    /// Metadata for one key, or `None` when absent.
    fn get_cache_info(&self, key: &str) -> Result<Option<CacheInfo>>;

    /// Removes exactly the given keys; absent keys are ignored. Returns the
    /// number of entries removed.
    fn invalidate_keys(&self, keys: &[String]) -> Result<usize>;

    /// Removes every key matching a `*`-wildcard pattern. Returns the
    /// number of entries removed.
    fn invalidate_pattern(&self, pattern: &str) -> Result<usize>;

    /// Removes every entry. Returns the number of entries removed.
    fn invalidate_all(&self) -> Result<usize>;

    /// Backend-wide statistics snapshot.
    fn stats(&self) -> Result<BackendStats>;
}

// == Shared Backend Alias ==
/// A backend instance shared by multiple owners, possibly across threads.
pub type SharedBackend<V> = Arc<dyn CacheBackend<V>>;
