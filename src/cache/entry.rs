//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and the metadata
//! records exposed by the key-listing APIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A single stored value plus its write timestamp.
///
/// `cached_at` is set exactly once when the entry is created; re-setting the
/// same key replaces the whole entry with a fresh timestamp rather than
/// patching the old one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The stored payload
    pub value: V,
    /// UTC instant the value was written
    pub cached_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current UTC time.
    pub fn new(value: V) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
        }
    }

    /// Creates an entry with an explicit timestamp.
    ///
    /// Used when loading snapshots, where the write time is the recorded
    /// one (or a synthesized one for legacy entries).
    pub fn with_timestamp(value: V, cached_at: DateTime<Utc>) -> Self {
        Self { value, cached_at }
    }

    // == Age ==
    /// Age of this entry in seconds.
    pub fn age_seconds(&self) -> f64 {
        let delta = Utc::now() - self.cached_at;
        delta.num_milliseconds() as f64 / 1000.0
    }

    /// Builds the metadata record for this entry under `key`.
    pub fn info(&self, key: &str) -> CacheInfo {
        CacheInfo::new(key, self.cached_at)
    }
}

// == Cache Info ==
/// Per-key metadata record returned by `list_cached_keys` and
/// `get_cache_info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheInfo {
    /// The full cache key
    pub key: String,
    /// UTC instant the entry was written
    pub cached_at: DateTime<Utc>,
    /// Age in seconds at the time the record was built
    pub age_seconds: f64,
    /// Age in minutes
    pub age_minutes: f64,
    /// Age in hours
    pub age_hours: f64,
}

impl CacheInfo {
    /// Builds a record for `key`, deriving ages from `cached_at`.
    pub fn new(key: &str, cached_at: DateTime<Utc>) -> Self {
        let age_seconds = (Utc::now() - cached_at).num_milliseconds() as f64 / 1000.0;
        Self {
            key: key.to_string(),
            cached_at,
            age_seconds,
            age_minutes: age_seconds / 60.0,
            age_hours: age_seconds / 3600.0,
        }
    }
}
