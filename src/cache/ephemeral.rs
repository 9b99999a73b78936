//! Ephemeral Cache Module
//!
//! Bounded in-process cache backend. Eviction is first-in-first-out by
//! insertion order; lookups do not reorder entries. The table lives behind
//! a mutex so one instance can be shared by several repositories across
//! worker threads.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::cache::backend::CacheBackend;
use crate::cache::entry::{CacheEntry, CacheInfo};
use crate::cache::order::InsertionOrder;
use crate::cache::pattern::glob_match;
use crate::cache::stats::{build_stats, BackendStats, CacheCounters};
use crate::cache::DEFAULT_MAX_KEYS;
use crate::error::Result;

// == Inner Table ==
#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: InsertionOrder,
    counters: CacheCounters,
}

// == Ephemeral Cache ==
/// Bounded in-memory cache backend with FIFO eviction.
#[derive(Debug)]
pub struct EphemeralCache<V> {
    inner: Mutex<Inner<V>>,
    max_keys: usize,
}

impl<V> EphemeralCache<V> {
    // == Constructor ==
    /// Creates a cache holding at most `max_keys` entries.
    pub fn new(max_keys: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: InsertionOrder::new(),
                counters: CacheCounters::new(),
            }),
            max_keys,
        }
    }

    /// Configured capacity bound.
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> Default for EphemeralCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_KEYS)
    }
}

impl<V> Inner<V> {
    /// Evicts oldest-inserted entries until the table fits `max_keys`
    /// together with `incoming` new keys.
    fn evict_to_fit(&mut self, max_keys: usize, incoming: usize) {
        while self.entries.len() + incoming > max_keys {
            match self.order.evict_oldest() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    self.counters.record_eviction();
                    debug!(key = %oldest, "evicted oldest-inserted cache entry");
                }
                None => break,
            }
        }
    }

    fn remove_keys(&mut self, keys: &[String]) -> usize {
        let mut removed = 0;
        for key in keys {
            if self.entries.remove(key).is_some() {
                self.order.remove(key);
                removed += 1;
            }
        }
        removed
    }
}

impl<V: Clone + Send + Sync> CacheBackend<V> for EphemeralCache<V> {
    fn name(&self) -> &'static str {
        "EphemeralCache"
    }

    fn set(&self, key: &str, value: V) -> Result<()> {
        let mut inner = self.lock();

        // Overwrites replace in place; only genuinely new keys can push the
        // table over its bound.
        if !inner.entries.contains_key(key) {
            inner.evict_to_fit(self.max_keys, 1);
        }

        inner.entries.insert(key.to_string(), CacheEntry::new(value));
        inner.order.record_insert(key);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<V>> {
        let mut inner = self.lock();
        match inner.entries.get(key) {
            Some(entry) => {
                let value = entry.value.clone();
                inner.counters.record_hit();
                Ok(Some(value))
            }
            None => {
                inner.counters.record_miss();
                Ok(None)
            }
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.lock().entries.contains_key(key))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.lock().entries.len())
    }

    fn list_cached_keys(&self) -> Result<Vec<CacheInfo>> {
        let inner = self.lock();
        let infos = inner
            .order
            .keys()
            .filter_map(|k| inner.entries.get(k).map(|e| e.info(k)))
            .collect();
        Ok(infos)
    }

    fn get_cache_info(&self, key: &str) -> Result<Option<CacheInfo>> {
        Ok(self.lock().entries.get(key).map(|e| e.info(key)))
    }

    fn invalidate_keys(&self, keys: &[String]) -> Result<usize> {
        Ok(self.lock().remove_keys(keys))
    }

    fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        let mut inner = self.lock();
        let matching: Vec<String> = inner
            .entries
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        Ok(inner.remove_keys(&matching))
    }

    fn invalidate_all(&self) -> Result<usize> {
        let mut inner = self.lock();
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.order = InsertionOrder::new();
        Ok(removed)
    }

    fn stats(&self) -> Result<BackendStats> {
        let inner = self.lock();
        let infos: Vec<CacheInfo> = inner
            .entries
            .iter()
            .map(|(k, e)| e.info(k))
            .collect();
        Ok(build_stats("EphemeralCache", &infos, self.max_keys, &inner.counters))
    }
}
