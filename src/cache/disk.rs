//! Disk Cache Module
//!
//! The bounded table from the ephemeral backend, persisted as a
//! gzip-compressed JSON snapshot. The snapshot is loaded once at
//! construction and rewritten after every mutation, so the on-disk state
//! always matches the last completed mutation. The full-table rewrite is
//! O(table size) per mutation, which targets moderate key counts rather
//! than database workloads.
//!
//! A corrupt or unreadable snapshot is treated as an empty cache with a
//! warning; it never fails construction. Snapshots written by older
//! versions may lack per-entry timestamps or the insertion-order vector;
//! both are synthesized at load time.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::backend::CacheBackend;
use crate::cache::entry::{CacheEntry, CacheInfo};
use crate::cache::order::InsertionOrder;
use crate::cache::pattern::glob_match;
use crate::cache::stats::{build_stats, BackendStats, CacheCounters};
use crate::cache::DEFAULT_MAX_KEYS;
use crate::error::Result;

// == Snapshot Format ==
/// On-disk representation of one entry.
///
/// `cached_at` is optional so snapshots from versions that predate entry
/// timestamps still deserialize; the loader stamps those at load time.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry<V> {
    value: V,
    #[serde(default)]
    cached_at: Option<DateTime<Utc>>,
}

/// On-disk representation of the whole table.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot<V> {
    #[serde(default = "HashMap::new")]
    entries: HashMap<String, StoredEntry<V>>,
    /// Insertion order, oldest first. Absent in legacy snapshots.
    #[serde(default)]
    order: Vec<String>,
}

// == Inner Table ==
#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: InsertionOrder,
    counters: CacheCounters,
}

// == Disk Cache ==
/// Bounded cache backend persisted to a compressed snapshot file.
#[derive(Debug)]
pub struct DiskCache<V> {
    path: PathBuf,
    max_keys: usize,
    inner: Mutex<Inner<V>>,
}

impl<V> DiskCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Opens (or creates) a disk cache at `path` with the default bound.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_max_keys(path, DEFAULT_MAX_KEYS)
    }

    /// Opens (or creates) a disk cache at `path` holding at most
    /// `max_keys` entries.
    ///
    /// If the file exists its table is loaded; anything unreadable loads
    /// as an empty cache with a warning. A snapshot larger than the bound
    /// is trimmed oldest-first.
    pub fn with_max_keys(path: impl AsRef<Path>, max_keys: usize) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut inner = Inner {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            counters: CacheCounters::new(),
        };

        if path.exists() {
            match Self::load_snapshot(&path) {
                Ok(snapshot) => Self::restore(&mut inner, snapshot),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "unreadable cache snapshot, starting empty");
                }
            }
        }

        // Respect a bound smaller than the snapshot we just loaded
        while inner.entries.len() > max_keys {
            if let Some(oldest) = inner.order.evict_oldest() {
                inner.entries.remove(&oldest);
            } else {
                break;
            }
        }

        Self {
            path,
            max_keys,
            inner: Mutex::new(inner),
        }
    }

    /// Configured capacity bound.
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    /// Snapshot file path.
    pub fn filepath(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Load ==
    fn load_snapshot(path: &Path) -> Result<Snapshot<V>> {
        let file = File::open(path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        let snapshot = serde_json::from_reader(decoder)?;
        Ok(snapshot)
    }

    fn restore(inner: &mut Inner<V>, snapshot: Snapshot<V>) {
        let Snapshot { mut entries, order } = snapshot;

        // Recorded order first, skipping keys the snapshot no longer holds
        for key in order {
            if let Some(stored) = entries.remove(&key) {
                Self::restore_entry(inner, key, stored);
            }
        }
        // Legacy snapshots carry no order vector; whatever is left gets an
        // arbitrary but stable-from-here position
        let mut leftover: Vec<(String, StoredEntry<V>)> = entries.drain().collect();
        leftover.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, stored) in leftover {
            Self::restore_entry(inner, key, stored);
        }

        debug!(entries = inner.entries.len(), "cache snapshot loaded");
    }

    fn restore_entry(inner: &mut Inner<V>, key: String, stored: StoredEntry<V>) {
        // Entries from before timestamps existed get one now so age
        // reporting stays well-defined
        let cached_at = stored.cached_at.unwrap_or_else(Utc::now);
        inner
            .entries
            .insert(key.clone(), CacheEntry::with_timestamp(stored.value, cached_at));
        inner.order.record_insert(&key);
    }

    // == Save ==
    /// Serializes the full table back to the snapshot path.
    ///
    /// A failed flush leaves the in-memory table authoritative for the
    /// rest of the process lifetime; the error is reported, not retried.
    fn save(&self, inner: &Inner<V>) -> Result<()> {
        let snapshot = Snapshot {
            entries: inner
                .entries
                .iter()
                .map(|(k, e)| {
                    (
                        k.clone(),
                        StoredEntry {
                            value: e.value.clone(),
                            cached_at: Some(e.cached_at),
                        },
                    )
                })
                .collect(),
            order: inner.order.keys().cloned().collect(),
        };

        let file = File::create(&self.path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut encoder, &snapshot)?;
        encoder.finish()?;
        Ok(())
    }

    fn remove_keys_and_save(&self, keys: &[String]) -> Result<usize> {
        let mut inner = self.lock();
        let mut removed = 0;
        for key in keys {
            if inner.entries.remove(key).is_some() {
                inner.order.remove(key);
                removed += 1;
            }
        }
        if removed > 0 {
            self.save(&inner)?;
        }
        Ok(removed)
    }
}

impl<V> CacheBackend<V> for DiskCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned,
{
    fn name(&self) -> &'static str {
        "DiskCache"
    }

    fn set(&self, key: &str, value: V) -> Result<()> {
        let mut inner = self.lock();

        if !inner.entries.contains_key(key) {
            while inner.entries.len() + 1 > self.max_keys {
                match inner.order.evict_oldest() {
                    Some(oldest) => {
                        inner.entries.remove(&oldest);
                        inner.counters.record_eviction();
                    }
                    None => break,
                }
            }
        }

        inner.entries.insert(key.to_string(), CacheEntry::new(value));
        inner.order.record_insert(key);
        self.save(&inner)
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
        self.remove_keys_and_save(keys)
    }

    fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        let matching: Vec<String> = {
            let inner = self.lock();
            inner
                .entries
                .keys()
                .filter(|k| glob_match(pattern, k))
                .cloned()
                .collect()
        };
        self.remove_keys_and_save(&matching)
    }

    fn invalidate_all(&self) -> Result<usize> {
        let mut inner = self.lock();
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.order = InsertionOrder::new();
        self.save(&inner)?;
        Ok(removed)
    }

    fn stats(&self) -> Result<BackendStats> {
        let inner = self.lock();
        let infos: Vec<CacheInfo> = inner
            .entries
            .iter()
            .map(|(k, e)| e.info(k))
            .collect();
        Ok(build_stats("DiskCache", &infos, self.max_keys, &inner.counters))
    }
}
