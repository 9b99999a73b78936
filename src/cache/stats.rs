//! Cache Statistics Module
//!
//! Tracks hit/miss/eviction counters per backend and assembles the
//! backend-wide statistics report (entry count, usage percentage, entry
//! ages).

use serde::Serialize;

use crate::cache::entry::CacheInfo;

// == Cache Counters ==
/// Running performance counters for one backend.
#[derive(Debug, Clone, Default)]
pub struct CacheCounters {
    /// Number of successful retrievals
    pub hits: u64,
    /// Number of retrievals that found no live entry
    pub misses: u64,
    /// Number of entries evicted by the capacity bound
    pub evictions: u64,
}

impl CacheCounters {
    // == Constructor ==
    /// Creates counters starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 before any retrieval.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Backend Stats ==
/// Backend-wide statistics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct BackendStats {
    /// Backend implementation name
    pub backend: &'static str,
    /// Number of live entries
    pub total_entries: usize,
    /// Configured capacity bound
    pub max_keys: usize,
    /// total_entries / max_keys, as a percentage
    pub cache_usage_percent: f64,
    /// Mean age of live entries in hours, None when empty
    pub average_entry_age_hours: Option<f64>,
    /// Age of the oldest live entry in hours, None when empty
    pub oldest_entry_age_hours: Option<f64>,
    /// Age of the newest live entry in hours, None when empty
    pub newest_entry_age_hours: Option<f64>,
    /// Successful retrievals since construction
    pub hits: u64,
    /// Missed retrievals since construction
    pub misses: u64,
    /// Entries evicted by the capacity bound since construction
    pub evictions: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

// == Build Stats ==
/// Assembles a [`BackendStats`] from live entry metadata and counters.
pub fn build_stats(
    backend: &'static str,
    infos: &[CacheInfo],
    max_keys: usize,
    counters: &CacheCounters,
) -> BackendStats {
    let total_entries = infos.len();
    let cache_usage_percent = if max_keys == 0 {
        0.0
    } else {
        total_entries as f64 / max_keys as f64 * 100.0
    };

    let (average, oldest, newest) = if infos.is_empty() {
        (None, None, None)
    } else {
        let sum: f64 = infos.iter().map(|i| i.age_hours).sum();
        let oldest = infos.iter().map(|i| i.age_hours).fold(f64::MIN, f64::max);
        let newest = infos.iter().map(|i| i.age_hours).fold(f64::MAX, f64::min);
        (
            Some(sum / total_entries as f64),
            Some(oldest),
            Some(newest),
        )
    };

    BackendStats {
        backend,
        total_entries,
        max_keys,
        cache_usage_percent,
        average_entry_age_hours: average,
        oldest_entry_age_hours: oldest,
        newest_entry_age_hours: newest,
        hits: counters.hits,
        misses: counters.misses,
        evictions: counters.evictions,
        hit_rate: counters.hit_rate(),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_counters_start_at_zero() {
        let counters = CacheCounters::new();
        assert_eq!(counters.hits, 0);
        assert_eq!(counters.misses, 0);
        assert_eq!(counters.evictions, 0);
        assert_eq!(counters.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut counters = CacheCounters::new();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        counters.record_miss();
        assert_eq!(counters.hit_rate(), 0.5);
    }

    #[test]
    fn test_build_stats_empty() {
        let stats = build_stats("ephemeral", &[], 10, &CacheCounters::new());
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.cache_usage_percent, 0.0);
        assert!(stats.average_entry_age_hours.is_none());
        assert!(stats.oldest_entry_age_hours.is_none());
        assert!(stats.newest_entry_age_hours.is_none());
    }

    #[test]
    fn test_build_stats_usage_percent() {
        let infos = vec![
            CacheInfo::new("a", Utc::now()),
            CacheInfo::new("b", Utc::now()),
        ];
        let stats = build_stats("ephemeral", &infos, 10, &CacheCounters::new());
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.cache_usage_percent, 20.0);
    }

    #[test]
    fn test_build_stats_age_spread() {
        let now = Utc::now();
        let infos = vec![
            CacheInfo::new("old", now - Duration::hours(4)),
            CacheInfo::new("new", now - Duration::hours(2)),
        ];
        let stats = build_stats("disk", &infos, 100, &CacheCounters::new());

        let avg = stats.average_entry_age_hours.unwrap();
        let oldest = stats.oldest_entry_age_hours.unwrap();
        let newest = stats.newest_entry_age_hours.unwrap();

        assert!(oldest >= newest);
        assert!((avg - (oldest + newest) / 2.0).abs() < 1e-6);
        assert!(oldest >= 4.0 && oldest < 4.1);
        assert!(newest >= 2.0 && newest < 2.1);
    }

    #[test]
    fn test_build_stats_zero_capacity_does_not_divide() {
        let stats = build_stats("ephemeral", &[], 0, &CacheCounters::new());
        assert_eq!(stats.cache_usage_percent, 0.0);
    }
}
