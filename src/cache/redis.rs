//! Redis Cache Module
//!
//! The cache contract delegated to a Redis server over the synchronous
//! client. Entries live under a fixed namespace prefix and are stored as a
//! serialized envelope carrying the value plus its write timestamp, so the
//! metadata APIs work the same as for the local backends.
//!
//! Expiry is the server's job: an optional TTL is attached at write time
//! and expired keys simply stop appearing in lookups and listings. This
//! backend never degrades to a local fallback; connectivity and protocol
//! errors propagate to the caller, and resilience belongs to a higher
//! layer.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use redis::Commands;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::backend::CacheBackend;
use crate::cache::entry::CacheInfo;
use crate::cache::pattern::glob_match;
use crate::cache::stats::{build_stats, BackendStats, CacheCounters};
use crate::cache::DEFAULT_MAX_KEYS;
use crate::error::Result;

/// Namespace prefix for every key this backend touches.
pub const KEY_PREFIX: &str = "gitframe_";

// == Redis Config ==
/// Connection parameters for [`RedisCache`].
///
/// The typed fields are the ones this backend interprets. `extra` is an
/// open bag of client options appended verbatim to the connection URL
/// query string; their meaning is the client's business, not ours.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Server hostname
    pub host: String,
    /// Server port
    pub port: u16,
    /// Logical database index
    pub db: i64,
    /// Local capacity bound for entries written through this instance
    pub max_keys: usize,
    /// Per-entry expiry in seconds, None for no expiry
    pub ttl: Option<u64>,
    /// Client-specific options forwarded verbatim
    pub extra: HashMap<String, String>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 12,
            max_keys: DEFAULT_MAX_KEYS,
            ttl: None,
            extra: HashMap::new(),
        }
    }
}

impl RedisConfig {
    /// Builds the connection URL, including pass-through options.
    pub fn url(&self) -> String {
        let mut url = format!("redis://{}:{}/{}", self.host, self.port, self.db);
        if !self.extra.is_empty() {
            let mut pairs: Vec<(&String, &String)> = self.extra.iter().collect();
            pairs.sort();
            let query: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }
}

// == Stored Envelope ==
/// What actually goes over the wire: the value plus its write timestamp.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<V> {
    value: V,
    cached_at: DateTime<Utc>,
}

// == Inner State ==
struct Inner {
    conn: redis::Connection,
    /// Prefixed keys written through this instance, oldest first
    key_list: Vec<String>,
    counters: CacheCounters,
}

// == Redis Cache ==
/// Cache backend delegated to a Redis server.
pub struct RedisCache<V> {
    inner: Mutex<Inner>,
    max_keys: usize,
    ttl: Option<u64>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> RedisCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Connects to the configured server and syncs the local key list with
    /// whatever already lives under the namespace prefix (order is not
    /// preserved for pre-existing keys).
    pub fn new(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url())?;
        let conn = client.get_connection()?;

        let cache = Self {
            inner: Mutex::new(Inner {
                conn,
                key_list: Vec::new(),
                counters: CacheCounters::new(),
            }),
            max_keys: config.max_keys,
            ttl: config.ttl,
            _marker: PhantomData,
        };
        cache.sync()?;
        Ok(cache)
    }

    /// Configured capacity bound.
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    /// Configured per-entry TTL in seconds.
    pub fn ttl(&self) -> Option<u64> {
        self.ttl
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prefixed(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }

    fn unprefixed(full: &str) -> &str {
        full.strip_prefix(KEY_PREFIX).unwrap_or(full)
    }

    // == Sync ==
    /// Replaces the local key list with the server's current live keys.
    pub fn sync(&self) -> Result<()> {
        let mut inner = self.lock();
        let keys: Vec<String> = inner.conn.keys(format!("{KEY_PREFIX}*"))?;
        inner.key_list = keys;
        Ok(())
    }

    // == Purge ==
    /// Deletes every key under the namespace prefix, including keys
    /// written by other instances. Returns the number deleted.
    pub fn purge(&self) -> Result<usize> {
        let mut inner = self.lock();
        let keys: Vec<String> = inner.conn.keys(format!("{KEY_PREFIX}*"))?;
        let mut removed = 0usize;
        for key in &keys {
            let n: usize = inner.conn.del(key)?;
            removed += n;
        }
        inner.key_list.clear();
        Ok(removed)
    }

    fn fetch_envelope(conn: &mut redis::Connection, full_key: &str) -> Result<Option<Envelope<V>>> {
        let raw: Option<String> = conn.get(full_key)?;
        match raw {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    fn delete_keys(inner: &mut Inner, full_keys: &[String]) -> Result<usize> {
        let mut removed = 0usize;
        for key in full_keys {
            let n: usize = inner.conn.del(key)?;
            removed += n;
            inner.key_list.retain(|k| k != key);
        }
        Ok(removed)
    }
}

impl<V> CacheBackend<V> for RedisCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned,
{
    fn name(&self) -> &'static str {
        "RedisCache"
    }

    fn set(&self, key: &str, value: V) -> Result<()> {
        let full = Self::prefixed(key);
        let payload = serde_json::to_string(&Envelope {
            value,
            cached_at: Utc::now(),
        })?;

        let mut inner = self.lock();
        match self.ttl {
            Some(ttl) => {
                let _: () = inner.conn.set_ex(&full, payload, ttl)?;
            }
            None => {
                let _: () = inner.conn.set(&full, payload)?;
            }
        }

        // Local FIFO bookkeeping mirrors the bounded local backends
        inner.key_list.retain(|k| k != &full);
        inner.key_list.push(full);
        while inner.key_list.len() > self.max_keys {
            let oldest = inner.key_list.remove(0);
            let _: usize = inner.conn.del(&oldest)?;
            inner.counters.record_eviction();
            debug!(key = %oldest, "evicted oldest-inserted redis entry");
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<V>> {
        let full = Self::prefixed(key);
        let mut inner = self.lock();
        match Self::fetch_envelope(&mut inner.conn, &full)? {
            Some(envelope) => {
                inner.counters.record_hit();
                Ok(Some(envelope.value))
            }
            None => {
                inner.counters.record_miss();
                Ok(None)
            }
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let full = Self::prefixed(key);
        let mut inner = self.lock();
        let found: bool = inner.conn.exists(&full)?;
        Ok(found)
    }

    fn len(&self) -> Result<usize> {
        let mut inner = self.lock();
        let keys: Vec<String> = inner.conn.keys(format!("{KEY_PREFIX}*"))?;
        Ok(keys.len())
    }

    fn list_cached_keys(&self) -> Result<Vec<CacheInfo>> {
        let mut inner = self.lock();
        // Only keys the server still considers live; expired ones are gone
        let keys: Vec<String> = inner.conn.keys(format!("{KEY_PREFIX}*"))?;
        let mut infos = Vec::with_capacity(keys.len());
        for full in &keys {
            if let Some(envelope) = Self::fetch_envelope(&mut inner.conn, full)? {
                infos.push(CacheInfo::new(Self::unprefixed(full), envelope.cached_at));
            }
        }
        Ok(infos)
    }

    fn get_cache_info(&self, key: &str) -> Result<Option<CacheInfo>> {
        let full = Self::prefixed(key);
        let mut inner = self.lock();
        Ok(Self::fetch_envelope(&mut inner.conn, &full)?
            .map(|envelope| CacheInfo::new(key, envelope.cached_at)))
    }

    fn invalidate_keys(&self, keys: &[String]) -> Result<usize> {
        let full_keys: Vec<String> = keys.iter().map(|k| Self::prefixed(k)).collect();
        let mut inner = self.lock();
        Self::delete_keys(&mut inner, &full_keys)
    }

    fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        let mut inner = self.lock();
        let keys: Vec<String> = inner.conn.keys(format!("{KEY_PREFIX}*"))?;
        let matching: Vec<String> = keys
            .into_iter()
            .filter(|full| glob_match(pattern, Self::unprefixed(full)))
            .collect();
        Self::delete_keys(&mut inner, &matching)
    }

    fn invalidate_all(&self) -> Result<usize> {
        self.purge()
    }

    fn stats(&self) -> Result<BackendStats> {
        let infos = self.list_cached_keys()?;
        let inner = self.lock();
        Ok(build_stats("RedisCache", &infos, self.max_keys, &inner.counters))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RedisConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 12);
        assert_eq!(config.max_keys, DEFAULT_MAX_KEYS);
        assert!(config.ttl.is_none());
        assert_eq!(config.url(), "redis://localhost:6379/12");
    }

    #[test]
    fn test_config_url_with_extras() {
        let mut config = RedisConfig {
            host: "redis.example.com".to_string(),
            port: 6380,
            db: 5,
            ..RedisConfig::default()
        };
        config
            .extra
            .insert("connect_timeout".to_string(), "5".to_string());
        config.extra.insert("client_name".to_string(), "gitframe".to_string());

        // Extras render sorted, verbatim
        assert_eq!(
            config.url(),
            "redis://redis.example.com:6380/5?client_name=gitframe&connect_timeout=5"
        );
    }

    #[test]
    fn test_prefix_round_trip() {
        let full = RedisCache::<u64>::prefixed("commit_history|repo1|None");
        assert_eq!(full, "gitframe_commit_history|repo1|None");
        assert_eq!(RedisCache::<u64>::unprefixed(&full), "commit_history|repo1|None");
    }

    // Server-backed tests; run with a local redis via
    // `cargo test --features redis -- --ignored`
    #[test]
    #[ignore = "requires a running redis server"]
    fn test_round_trip_against_server() {
        let cache: RedisCache<String> = RedisCache::new(RedisConfig::default()).unwrap();
        cache.purge().unwrap();

        cache.set("it_key", "it_value".to_string()).unwrap();
        assert_eq!(cache.get("it_key").unwrap(), Some("it_value".to_string()));
        assert!(cache.exists("it_key").unwrap());

        let info = cache.get_cache_info("it_key").unwrap().unwrap();
        assert!(info.age_seconds < 60.0);

        cache.purge().unwrap();
    }

    #[test]
    #[ignore = "requires a running redis server"]
    fn test_ttl_applied_at_write() {
        let config = RedisConfig {
            ttl: Some(1),
            ..RedisConfig::default()
        };
        let cache: RedisCache<u64> = RedisCache::new(config).unwrap();
        cache.purge().unwrap();

        cache.set("expiring", 7).unwrap();
        assert!(cache.exists("expiring").unwrap());

        std::thread::sleep(std::time::Duration::from_millis(1500));

        // The server expired it; listings no longer see it
        assert!(!cache.exists("expiring").unwrap());
        assert!(cache.list_cached_keys().unwrap().is_empty());
    }
}
