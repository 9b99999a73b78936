//! Configuration Module
//!
//! Declarative cache construction: which backend, with which recognized
//! options. Values can come from the environment with sensible defaults,
//! the same way the rest of the stack is configured in deployment.

use std::env;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::backend::SharedBackend;
use crate::cache::disk::DiskCache;
use crate::cache::ephemeral::EphemeralCache;
#[cfg(feature = "redis")]
use crate::cache::redis::{RedisCache, RedisConfig};
use crate::cache::DEFAULT_MAX_KEYS;
use crate::error::Result;
use std::sync::Arc;

// == Cache Config ==
/// Backend selection plus its recognized construction parameters.
#[derive(Debug, Clone)]
pub enum CacheConfig {
    /// Bounded in-memory backend
    Ephemeral {
        /// Maximum number of entries
        max_keys: usize,
    },
    /// Snapshot-file backend
    Disk {
        /// Snapshot file path
        filepath: PathBuf,
        /// Maximum number of entries
        max_keys: usize,
    },
    /// Redis-backed backend
    #[cfg(feature = "redis")]
    Redis(RedisConfig),
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::Ephemeral {
            max_keys: DEFAULT_MAX_KEYS,
        }
    }
}

impl CacheConfig {
    /// Loads a configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `GITFRAME_CACHE_BACKEND` - `ephemeral` or `disk` (default: ephemeral;
    ///   `redis` with the feature enabled)
    /// - `GITFRAME_CACHE_MAX_KEYS` - capacity bound (default: 1000)
    /// - `GITFRAME_CACHE_PATH` - snapshot path for the disk backend
    ///   (default: `gitframe_cache.json.gz`)
    /// - `GITFRAME_REDIS_HOST` / `GITFRAME_REDIS_PORT` / `GITFRAME_REDIS_DB`
    ///   / `GITFRAME_REDIS_TTL` - redis connection parameters
    pub fn from_env() -> Self {
        let max_keys = env::var("GITFRAME_CACHE_MAX_KEYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_KEYS);

        let backend = env::var("GITFRAME_CACHE_BACKEND").unwrap_or_default();
        match backend.as_str() {
            "disk" => Self::Disk {
                filepath: env::var("GITFRAME_CACHE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("gitframe_cache.json.gz")),
                max_keys,
            },
            #[cfg(feature = "redis")]
            "redis" => {
                let mut config = RedisConfig {
                    max_keys,
                    ..RedisConfig::default()
                };
                if let Ok(host) = env::var("GITFRAME_REDIS_HOST") {
                    config.host = host;
                }
                if let Some(port) = env::var("GITFRAME_REDIS_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                {
                    config.port = port;
                }
                if let Some(db) = env::var("GITFRAME_REDIS_DB")
                    .ok()
                    .and_then(|v| v.parse().ok())
                {
                    config.db = db;
                }
                config.ttl = env::var("GITFRAME_REDIS_TTL")
                    .ok()
                    .and_then(|v| v.parse().ok());
                Self::Redis(config)
            }
            _ => Self::Ephemeral { max_keys },
        }
    }

    // == Build ==
    /// Constructs the configured backend behind the shared contract.
    pub fn build<V>(&self) -> Result<SharedBackend<V>>
    where
        V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
    {
        match self {
            Self::Ephemeral { max_keys } => Ok(Arc::new(EphemeralCache::new(*max_keys))),
            Self::Disk { filepath, max_keys } => {
                Ok(Arc::new(DiskCache::with_max_keys(filepath, *max_keys)))
            }
            #[cfg(feature = "redis")]
            Self::Redis(config) => Ok(Arc::new(RedisCache::new(config.clone())?)),
        }
    }
}
