//! Repository Module
//!
//! The owner surface: one `Repository` pairs an extraction source with an
//! optional shared cache backend. Every analytic method is wrapped in the
//! check-miss-compute-store decorator with its declared key arguments, and
//! the management surface (stats, invalidation, warming) operates strictly
//! on this repository's own keys, so several repositories can share one
//! physical backend without stepping on each other.

pub mod project;

use std::time::Instant;

use tracing::{info, warn};

use crate::cache::backend::{CacheBackend, SharedBackend};
use crate::cache::cached::cached;
use crate::cache::entry::CacheInfo;
use crate::cache::key::{is_owned_by, method_component, CacheKey};
use crate::cache::pattern::glob_match;
use crate::error::{CacheError, Error};
use crate::models::{CacheStatsReport, WarmCacheResult};
use crate::source::MetricsSource;

/// The symbolic revision that always tracks the branch tip. Results for it
/// go stale on every commit, so calls against it bypass the cache.
pub const HEAD_REV: &str = "HEAD";

/// Methods warmed when the caller does not name any.
pub const DEFAULT_WARM_METHODS: &[&str] = &[
    "commit_history",
    "branches",
    "tags",
    "blame",
    "file_detail",
    "list_files",
];

// == Warm Options ==
/// Arguments forwarded to the analytic methods during a warm pass.
#[derive(Debug, Clone)]
pub struct WarmOptions {
    /// Branch for `commit_history`
    pub branch: Option<String>,
    /// Row limit for `commit_history`
    pub limit: Option<usize>,
    /// Revision for `blame` and `file_detail`. Leaving this unset warms
    /// against `HEAD`, which executes but stores nothing.
    pub rev: Option<String>,
    /// Ignore globs for `commit_history` and `blame`
    pub ignore_globs: Option<Vec<String>>,
    /// Directory filter for `list_files`
    pub directory: Option<String>,
}

impl Default for WarmOptions {
    fn default() -> Self {
        Self {
            branch: None,
            limit: Some(100),
            rev: None,
            ignore_globs: None,
            directory: None,
        }
    }
}

// == Repository ==
/// A repository-like owner of cached analytic results.
pub struct Repository<S: MetricsSource> {
    name: String,
    source: S,
    cache: Option<SharedBackend<S::Frame>>,
}

impl<S: MetricsSource> Repository<S> {
    // == Constructors ==
    /// Creates a repository with caching disabled; every call goes straight
    /// to the source.
    pub fn new(name: impl Into<String>, source: S) -> Self {
        Self {
            name: name.into(),
            source,
            cache: None,
        }
    }

    /// Creates a repository backed by `cache`. The backend may be shared
    /// with other repositories; keys are scoped by this repository's name.
    pub fn with_cache(
        name: impl Into<String>,
        source: S,
        cache: SharedBackend<S::Frame>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            cache: Some(cache),
        }
    }

    /// Repository name, the owner component of every derived key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured backend, if any.
    pub fn cache_backend(&self) -> Option<&SharedBackend<S::Frame>> {
        self.cache.as_ref()
    }

    fn backend_ref(&self) -> Option<&dyn CacheBackend<S::Frame>> {
        self.cache.as_deref()
    }

    // == Analytic Methods ==
    /// Commit metadata for a branch, cached by (branch, limit, globs).
    pub fn commit_history(
        &self,
        branch: Option<&str>,
        limit: Option<usize>,
        ignore_globs: Option<&[String]>,
    ) -> Result<S::Frame, Error> {
        let key = CacheKey::new("commit_history", &self.name)
            .opt(branch)
            .opt(limit)
            .sorted_list(ignore_globs)
            .build();
        cached(self.backend_ref(), Some(key), || {
            self.source.commit_history(branch, limit, ignore_globs)
        })
    }

    /// One row per branch.
    pub fn branches(&self) -> Result<S::Frame, Error> {
        let key = CacheKey::new("branches", &self.name).build();
        cached(self.backend_ref(), Some(key), || self.source.branches())
    }

    /// One row per tag.
    pub fn tags(&self) -> Result<S::Frame, Error> {
        let key = CacheKey::new("tags", &self.name).build();
        cached(self.backend_ref(), Some(key), || self.source.tags())
    }

    /// Line-attribution aggregation at `rev` (default `HEAD`).
    ///
    /// Calls against the symbolic `HEAD` bypass the cache: the tip moves,
    /// a stored result would silently go stale.
    pub fn blame(
        &self,
        rev: Option<&str>,
        ignore_globs: Option<&[String]>,
    ) -> Result<S::Frame, Error> {
        let rev = rev.unwrap_or(HEAD_REV);
        let key = (rev != HEAD_REV).then(|| {
            CacheKey::new("blame", &self.name)
                .arg(rev)
                .sorted_list(ignore_globs)
                .build()
        });
        cached(self.backend_ref(), key, || {
            self.source.blame(rev, ignore_globs)
        })
    }

    /// Per-file detail at `rev` (default `HEAD`, which bypasses the cache
    /// for the same reason as [`Repository::blame`]).
    pub fn file_detail(&self, rev: Option<&str>) -> Result<S::Frame, Error> {
        let rev = rev.unwrap_or(HEAD_REV);
        let key = (rev != HEAD_REV)
            .then(|| CacheKey::new("file_detail", &self.name).arg(rev).build());
        cached(self.backend_ref(), key, || self.source.file_detail(rev))
    }

    /// Tracked files, cached by directory filter.
    pub fn list_files(&self, directory: Option<&str>) -> Result<S::Frame, Error> {
        let key = CacheKey::new("list_files", &self.name)
            .opt(directory)
            .build();
        cached(self.backend_ref(), Some(key), || {
            self.source.list_files(directory)
        })
    }

    // == Owned Keys ==
    /// Metadata for every live entry owned by this repository.
    pub fn list_owned_keys(&self) -> Result<Vec<CacheInfo>, Error> {
        match &self.cache {
            None => Ok(Vec::new()),
            Some(backend) => {
                let infos = backend.list_cached_keys()?;
                Ok(infos
                    .into_iter()
                    .filter(|info| is_owned_by(&info.key, &self.name))
                    .collect())
            }
        }
    }

    // == Cache Stats ==
    /// This repository's view of the cache. Backend failures degrade to a
    /// report with the global section missing rather than an error.
    pub fn get_cache_stats(&self) -> CacheStatsReport {
        let Some(backend) = &self.cache else {
            return CacheStatsReport {
                repository: self.name.clone(),
                cache_backend: None,
                owned_entries: 0,
                global_cache_stats: None,
            };
        };

        let owned_entries = match self.list_owned_keys() {
            Ok(infos) => infos.len(),
            Err(err) => {
                warn!(repository = %self.name, error = %err, "owned-key listing failed");
                0
            }
        };
        let global_cache_stats = match backend.stats() {
            Ok(stats) => Some(stats),
            Err(err) => {
                warn!(repository = %self.name, error = %err, "backend stats failed");
                None
            }
        };

        CacheStatsReport {
            repository: self.name.clone(),
            cache_backend: Some(backend.name()),
            owned_entries,
            global_cache_stats,
        }
    }

    // == Invalidate ==
    /// Removes this repository's cache entries, never another owner's.
    ///
    /// With neither selector, every owned entry goes. `methods` restricts
    /// removal to entries created by the named analytic methods; `pattern`
    /// restricts it to owned keys matching a `*`-wildcard glob. Supplying
    /// both is ambiguous and rejected.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_cache(
        &self,
        methods: Option<&[&str]>,
        pattern: Option<&str>,
    ) -> Result<usize, Error> {
        if methods.is_some() && pattern.is_some() {
            return Err(CacheError::InvalidRequest(
                "invalidate_cache accepts methods or a pattern, not both".to_string(),
            )
            .into());
        }

        let Some(backend) = &self.cache else {
            return Ok(0);
        };

        let owned = self.list_owned_keys()?;
        let selected: Vec<String> = owned
            .into_iter()
            .map(|info| info.key)
            .filter(|key| match (methods, pattern) {
                (Some(methods), _) => method_component(key)
                    .map(|m| methods.contains(&m))
                    .unwrap_or(false),
                (_, Some(pattern)) => glob_match(pattern, key),
                (None, None) => true,
            })
            .collect();

        let removed = backend.invalidate_keys(&selected)?;
        Ok(removed)
    }

    // == Warm Cache ==
    /// Invokes the named analytic methods (the standard set by default)
    /// purely to populate the cache.
    ///
    /// Failures are isolated per method and collected; `success` is true
    /// only when nothing failed. With caching disabled the pass is an
    /// immediate success that executes nothing.
    pub fn warm_cache(&self, methods: Option<&[&str]>, options: &WarmOptions) -> WarmCacheResult {
        let started = Instant::now();

        if self.cache.is_none() {
            return WarmCacheResult {
                success: true,
                methods_executed: Vec::new(),
                methods_failed: Vec::new(),
                cache_entries_created: 0,
                execution_time: started.elapsed().as_secs_f64(),
                errors: Vec::new(),
            };
        }

        let entries_before = self.backend_len();
        let methods = methods.unwrap_or(DEFAULT_WARM_METHODS);

        let mut methods_executed = Vec::new();
        let mut methods_failed = Vec::new();
        let mut errors = Vec::new();

        for method in methods {
            match self.warm_one(method, options) {
                Ok(()) => methods_executed.push(method.to_string()),
                Err(message) => {
                    methods_failed.push(method.to_string());
                    errors.push(message);
                }
            }
        }

        let cache_entries_created = self.backend_len().saturating_sub(entries_before);
        let result = WarmCacheResult {
            success: methods_failed.is_empty(),
            methods_executed,
            methods_failed,
            cache_entries_created,
            execution_time: started.elapsed().as_secs_f64(),
            errors,
        };
        info!(
            repository = %self.name,
            executed = result.methods_executed.len(),
            failed = result.methods_failed.len(),
            entries = result.cache_entries_created,
            "cache warm pass finished"
        );
        result
    }

    fn warm_one(&self, method: &str, options: &WarmOptions) -> Result<(), String> {
        let outcome = match method {
            "commit_history" => self
                .commit_history(
                    options.branch.as_deref(),
                    options.limit,
                    options.ignore_globs.as_deref(),
                )
                .map(|_| ()),
            "branches" => self.branches().map(|_| ()),
            "tags" => self.tags().map(|_| ()),
            "blame" => self
                .blame(options.rev.as_deref(), options.ignore_globs.as_deref())
                .map(|_| ()),
            "file_detail" => self.file_detail(options.rev.as_deref()).map(|_| ()),
            "list_files" => self.list_files(options.directory.as_deref()).map(|_| ()),
            other => return Err(format!("Method '{other}' not found")),
        };
        outcome.map_err(|err| format!("Method '{method}' failed: {err}"))
    }

    fn backend_len(&self) -> usize {
        self.cache
            .as_ref()
            .and_then(|backend| backend.len().ok())
            .unwrap_or(0)
    }
}
