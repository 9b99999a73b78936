//! Project Module
//!
//! A collection of repositories analyzed together, usually sharing one
//! cache backend. The bulk warm operation fans out across repositories
//! with a rayon worker pool when asked to; repositories are independent
//! units of work, so per-repository failures are isolated and the
//! aggregation tolerates arbitrary completion order.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{CacheError, Error};
use crate::models::{
    BulkWarmResult, BulkWarmSummary, ProjectCacheStats, ProjectInvalidationReport, WarmCacheResult,
};
use crate::repo::{Repository, WarmOptions};
use crate::source::MetricsSource;

// == Bulk Warm Options ==
/// Options for a project-wide warm pass.
#[derive(Debug, Clone, Default)]
pub struct BulkWarmOptions {
    /// Methods to warm; the standard set when None
    pub methods: Option<Vec<String>>,
    /// Arguments forwarded to each repository's warm pass
    pub warm: WarmOptions,
    /// Fan out across repositories with a worker pool
    pub parallel: bool,
}

// == Project ==
/// A set of repositories managed as one unit.
pub struct Project<S: MetricsSource> {
    repositories: Vec<Repository<S>>,
}

impl<S: MetricsSource> Project<S> {
    // == Constructors ==
    /// Creates an empty project.
    pub fn new() -> Self {
        Self {
            repositories: Vec::new(),
        }
    }

    /// Creates a project from existing repositories.
    pub fn from_repositories(repositories: Vec<Repository<S>>) -> Self {
        Self { repositories }
    }

    /// Adds a repository.
    pub fn add_repository(&mut self, repository: Repository<S>) {
        self.repositories.push(repository);
    }

    /// The repositories in this project.
    pub fn repositories(&self) -> &[Repository<S>] {
        &self.repositories
    }

    // == Bulk Warm ==
    /// Warms every repository's cache.
    ///
    /// With `parallel` set the repositories are processed by a rayon
    /// worker pool; they share no mutable state beyond the backend itself,
    /// which synchronizes internally. One repository's failure never
    /// aborts the batch; the outcome is a structured summary.
    pub fn bulk_warm(&self, options: &BulkWarmOptions) -> BulkWarmResult {
        let started = Instant::now();

        let method_refs: Option<Vec<&str>> = options
            .methods
            .as_ref()
            .map(|methods| methods.iter().map(String::as_str).collect());

        let warm_repo = |repo: &Repository<S>| -> (String, WarmCacheResult) {
            let result = repo.warm_cache(method_refs.as_deref(), &options.warm);
            (repo.name().to_string(), result)
        };

        let per_item_results: Vec<(String, WarmCacheResult)> = if options.parallel {
            self.repositories.par_iter().map(warm_repo).collect()
        } else {
            self.repositories.iter().map(warm_repo).collect()
        };

        let mut summary = BulkWarmSummary::default();
        for (_, result) in &per_item_results {
            if result.success {
                summary.warm_successful += 1;
            } else {
                summary.warm_failed += 1;
            }
            summary.cache_entries_created += result.cache_entries_created;
        }

        let result = BulkWarmResult {
            success: summary.warm_failed == 0,
            items_processed: per_item_results.len(),
            per_item_results,
            execution_time: started.elapsed().as_secs_f64(),
            summary,
        };
        info!(
            repositories = result.items_processed,
            failed = result.summary.warm_failed,
            entries = result.summary.cache_entries_created,
            parallel = options.parallel,
            "bulk warm finished"
        );
        result
    }

    // == Project Stats ==
    /// Project-wide cache statistics. Global stats come from the first
    /// repository with a backend (projects typically share one).
    pub fn get_cache_stats(&self) -> ProjectCacheStats {
        let total_repositories = self.repositories.len();
        let with_cache: Vec<&Repository<S>> = self
            .repositories
            .iter()
            .filter(|repo| repo.cache_backend().is_some())
            .collect();

        let mut cache_backends: Vec<&'static str> = with_cache
            .iter()
            .filter_map(|repo| repo.cache_backend().map(|backend| backend.name()))
            .collect();
        cache_backends.sort_unstable();
        cache_backends.dedup();

        let global_cache_stats = with_cache.first().and_then(|repo| {
            repo.cache_backend().and_then(|backend| match backend.stats() {
                Ok(stats) => Some(stats),
                Err(err) => {
                    warn!(error = %err, "backend stats failed");
                    None
                }
            })
        });

        ProjectCacheStats {
            total_repositories,
            repositories_with_cache: with_cache.len(),
            cache_coverage_percent: if total_repositories == 0 {
                0.0
            } else {
                with_cache.len() as f64 / total_repositories as f64 * 100.0
            },
            cache_backends,
            global_cache_stats,
        }
    }

    // == Project Invalidation ==
    /// Invalidates cache entries across the project, each repository
    /// scoped to its own keys.
    ///
    /// `repositories` restricts the operation to the named repositories;
    /// `methods`/`pattern` are forwarded to each repository and follow the
    /// same rules as [`Repository::invalidate_cache`] (both at once is
    /// rejected). A repository whose backend fails is recorded with zero
    /// removals and does not abort the others.
    pub fn invalidate_cache(
        &self,
        repositories: Option<&[&str]>,
        methods: Option<&[&str]>,
        pattern: Option<&str>,
    ) -> Result<ProjectInvalidationReport, Error> {
        if methods.is_some() && pattern.is_some() {
            return Err(CacheError::InvalidRequest(
                "invalidate_cache accepts methods or a pattern, not both".to_string(),
            )
            .into());
        }

        let selected: Vec<&Repository<S>> = self
            .repositories
            .iter()
            .filter(|repo| match repositories {
                Some(names) => names.contains(&repo.name()),
                None => true,
            })
            .collect();

        let mut repository_results = Vec::with_capacity(selected.len());
        let mut total_invalidated = 0usize;
        for repo in &selected {
            let removed = match repo.invalidate_cache(methods, pattern) {
                Ok(removed) => removed,
                Err(err) => {
                    warn!(repository = %repo.name(), error = %err, "invalidation failed");
                    0
                }
            };
            total_invalidated += removed;
            repository_results.push((repo.name().to_string(), removed));
        }

        Ok(ProjectInvalidationReport {
            repositories_processed: selected.len(),
            repository_results,
            total_invalidated,
        })
    }
}

impl<S: MetricsSource> Default for Project<S> {
    fn default() -> Self {
        Self::new()
    }
}
