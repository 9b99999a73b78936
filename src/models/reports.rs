//! Report Shapes
//!
//! Management operations return structured summaries rather than raising,
//! so batch callers can inspect partial success without error-handling
//! boilerplate. Field names are stable; downstream tooling serializes
//! these reports as JSON.

use serde::Serialize;

use crate::cache::stats::BackendStats;

// == Warm Cache Result ==
/// Outcome of warming one repository's cache.
///
/// Per-method failures are isolated: one failing method never aborts the
/// others. `success` is true only when no method failed.
#[derive(Debug, Clone, Serialize)]
pub struct WarmCacheResult {
    /// True when every requested method executed without error
    pub success: bool,
    /// Methods that executed successfully, in invocation order
    pub methods_executed: Vec<String>,
    /// Methods that failed or were not recognized
    pub methods_failed: Vec<String>,
    /// Net cache entries created by this warm pass
    pub cache_entries_created: usize,
    /// Wall-clock seconds the warm pass took
    pub execution_time: f64,
    /// One message per failed method
    pub errors: Vec<String>,
}

// == Cache Stats Report ==
/// One repository's view of the cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsReport {
    /// Repository name
    pub repository: String,
    /// Backend implementation name, None when caching is disabled
    pub cache_backend: Option<&'static str>,
    /// Number of live entries owned by this repository
    pub owned_entries: usize,
    /// Backend-wide statistics, where the backend could report them
    pub global_cache_stats: Option<BackendStats>,
}

// == Bulk Warm Summary ==
/// Aggregated counts for a bulk warm pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkWarmSummary {
    /// Repositories whose warm pass fully succeeded
    pub warm_successful: usize,
    /// Repositories with at least one failed method
    pub warm_failed: usize,
    /// Net cache entries created across all repositories
    pub cache_entries_created: usize,
}

// == Bulk Warm Result ==
/// Outcome of warming a whole project, possibly in parallel.
///
/// Per-repository results may complete in any order; the aggregation
/// never depends on completion order.
#[derive(Debug, Clone, Serialize)]
pub struct BulkWarmResult {
    /// True when every repository's warm pass succeeded
    pub success: bool,
    /// Number of repositories processed
    pub items_processed: usize,
    /// (repository name, warm outcome) pairs
    pub per_item_results: Vec<(String, WarmCacheResult)>,
    /// Wall-clock seconds for the whole batch
    pub execution_time: f64,
    /// Aggregated counts
    pub summary: BulkWarmSummary,
}

// == Project Cache Stats ==
/// Project-wide cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectCacheStats {
    /// Repositories in the project
    pub total_repositories: usize,
    /// Repositories with a cache backend configured
    pub repositories_with_cache: usize,
    /// repositories_with_cache / total_repositories, as a percentage
    pub cache_coverage_percent: f64,
    /// Distinct backend implementation names in use
    pub cache_backends: Vec<&'static str>,
    /// Backend-wide statistics from the first configured backend
    pub global_cache_stats: Option<BackendStats>,
}

// == Project Invalidation Report ==
/// Outcome of a project-wide invalidation.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectInvalidationReport {
    /// Repositories the invalidation was applied to
    pub repositories_processed: usize,
    /// (repository name, entries removed) pairs
    pub repository_results: Vec<(String, usize)>,
    /// Total entries removed across the project
    pub total_invalidated: usize,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warm_result_serializes_with_stable_field_names() {
        let result = WarmCacheResult {
            success: false,
            methods_executed: vec!["branches".to_string()],
            methods_failed: vec!["blame".to_string()],
            cache_entries_created: 1,
            execution_time: 0.25,
            errors: vec!["Method 'blame' failed: boom".to_string()],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["methods_executed"][0], "branches");
        assert_eq!(json["methods_failed"][0], "blame");
        assert_eq!(json["cache_entries_created"], 1);
        assert!(json["execution_time"].is_number());
        assert!(json["errors"][0].as_str().unwrap().contains("blame"));
    }

    #[test]
    fn test_bulk_result_serializes() {
        let result = BulkWarmResult {
            success: true,
            items_processed: 0,
            per_item_results: Vec::new(),
            execution_time: 0.0,
            summary: BulkWarmSummary::default(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["items_processed"], 0);
        assert_eq!(json["summary"]["warm_successful"], 0);
        assert!(json["per_item_results"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_stats_report_without_backend() {
        let report = CacheStatsReport {
            repository: "repo1".to_string(),
            cache_backend: None,
            owned_entries: 0,
            global_cache_stats: None,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["repository"], "repo1");
        assert!(json["cache_backend"].is_null());
        assert!(json["global_cache_stats"].is_null());
    }
}
