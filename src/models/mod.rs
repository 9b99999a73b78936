//! Models Module
//!
//! Serializable result shapes returned by the cache management surface.

mod reports;

pub use reports::{
    BulkWarmResult, BulkWarmSummary, CacheStatsReport, ProjectCacheStats,
    ProjectInvalidationReport, WarmCacheResult,
};
