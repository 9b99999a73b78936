//! Metrics Source Module
//!
//! The thin interface to the underlying version-control extraction
//! engine. Implementations run the actual commit/blame/branch queries and
//! return an opaque tabular payload; this crate only moves those payloads
//! in and out of the cache. The operations mirror the standard analytic
//! set the repository surface exposes.

use crate::error::Error;

// == Metrics Source Trait ==
/// Supplier of repository analytics, consumed by [`crate::repo::Repository`].
///
/// `Frame` is whatever tabular representation the extraction engine
/// produces; the cache treats it as an opaque value.
pub trait MetricsSource: Send + Sync {
    /// The tabular payload type produced by every operation.
    type Frame: Clone + Send + Sync + 'static;

    /// Commit metadata for a branch, newest first, optionally limited and
    /// filtered by ignore globs.
    fn commit_history(
        &self,
        branch: Option<&str>,
        limit: Option<usize>,
        ignore_globs: Option<&[String]>,
    ) -> Result<Self::Frame, Error>;

    /// One row per branch.
    fn branches(&self) -> Result<Self::Frame, Error>;

    /// One row per tag.
    fn tags(&self) -> Result<Self::Frame, Error>;

    /// Line-attribution aggregation at `rev`.
    fn blame(&self, rev: &str, ignore_globs: Option<&[String]>) -> Result<Self::Frame, Error>;

    /// Per-file detail (size, last touch, owner) at `rev`.
    fn file_detail(&self, rev: &str) -> Result<Self::Frame, Error>;

    /// Tracked files, optionally restricted to a directory.
    fn list_files(&self, directory: Option<&str>) -> Result<Self::Frame, Error>;
}
