//! Shared fixtures for the integration suites.

// Each integration binary compiles this module separately and uses a
// different subset of it.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gitframe::error::Error;
use gitframe::source::MetricsSource;

/// Installs the test log subscriber once; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gitframe=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Extraction stub whose frames embed a call counter, so a cache hit is
/// distinguishable from a recomputation even across repository instances.
pub struct StubSource {
    pub calls: Arc<AtomicUsize>,
    failing_method: Option<&'static str>,
}

impl StubSource {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            failing_method: None,
        }
    }

    /// A stub whose named method always fails.
    pub fn failing(method: &'static str) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            failing_method: Some(method),
        }
    }

    /// Handle onto the call counter, valid after the source moves into a
    /// repository.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn produce(&self, method: &str, detail: String) -> Result<String, Error> {
        if self.failing_method == Some(method) {
            return Err(Error::source_msg(format!("{method} extraction failed")));
        }
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{method}({detail}):frame#{n}"))
    }
}

impl MetricsSource for StubSource {
    type Frame = String;

    fn commit_history(
        &self,
        branch: Option<&str>,
        limit: Option<usize>,
        _ignore_globs: Option<&[String]>,
    ) -> Result<String, Error> {
        self.produce(
            "commit_history",
            format!("{}:{:?}", branch.unwrap_or("default"), limit),
        )
    }

    fn branches(&self) -> Result<String, Error> {
        self.produce("branches", String::new())
    }

    fn tags(&self) -> Result<String, Error> {
        self.produce("tags", String::new())
    }

    fn blame(&self, rev: &str, _ignore_globs: Option<&[String]>) -> Result<String, Error> {
        self.produce("blame", rev.to_string())
    }

    fn file_detail(&self, rev: &str) -> Result<String, Error> {
        self.produce("file_detail", rev.to_string())
    }

    fn list_files(&self, directory: Option<&str>) -> Result<String, Error> {
        self.produce("list_files", directory.unwrap_or("").to_string())
    }
}
