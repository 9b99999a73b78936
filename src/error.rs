//! Error types for the caching layer
//!
//! Provides unified error handling using thiserror. A cache miss is never an
//! error: backends report it as `Ok(None)` and callers treat it as a
//! first-class outcome.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache backend operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Snapshot or other backend I/O failed
    #[error("cache i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing or deserializing a stored entry failed
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote key-value service reported an error
    #[cfg(feature = "redis")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Invalid arguments to a cache operation
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Crate-Level Error ==
/// Error type for the repository/project surface.
///
/// Wraps cache failures alongside failures of the external extraction
/// source, so decorated methods can propagate either with `?`.
#[derive(Error, Debug)]
pub enum Error {
    /// A cache backend operation failed
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The underlying extraction source failed
    #[error("source error: {0}")]
    Source(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Builds a source error from a plain message.
    pub fn source_msg(msg: impl Into<String>) -> Self {
        Error::Source(msg.into().into())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::InvalidRequest("both keys and pattern given".to_string());
        assert_eq!(
            err.to_string(),
            "invalid request: both keys and pattern given"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CacheError = io.into();
        assert!(matches!(err, CacheError::Io(_)));
    }

    #[test]
    fn test_source_error_from_message() {
        let err = Error::source_msg("git log failed");
        assert_eq!(err.to_string(), "source error: git log failed");
    }

    #[test]
    fn test_cache_error_wraps_into_crate_error() {
        let err: Error = CacheError::InvalidRequest("bad".to_string()).into();
        assert!(matches!(err, Error::Cache(_)));
    }
}
