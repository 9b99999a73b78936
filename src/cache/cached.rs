//! Cached-Call Module
//!
//! The check-miss-compute-store wrapper applied to every expensive
//! extraction method. It is a plain higher-order function: the caller
//! derives the key (from the method name, owner identity and declared
//! arguments) and passes the underlying computation as a closure.

use tracing::debug;

use crate::cache::backend::CacheBackend;
use crate::error::CacheError;

// == Cached ==
/// Runs `compute` through the cache.
///
/// - With no backend, or with `key == None` (the caller's skip predicate
///   fired), `compute` runs directly and nothing is stored.
/// - On a hit the stored value is returned and `compute` never runs.
/// - On a miss `compute` runs, its result is stored under the key, and the
///   result is returned.
///
/// Arguments the caller left out of the key are invisible here: two calls
/// differing only in an undeclared argument share one cache entry. It is
/// the integrator's job to declare every argument that affects the result.
pub fn cached<V, F, E>(
    backend: Option<&dyn CacheBackend<V>>,
    key: Option<String>,
    compute: F,
) -> std::result::Result<V, E>
where
    V: Clone,
    F: FnOnce() -> std::result::Result<V, E>,
    E: From<CacheError>,
{
    let (backend, key) = match (backend, key) {
        (Some(backend), Some(key)) => (backend, key),
        _ => return compute(),
    };

    if let Some(value) = backend.get(&key).map_err(E::from)? {
        debug!(key = %key, "cache hit");
        return Ok(value);
    }

    debug!(key = %key, "cache miss, computing");
    let value = compute()?;
    backend.set(&key, value.clone()).map_err(E::from)?;
    Ok(value)
}
