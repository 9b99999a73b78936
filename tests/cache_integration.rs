//! Integration tests for the cache backends: durability across instances,
//! snapshot compatibility, owner isolation on shared backends and
//! behavior under concurrent writers.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use gitframe::cache::{CacheBackend, DiskCache, EphemeralCache, SharedBackend};
use gitframe::Repository;

use common::{init_tracing, StubSource};

// == Bounded Eviction ==
#[test]
fn ephemeral_evicts_oldest_insertion_at_bound() {
    init_tracing();
    let cache = EphemeralCache::new(2);

    cache.set("a", 1u64).unwrap();
    cache.set("b", 2u64).unwrap();
    cache.set("c", 3u64).unwrap();

    assert!(!cache.exists("a").unwrap());
    assert_eq!(cache.get("b").unwrap(), Some(2));
    assert_eq!(cache.get("c").unwrap(), Some(3));
}

// == Snapshot Durability ==
#[test]
fn disk_cache_survives_instance_teardown() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("analytics_cache.json.gz");

    let written: Vec<(String, String)> = (0..20)
        .map(|i| (format!("key_{i}"), format!("value_{i}")))
        .collect();

    {
        let cache: DiskCache<String> = DiskCache::new(&path);
        for (key, value) in &written {
            cache.set(key, value.clone())?;
        }
    }

    let reloaded: DiskCache<String> = DiskCache::new(&path);
    assert_eq!(reloaded.len()?, written.len());
    for (key, value) in &written {
        assert!(reloaded.exists(key)?, "{key} lost across restart");
        assert_eq!(reloaded.get(key)?.as_deref(), Some(value.as_str()));
    }
    Ok(())
}

#[test]
fn repository_hits_cache_populated_by_previous_instance() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repo_cache.json.gz");

    // First instance computes and persists
    {
        let cache: SharedBackend<String> = Arc::new(DiskCache::new(&path));
        let repo = Repository::with_cache("repo1", StubSource::new(), cache);
        repo.blame(Some("abc123"), None).unwrap();
    }

    // Second instance, fresh source: the persisted entry answers without
    // touching the source at all
    let cache: SharedBackend<String> = Arc::new(DiskCache::new(&path));
    let source = StubSource::new();
    let counter = source.counter();
    let repo = Repository::with_cache("repo1", source, cache);

    let frame = repo.blame(Some("abc123"), None).unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert!(frame.starts_with("blame(abc123)"));
}

// == Owner Isolation ==
#[test]
fn clearing_one_owner_leaves_the_other_untouched() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cache: SharedBackend<String> =
        Arc::new(DiskCache::new(dir.path().join("shared.json.gz")));

    let repo1 = Repository::with_cache("repo1", StubSource::new(), Arc::clone(&cache));
    let repo2 = Repository::with_cache("repo2", StubSource::new(), Arc::clone(&cache));

    repo1.commit_history(Some("main"), Some(10), None)?;
    repo1.branches()?;
    repo2.commit_history(Some("main"), Some(10), None)?;
    repo2.branches()?;
    assert_eq!(cache.len()?, 4);

    let removed = repo1.invalidate_cache(None, None)?;
    assert_eq!(removed, 2);

    for info in repo2.list_owned_keys()? {
        assert!(
            cache.exists(&info.key)?,
            "repo2 entry {} was clobbered by repo1's invalidation",
            info.key
        );
    }
    assert_eq!(repo2.list_owned_keys()?.len(), 2);
    Ok(())
}

// == Concurrent Writers ==
#[test]
fn concurrent_writers_leave_snapshot_consistent() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contended.json.gz");
    let cache: Arc<DiskCache<String>> = Arc::new(DiskCache::with_max_keys(&path, 500));

    let mut handles = Vec::new();
    for t in 0..8usize {
        let cache = Arc::clone(&cache);
        handles.push(std::thread::spawn(move || {
            for i in 0..25usize {
                cache
                    .set(&format!("writer{t}|key{i}"), format!("value:{t}:{i}"))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len().unwrap(), 200);

    // The on-disk table parses and matches the winning in-memory state
    let reloaded: DiskCache<String> = DiskCache::with_max_keys(&path, 500);
    assert_eq!(reloaded.len().unwrap(), 200);
    for t in 0..8usize {
        for i in 0..25usize {
            assert_eq!(
                reloaded.get(&format!("writer{t}|key{i}")).unwrap(),
                Some(format!("value:{t}:{i}"))
            );
        }
    }
}

#[test]
fn concurrent_readers_through_one_repository() {
    init_tracing();
    let cache: SharedBackend<String> = Arc::new(EphemeralCache::new(100));
    let source = StubSource::new();
    let counter = source.counter();
    let repo = Arc::new(Repository::with_cache("repo1", source, cache));

    // Warm once, then hammer the same key from many threads
    repo.commit_history(Some("main"), Some(50), None).unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = Arc::clone(&repo);
        handles.push(std::thread::spawn(move || {
            for _ in 0..20 {
                repo.commit_history(Some("main"), Some(50), None).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Every call after the first was a hit
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

// == Cache Info Surfaces ==
#[test]
fn listed_metadata_reflects_live_entries() {
    init_tracing();
    let cache: SharedBackend<String> = Arc::new(EphemeralCache::new(100));
    let repo = Repository::with_cache("repo1", StubSource::new(), Arc::clone(&cache));

    repo.branches().unwrap();
    repo.tags().unwrap();

    let infos = cache.list_cached_keys().unwrap();
    assert_eq!(infos.len(), 2);
    for info in &infos {
        assert!(info.age_seconds >= 0.0);
        assert!(info.age_seconds < 60.0);
        assert!((info.age_minutes - info.age_seconds / 60.0).abs() < 1e-9);
        let fetched = cache.get_cache_info(&info.key).unwrap().unwrap();
        assert_eq!(fetched.cached_at, info.cached_at);
    }
}
