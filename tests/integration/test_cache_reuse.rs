//! Cache-first loading: reuse, invalidation, and scope keys

use crate::common::{self, folder, temp_cache};
use gcpath::{CACHE_VERSION, CacheMiss, Hierarchy, HierarchyCache, LoadMode, LoadRequest};
use serde_json::Value;
use std::time::Duration;

fn rewrite_entry(cache: &HierarchyCache, edit: impl FnOnce(&mut Value)) {
    let raw = std::fs::read(cache.path()).expect("cache file exists");
    let mut entry: Value = serde_json::from_slice(&raw).expect("cache file is JSON");
    edit(&mut entry);
    std::fs::write(cache.path(), serde_json::to_vec(&entry).unwrap()).unwrap();
}

#[test]
fn second_load_makes_no_upstream_calls() {
    for mode in [LoadMode::Bulk, LoadMode::Iterative] {
        let (cache, _dir) = temp_cache(None);
        let cloud = common::cloud();
        let request = LoadRequest::new(mode);

        let first = Hierarchy::load(&request, &cloud, Some(&cache)).unwrap();
        let calls = cloud.calls().total();
        assert!(calls > 0);
        assert!(cache.exists());

        let second = Hierarchy::load(&request, &cloud, Some(&cache)).unwrap();
        assert_eq!(cloud.calls().total(), calls, "{mode:?} load hit the network");
        assert_eq!(first, second);
        assert_eq!(first.entries().unwrap(), second.entries().unwrap());
    }
}

#[test]
fn forced_refresh_reloads_and_rewrites() {
    let (cache, _dir) = temp_cache(None);
    let cloud = common::cloud();
    let request = LoadRequest::default();

    Hierarchy::load(&request, &cloud, Some(&cache)).unwrap();
    let calls = cloud.calls().total();

    let refreshed = request.clone().force_refresh(true);
    Hierarchy::load(&refreshed, &cloud, Some(&cache)).unwrap();
    assert!(cloud.calls().total() > calls);

    // The refreshed entry still serves plain requests
    let after = cloud.calls().total();
    Hierarchy::load(&request, &cloud, Some(&cache)).unwrap();
    assert_eq!(cloud.calls().total(), after);
}

#[test]
fn previous_cache_version_is_a_miss() {
    let (cache, _dir) = temp_cache(None);
    let cloud = common::cloud();
    let request = LoadRequest::default();

    Hierarchy::load(&request, &cloud, Some(&cache)).unwrap();
    rewrite_entry(&cache, |entry| {
        entry["version"] = Value::from(CACHE_VERSION - 1);
    });

    match cache.lookup(&request.cache_key()) {
        Err(CacheMiss::VersionMismatch { found, expected }) => {
            assert_eq!(found, CACHE_VERSION - 1);
            assert_eq!(expected, CACHE_VERSION);
        }
        other => panic!("expected a version mismatch, got {other:?}"),
    }

    let calls = cloud.calls().total();
    Hierarchy::load(&request, &cloud, Some(&cache)).unwrap();
    assert!(cloud.calls().total() > calls);
    assert_eq!(cache.load_entry().unwrap().version, CACHE_VERSION);
}

#[test]
fn expired_entries_are_reloaded() {
    let (cache, _dir) = temp_cache(Some(Duration::from_secs(3600)));
    let cloud = common::cloud();
    let request = LoadRequest::default();

    Hierarchy::load(&request, &cloud, Some(&cache)).unwrap();
    rewrite_entry(&cache, |entry| {
        entry["createdAt"] = Value::from("2020-01-01T00:00:00Z");
    });
    assert!(matches!(
        cache.lookup(&request.cache_key()),
        Err(CacheMiss::Expired { .. })
    ));

    let calls = cloud.calls().total();
    Hierarchy::load(&request, &cloud, Some(&cache)).unwrap();
    assert!(cloud.calls().total() > calls);
    assert!(cache.info().fresh);
}

#[test]
fn corrupt_cache_falls_through_to_upstream() {
    let (cache, _dir) = temp_cache(None);
    std::fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
    std::fs::write(cache.path(), b"{ not json").unwrap();

    let cloud = common::cloud();
    let hierarchy = Hierarchy::load(&LoadRequest::default(), &cloud, Some(&cache)).unwrap();
    assert!(hierarchy.contains(&folder(1)));
    assert!(cache.load_entry().is_ok());
}

#[test]
fn cache_write_failure_does_not_fail_the_load() {
    let (_, dir) = temp_cache(None);
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let cache = HierarchyCache::new(blocker.join("cache.json"), None);

    let cloud = common::cloud();
    let hierarchy = Hierarchy::load(&LoadRequest::default(), &cloud, Some(&cache)).unwrap();
    let uncached = Hierarchy::fetch(&LoadRequest::default(), &common::cloud()).unwrap();

    assert_eq!(hierarchy, uncached);
    assert!(hierarchy.contains(&folder(1)));
    assert!(!cache.exists());
}

#[test]
fn scoped_entry_is_never_served_to_a_full_request() {
    let (cache, _dir) = temp_cache(None);
    let cloud = common::cloud();

    let scoped = LoadRequest::default().with_target(folder(3));
    let partial = Hierarchy::load(&scoped, &cloud, Some(&cache)).unwrap();
    assert!(!partial.contains(&folder(5)));

    let full = Hierarchy::load(&LoadRequest::default(), &cloud, Some(&cache)).unwrap();
    assert!(full.contains(&folder(5)));
    assert!(full.counts().total() > partial.counts().total());

    let scope = cache.info().scope.expect("entry has a scope");
    assert_eq!(scope, LoadRequest::default().cache_key());
    assert_eq!(scope.to_string(), "bulk load of all organizations");
}

#[test]
fn info_and_clear() {
    let (cache, _dir) = temp_cache(None);
    assert!(!cache.info().exists);
    assert!(!cache.clear().unwrap());

    let cloud = common::cloud();
    let hierarchy = Hierarchy::load(&LoadRequest::default(), &cloud, Some(&cache)).unwrap();

    let info = cache.info();
    assert!(info.exists);
    assert_eq!(info.version, Some(CACHE_VERSION));
    assert_eq!(info.folders, Some(hierarchy.counts().folders));
    assert_eq!(info.projects, Some(hierarchy.counts().projects));
    assert!(info.problem.is_none());

    assert!(cache.clear().unwrap());
    assert!(!cache.exists());
}

#[test]
fn loading_without_a_cache_always_fetches() {
    let cloud = common::cloud();
    Hierarchy::load(&LoadRequest::default(), &cloud, None).unwrap();
    let calls = cloud.calls().total();
    Hierarchy::load(&LoadRequest::default(), &cloud, None).unwrap();
    assert_eq!(cloud.calls().total(), calls * 2);
}
