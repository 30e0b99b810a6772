//! Settings files driving a load end to end, in an isolated directory

use crate::common;
use gcpath::{Hierarchy, HierarchyCache, LoadMode, LoadRequest, Settings};
use tempfile::TempDir;

#[test]
fn settings_file_selects_loader_and_cache_location() {
    let test_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = test_dir.path().join("settings.toml");
    let cache_path = test_dir.path().join("cache").join("hierarchy.json");

    let settings_toml = format!(
        r#"
[loader]
mode = "iterative"

[cache]
path = "{}"
ttl_hours = 1
"#,
        cache_path.display().to_string().replace('\\', "\\\\")
    );
    std::fs::write(&config_path, settings_toml).expect("Should write settings file");

    let settings = Settings::load_from(&config_path).unwrap();
    let cache = HierarchyCache::from_config(&settings.cache).expect("cache is enabled");
    assert_eq!(cache.path(), cache_path.as_path());

    let request = LoadRequest::from_settings(&settings);
    assert_eq!(request.mode, LoadMode::Iterative);

    let cloud = common::cloud();
    Hierarchy::load(&request, &cloud, Some(&cache)).unwrap();
    assert!(cache_path.exists(), "cache written to the configured path");

    let entry = cache.load_entry().unwrap();
    assert_eq!(entry.scope.mode, LoadMode::Iterative);
    // Iterative loads never touch the Asset API
    assert_eq!(
        cloud
            .calls()
            .query_assets
            .load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}

#[test]
fn disabled_cache_yields_no_cache() {
    let test_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = test_dir.path().join("settings.toml");
    std::fs::write(&config_path, "[cache]\nenabled = false\n").unwrap();

    let settings = Settings::load_from(&config_path).unwrap();
    assert!(HierarchyCache::from_config(&settings.cache).is_none());
}

#[test]
fn generated_settings_file_round_trips() {
    let test_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = test_dir.path().join("gcpath").join("settings.toml");

    let created = Settings::init_config_file(&config_path, false).unwrap();
    assert_eq!(created, config_path);

    let settings = Settings::load_from(&created).unwrap();
    assert_eq!(settings.loader.mode, LoadMode::Bulk);
    assert_eq!(settings.cache.ttl_hours, 72);
    assert!(settings.api.access_token.is_none());
}
