//! Shared fixtures for the integration tests
#![allow(dead_code)]

use gcpath::{
    Folder, HierarchyCache, LifecycleState, MemoryCloud, Organization, Project, ResourceName,
};
use std::time::Duration;
use tempfile::TempDir;

pub const ORG: u64 = 100;
pub const OTHER_ORG: u64 = 200;

pub fn org() -> ResourceName {
    ResourceName::organization(ORG)
}

pub fn folder(id: u64) -> ResourceName {
    ResourceName::folder(id)
}

pub fn project(id: u64) -> ResourceName {
    ResourceName::project(id)
}

fn deleted_folder(id: u64, display_name: &str, parent: ResourceName) -> Folder {
    let mut folder = Folder::new(ResourceName::folder(id), display_name, parent);
    folder.lifecycle_state = LifecycleState::DeleteRequested;
    folder
}

fn deleted_project(id: u64, project_id: &str, parent: ResourceName) -> Project {
    let mut project = Project::new(ResourceName::project(id), project_id, project_id, Some(parent));
    project.lifecycle_state = LifecycleState::DeleteRequested;
    project
}

/// ```text
/// example.com (organizations/100)
///   eng (folders/1)
///     backend (projects/2)
///     infra (folders/3)
///       a/b (projects/4)
///     [deleted] legacy (projects/8)
///   ops (folders/5)
///   [deleted] old (folders/6)
///   web (projects/7)
/// other.org (organizations/200)
///   eng (folders/20)
/// sandbox (projects/9, no organization)
/// ```
pub fn cloud() -> MemoryCloud {
    let org = org();
    let other = ResourceName::organization(OTHER_ORG);

    MemoryCloud::new()
        .with_page_size(2)
        .with_organization(Organization::new(org, "example.com"))
        .with_organization(Organization::new(other, "other.org"))
        .with_folder(Folder::new(folder(1), "eng", org))
        .with_folder(Folder::new(folder(3), "infra", folder(1)))
        .with_folder(Folder::new(folder(5), "ops", org))
        .with_folder(deleted_folder(6, "old", org))
        .with_folder(Folder::new(folder(20), "eng", other))
        .with_project(Project::new(project(2), "backend-prod", "backend", Some(folder(1))))
        .with_project(Project::new(project(4), "ab-123", "a/b", Some(folder(3))))
        .with_project(Project::new(project(7), "web-prod", "web", Some(org)))
        .with_project(deleted_project(8, "legacy", folder(1)))
        .with_project(Project::new(project(9), "sandbox-1", "sandbox", None))
}

/// Cache file inside a fresh temporary directory
pub fn temp_cache(ttl: Option<Duration>) -> (HierarchyCache, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let cache = HierarchyCache::new(dir.path().join("gcpath").join("cache.json"), ttl);
    (cache, dir)
}
