//! Path <-> resource name translation over a fully loaded hierarchy

use crate::common::{self, folder, org, project};
use gcpath::{Hierarchy, HierarchyError, LoadMode, LoadRequest, ResourceName};

const MODES: [LoadMode; 2] = [LoadMode::Bulk, LoadMode::Iterative];

fn full(mode: LoadMode) -> Hierarchy {
    Hierarchy::fetch(&LoadRequest::new(mode), &common::cloud()).expect("full load")
}

#[test]
fn resolves_documented_paths() {
    for mode in MODES {
        let hierarchy = full(mode);
        let cases = [
            ("//example.com", org()),
            ("//example.com/eng", folder(1)),
            ("//example.com/eng/backend", project(2)),
            ("//example.com/eng/infra/a%2Fb", project(4)),
            ("//example.com/web", project(7)),
            ("//other.org/eng", folder(20)),
            ("//_/sandbox", project(9)),
        ];
        for (path, expected) in cases {
            assert_eq!(
                hierarchy.resource_name_of(path).unwrap(),
                expected,
                "{path} in {mode:?} mode"
            );
            assert_eq!(hierarchy.path_of(&expected).unwrap(), path);
        }
    }
}

#[test]
fn every_entry_round_trips() {
    for mode in MODES {
        let hierarchy = full(mode);
        let entries = hierarchy.entries().unwrap();
        assert_eq!(entries.len(), hierarchy.counts().total());

        for (path, name) in &entries {
            assert_eq!(hierarchy.resource_name_of(path).unwrap(), *name);
            assert_eq!(hierarchy.path_of(name).unwrap(), *path);
        }
    }
}

#[test]
fn both_loaders_build_the_same_hierarchy() {
    assert_eq!(full(LoadMode::Bulk), full(LoadMode::Iterative));
}

#[test]
fn deleted_resources_are_left_out() {
    for mode in MODES {
        let hierarchy = full(mode);
        assert!(!hierarchy.contains(&folder(6)));
        assert!(!hierarchy.contains(&project(8)));
        assert!(matches!(
            hierarchy.path_of(&folder(6)),
            Err(HierarchyError::ResourceNotFound { .. })
        ));
        assert!(matches!(
            hierarchy.resource_name_of("//example.com/old"),
            Err(HierarchyError::PathNotFound { .. })
        ));
    }
}

#[test]
fn organizationless_projects_sit_under_the_placeholder_root() {
    let hierarchy = full(LoadMode::Bulk);
    let orphans: Vec<ResourceName> = hierarchy
        .organizationless_projects()
        .iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(orphans, vec![project(9)]);
}

#[test]
fn unknown_and_malformed_paths() {
    let hierarchy = full(LoadMode::Bulk);

    match hierarchy.resource_name_of("//example.com/eng/nope") {
        Err(HierarchyError::PathNotFound { segment, .. }) => assert_eq!(segment, "nope"),
        other => panic!("expected PathNotFound, got {other:?}"),
    }
    assert!(matches!(
        hierarchy.resource_name_of("example.com/eng"),
        Err(HierarchyError::MalformedPath { .. })
    ));
    assert!(matches!(
        hierarchy.resource_name_of("//nowhere.org"),
        Err(HierarchyError::PathNotFound { .. })
    ));
}

#[test]
fn traversal_follows_the_tree() {
    let hierarchy = full(LoadMode::Iterative);

    let below_eng: Vec<ResourceName> = hierarchy
        .descendants_of(&folder(1))
        .unwrap()
        .iter()
        .map(|r| r.name())
        .collect();
    assert_eq!(below_eng.len(), 3);
    assert!(below_eng.contains(&project(4)));

    let above_ab: Vec<ResourceName> = hierarchy
        .ancestors_of(&project(4))
        .unwrap()
        .iter()
        .map(|r| r.name())
        .collect();
    assert_eq!(above_ab, vec![folder(3), folder(1), org()]);
}
