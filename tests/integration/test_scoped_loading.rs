//! Loads restricted to one resource or to named organizations

use crate::common::{self, folder, org, project};
use gcpath::upstream::UpstreamError;
use gcpath::{Hierarchy, HierarchyError, LoadMode, LoadRequest, ResourceName};

const MODES: [LoadMode; 2] = [LoadMode::Bulk, LoadMode::Iterative];

fn fetch(request: LoadRequest) -> Result<Hierarchy, HierarchyError> {
    Hierarchy::fetch(&request, &common::cloud())
}

#[test]
fn scoped_subtree_matches_the_full_hierarchy() {
    for mode in MODES {
        let full = fetch(LoadRequest::new(mode)).unwrap();
        let scoped = fetch(LoadRequest::new(mode).with_target(folder(1))).unwrap();

        let below: Vec<ResourceName> = full
            .descendants_of(&folder(1))
            .unwrap()
            .iter()
            .map(|r| r.name())
            .collect();
        for name in below.iter().chain([folder(1)].iter()) {
            assert_eq!(
                scoped.path_of(name).unwrap(),
                full.path_of(name).unwrap(),
                "{name} in {mode:?} mode"
            );
        }

        assert!(scoped.contains(&org()));
        assert!(!scoped.contains(&folder(5)));
        assert!(!scoped.contains(&project(7)));
        assert!(!scoped.contains(&project(9)));
    }
}

#[test]
fn non_recursive_scope_stops_at_direct_children() {
    for mode in MODES {
        let scoped = fetch(
            LoadRequest::new(mode)
                .with_target(folder(1))
                .recursive(false),
        )
        .unwrap();
        assert!(scoped.contains(&folder(3)), "{mode:?}");
        assert!(scoped.contains(&project(2)), "{mode:?}");
        assert!(!scoped.contains(&project(4)), "{mode:?}");
    }
}

#[test]
fn non_recursive_full_load_keeps_only_the_first_level() {
    for mode in MODES {
        let shallow = fetch(LoadRequest::new(mode).recursive(false)).unwrap();
        assert!(shallow.contains(&folder(1)));
        assert!(shallow.contains(&project(7)));
        assert!(!shallow.contains(&folder(3)));
        assert!(!shallow.contains(&project(2)));
    }
}

#[test]
fn project_target_resolves_its_full_path() {
    for mode in MODES {
        let scoped = fetch(
            LoadRequest::new(mode)
                .with_target(project(4))
                .recursive(false),
        )
        .unwrap();
        assert_eq!(
            scoped.path_of(&project(4)).unwrap(),
            "//example.com/eng/infra/a%2Fb"
        );
    }
}

#[test]
fn organizationless_project_target() {
    let scoped = fetch(LoadRequest::default().with_target(project(9))).unwrap();
    assert_eq!(scoped.path_of(&project(9)).unwrap(), "//_/sandbox");
    assert!(scoped.organizations().is_empty());
}

#[test]
fn organization_filter_by_display_name() {
    for mode in MODES {
        let filtered =
            fetch(LoadRequest::new(mode).with_org_filter(vec!["other.org".to_string()])).unwrap();
        assert_eq!(filtered.organizations().len(), 1);
        assert_eq!(filtered.path_of(&folder(20)).unwrap(), "//other.org/eng");
        assert!(!filtered.contains(&folder(1)));
        // Organizationless projects only come with unfiltered loads
        assert!(filtered.organizationless_projects().is_empty());
    }
}

#[test]
fn unknown_organization_filter_is_empty() {
    let filtered =
        fetch(LoadRequest::default().with_org_filter(vec!["nowhere.org".to_string()])).unwrap();
    assert!(filtered.is_empty());
}

#[test]
fn target_outside_the_filtered_organizations() {
    let result = fetch(
        LoadRequest::default()
            .with_org_filter(vec!["other.org".to_string()])
            .with_target(folder(3)),
    );
    assert!(matches!(
        result,
        Err(HierarchyError::ResourceNotFound { .. })
    ));
}

#[test]
fn unknown_target_surfaces_the_upstream_not_found() {
    match fetch(LoadRequest::default().with_target(folder(999))) {
        Err(HierarchyError::Upstream { source, scope, .. }) => {
            assert!(matches!(source, UpstreamError::NotFound { .. }));
            assert_eq!(scope, "folders/999");
        }
        other => panic!("expected an upstream error, got {other:?}"),
    }
}
