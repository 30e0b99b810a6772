//! Upstream failures, bad rows, and broken trees

use crate::common::{self, folder, org, project};
use gcpath::io::ExitCode;
use gcpath::upstream::UpstreamError;
use gcpath::{
    BulkLoader, DescendantLoader, Hierarchy, HierarchyError, LoadMode, LoadRequest, Organization,
    ResourceKind,
};
use serde_json::json;

fn stray_folder_row() -> serde_json::Value {
    json!({
        "name": "//cloudresourcemanager.googleapis.com/folders/50",
        "displayName": "stray",
        "parent": "folders/99",
        "lifecycleState": "ACTIVE",
        "ancestors": ["folders/50", "folders/99", "organizations/100"],
    })
}

#[test]
fn dangling_parent_is_an_inconsistent_hierarchy() {
    let cloud = common::cloud().with_raw_asset_row(ResourceKind::Folder, stray_folder_row());
    let err = Hierarchy::fetch(&LoadRequest::new(LoadMode::Bulk), &cloud).unwrap_err();

    assert!(
        matches!(err, HierarchyError::InconsistentHierarchy { ref reason } if reason.contains("folders/99")),
        "got {err:?}"
    );
    assert_eq!(ExitCode::from_error(&err), ExitCode::InconsistentHierarchy);
}

#[test]
fn conflicting_duplicate_row_is_an_inconsistent_hierarchy() {
    let renamed = json!({
        "name": "//cloudresourcemanager.googleapis.com/folders/1",
        "displayName": "engineering",
        "parent": "organizations/100",
        "lifecycleState": "ACTIVE",
        "ancestors": ["folders/1", "organizations/100"],
    });
    let cloud = common::cloud().with_raw_asset_row(ResourceKind::Folder, renamed);
    let err = Hierarchy::fetch(&LoadRequest::new(LoadMode::Bulk), &cloud).unwrap_err();

    assert_eq!(err.status_code(), "INCONSISTENT_HIERARCHY");
    assert!(
        matches!(err, HierarchyError::InconsistentHierarchy { ref reason } if reason.contains("folders/1")),
        "got {err:?}"
    );
}

#[test]
fn unparseable_rows_are_skipped_and_counted() {
    let cloud = common::cloud()
        .with_raw_asset_row(ResourceKind::Folder, json!({ "displayName": "no name" }))
        .with_raw_asset_row(
            ResourceKind::Project,
            json!({ "name": "//cloudresourcemanager.googleapis.com/folders/7" }),
        );

    let example = Organization::new(org(), "example.com");
    let descendants = BulkLoader::new(&cloud)
        .fetch_descendants(Some(&example), None, true)
        .unwrap();
    assert_eq!(descendants.skipped_rows, 2);
    assert_eq!(descendants.folders.len(), 3);

    let hierarchy = Hierarchy::fetch(&LoadRequest::new(LoadMode::Bulk), &cloud).unwrap();
    assert!(hierarchy.contains(&project(4)));
}

#[test]
fn bulk_permission_denied_is_wrapped_with_loader_and_scope() {
    let cloud = common::cloud().deny(org());
    match Hierarchy::fetch(&LoadRequest::new(LoadMode::Bulk), &cloud) {
        Err(err @ HierarchyError::Upstream { .. }) => {
            let HierarchyError::Upstream {
                loader,
                scope,
                source,
            } = &err
            else {
                unreachable!()
            };
            assert_eq!(*loader, "bulk");
            assert_eq!(scope, "organizations/100");
            assert!(source.is_permission_denied());
            assert_eq!(ExitCode::from_error(&err), ExitCode::UpstreamError);
        }
        other => panic!("expected an upstream error, got {other:?}"),
    }
}

#[test]
fn iterative_skips_unreadable_subfolders() {
    let cloud = common::cloud().deny(folder(3));
    let hierarchy = Hierarchy::fetch(&LoadRequest::new(LoadMode::Iterative), &cloud).unwrap();

    assert!(hierarchy.contains(&folder(3)));
    assert!(!hierarchy.contains(&project(4)));
    assert!(hierarchy.contains(&project(2)));
}

#[test]
fn iterative_fails_when_the_starting_point_is_unreadable() {
    let cloud = common::cloud().deny(org());
    match Hierarchy::fetch(&LoadRequest::new(LoadMode::Iterative), &cloud) {
        Err(HierarchyError::Upstream { loader, source, .. }) => {
            assert_eq!(loader, "iterative");
            assert!(matches!(source, UpstreamError::PermissionDenied { .. }));
        }
        other => panic!("expected an upstream error, got {other:?}"),
    }
}

#[test]
fn disabled_asset_api_fails_bulk_but_not_iterative() {
    let cloud = common::cloud().without_asset_api();

    let err = Hierarchy::fetch(&LoadRequest::new(LoadMode::Bulk), &cloud).unwrap_err();
    assert!(matches!(
        err,
        HierarchyError::Upstream {
            source: UpstreamError::Http { status: 403, .. },
            ..
        }
    ));

    let hierarchy = Hierarchy::fetch(&LoadRequest::new(LoadMode::Iterative), &cloud).unwrap();
    assert!(hierarchy.contains(&project(4)));
}

#[test]
fn rows_without_parent_column_fall_back_to_ancestors() {
    let cloud = common::cloud().without_asset_parent_column();
    let bulk = Hierarchy::fetch(&LoadRequest::new(LoadMode::Bulk), &cloud).unwrap();
    let iterative = Hierarchy::fetch(&LoadRequest::new(LoadMode::Iterative), &cloud).unwrap();
    assert_eq!(bulk, iterative);
}

#[test]
fn exit_codes_look_through_anyhow_context() {
    let err = Hierarchy::fetch(
        &LoadRequest::default().with_target(folder(999)),
        &common::cloud(),
    )
    .unwrap_err();
    let wrapped = anyhow::Error::new(err).context("resolving folders/999");
    assert_eq!(ExitCode::from_anyhow(&wrapped), ExitCode::UpstreamError);

    let plain = anyhow::anyhow!("something else");
    assert_eq!(ExitCode::from_anyhow(&plain), ExitCode::GeneralError);
}
