//! Dual-mode loading of folders and projects
//!
//! [`DescendantLoader`] has two implementations: [`BulkLoader`] runs one
//! Cloud Asset query per kind, [`IterativeLoader`] walks Resource Manager
//! listings folder by folder. The calls both modes share (organizations,
//! the scope chain of a target, organizationless projects) live here as
//! free functions.

pub mod bulk;
pub mod iterative;

pub use bulk::BulkLoader;
pub use iterative::IterativeLoader;

use crate::config::LoadMode;
use crate::error::{HierarchyError, HierarchyResult};
use crate::resource::{Folder, Organization, Project, ResourceKind, ResourceName};
use crate::upstream::{CloudBackend, ResourceManager, UpstreamError, drain_pages};
use std::collections::HashSet;

/// Folders and projects found under one scope
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Descendants {
    pub folders: Vec<Folder>,
    pub projects: Vec<Project>,
    /// Bulk rows dropped because their name could not be recovered
    pub skipped_rows: usize,
}

impl Descendants {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.projects.is_empty()
    }

    pub fn extend(&mut self, other: Descendants) {
        self.folders.extend(other.folders);
        self.projects.extend(other.projects);
        self.skipped_rows += other.skipped_rows;
    }
}

/// Strategy for fetching what lies below an organization or a target
pub trait DescendantLoader {
    fn mode(&self) -> LoadMode;

    /// Fetch folders and projects under `org`, or under `target` when given.
    ///
    /// With `recursive` the whole subtree is returned (the target itself
    /// excluded); otherwise only direct children. Only `ACTIVE` records are
    /// returned.
    fn fetch_descendants(
        &self,
        org: Option<&Organization>,
        target: Option<&ResourceName>,
        recursive: bool,
    ) -> HierarchyResult<Descendants>;
}

/// Pick the loader for `mode`
pub fn select_loader<'a, B>(mode: LoadMode, backend: &'a B) -> Box<dyn DescendantLoader + 'a>
where
    B: CloudBackend + ?Sized,
{
    match mode {
        LoadMode::Bulk => Box::new(BulkLoader::new(backend)),
        LoadMode::Iterative => Box::new(IterativeLoader::new(backend)),
    }
}

pub(crate) fn upstream_error(
    loader: &'static str,
    scope: impl ToString,
) -> impl FnOnce(UpstreamError) -> HierarchyError {
    move |source| HierarchyError::Upstream {
        loader,
        scope: scope.to_string(),
        source,
    }
}

/// Every active organization visible to the caller, optionally restricted to
/// the given display names
pub fn fetch_organizations<R>(
    manager: &R,
    display_names: &[String],
) -> HierarchyResult<Vec<Organization>>
where
    R: ResourceManager + ?Sized,
{
    let organizations = drain_pages(|token| manager.search_organizations(token))
        .map_err(upstream_error("resource manager", "all organizations"))?;
    tracing::debug!("search_organizations returned {} records", organizations.len());

    Ok(organizations
        .into_iter()
        .filter(|org| org.lifecycle_state.is_active())
        .filter(|org| display_names.is_empty() || display_names.contains(&org.display_name))
        .collect())
}

/// The target and the folders above it, nearest first
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScopeChain {
    /// Target first when it is a folder, then its ancestors
    pub folders: Vec<Folder>,
    /// The target itself when it is a project
    pub project: Option<Project>,
    /// Organization at the top of the chain, `None` for organizationless
    /// projects
    pub organization: Option<ResourceName>,
}

/// Fetch `target` and every folder above it so a scoped hierarchy can still
/// build full paths. Organizations are not fetched here.
pub fn fetch_scope_chain<R>(manager: &R, target: &ResourceName) -> HierarchyResult<ScopeChain>
where
    R: ResourceManager + ?Sized,
{
    let wrap = || upstream_error("resource manager", target);
    let mut chain = ScopeChain::default();

    let mut next = match target.kind() {
        ResourceKind::Organization => {
            chain.organization = Some(*target);
            return Ok(chain);
        }
        ResourceKind::Project => {
            let project = manager.get_project(target).map_err(wrap())?;
            let parent = project.parent;
            chain.project = Some(project);
            parent
        }
        ResourceKind::Folder => Some(*target),
    };

    let mut seen = HashSet::new();
    while let Some(name) = next {
        match name.kind() {
            ResourceKind::Organization => {
                chain.organization = Some(name);
                break;
            }
            ResourceKind::Folder => {
                if !seen.insert(name) {
                    return Err(HierarchyError::inconsistent(format!(
                        "folder {name} appears twice in the ancestry of {target}"
                    )));
                }
                let folder = manager.get_folder(&name).map_err(wrap())?;
                next = Some(folder.parent);
                chain.folders.push(folder);
            }
            ResourceKind::Project => {
                return Err(HierarchyError::inconsistent(format!(
                    "project {name} is listed as a parent in the ancestry of {target}"
                )));
            }
        }
    }

    tracing::debug!(
        "scope chain of {target}: {} folders, organization {:?}",
        chain.folders.len(),
        chain.organization.map(|o| o.to_string())
    );
    Ok(chain)
}

/// Active projects without any parent that are not in `known`.
///
/// Permission denied on the search is logged and treated as "none found".
pub fn fetch_organizationless_projects<R>(
    manager: &R,
    known: &HashSet<ResourceName>,
) -> HierarchyResult<Vec<Project>>
where
    R: ResourceManager + ?Sized,
{
    let projects = match drain_pages(|token| manager.search_projects(token)) {
        Ok(projects) => projects,
        Err(err) if err.is_permission_denied() => {
            tracing::warn!("permission denied searching organizationless projects");
            return Ok(Vec::new());
        }
        Err(err) => return Err(upstream_error("resource manager", "all projects")(err)),
    };

    Ok(projects
        .into_iter()
        .filter(|p| p.is_organizationless() && p.lifecycle_state.is_active())
        .filter(|p| {
            let fresh = !known.contains(&p.name);
            if !fresh {
                tracing::debug!("project {} already loaded, skipping", p.project_id);
            }
            fresh
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::LifecycleState;
    use crate::upstream::MemoryCloud;

    fn cloud() -> MemoryCloud {
        let org = ResourceName::organization(100);
        let mut deleted = Organization::new(ResourceName::organization(200), "gone.example");
        deleted.lifecycle_state = LifecycleState::DeleteRequested;
        MemoryCloud::new()
            .with_organization(Organization::new(org, "example.com"))
            .with_organization(Organization::new(ResourceName::organization(300), "other.org"))
            .with_organization(deleted)
            .with_folder(Folder::new(ResourceName::folder(1), "eng", org))
            .with_folder(Folder::new(ResourceName::folder(2), "backend", ResourceName::folder(1)))
            .with_project(Project::new(
                ResourceName::project(3),
                "api-prod",
                "api",
                Some(ResourceName::folder(2)),
            ))
            .with_project(Project::new(ResourceName::project(9), "sandbox-1", "sandbox", None))
    }

    #[test]
    fn organizations_are_active_and_filtered_by_display_name() {
        let cloud = cloud();
        let all = fetch_organizations(&cloud, &[]).unwrap();
        assert_eq!(all.len(), 2);

        let only = fetch_organizations(&cloud, &["other.org".to_string()]).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].name, ResourceName::organization(300));
    }

    #[test]
    fn scope_chain_of_project_walks_to_organization() {
        let chain = fetch_scope_chain(&cloud(), &ResourceName::project(3)).unwrap();
        assert_eq!(chain.project.map(|p| p.name), Some(ResourceName::project(3)));
        let names: Vec<_> = chain.folders.iter().map(|f| f.name).collect();
        assert_eq!(names, vec![ResourceName::folder(2), ResourceName::folder(1)]);
        assert_eq!(chain.organization, Some(ResourceName::organization(100)));
    }

    #[test]
    fn scope_chain_of_organizationless_project() {
        let chain = fetch_scope_chain(&cloud(), &ResourceName::project(9)).unwrap();
        assert!(chain.folders.is_empty());
        assert_eq!(chain.organization, None);
    }

    #[test]
    fn scope_chain_missing_target_is_upstream_error() {
        let err = fetch_scope_chain(&cloud(), &ResourceName::folder(77)).unwrap_err();
        assert_eq!(err.status_code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn organizationless_projects_skip_known() {
        let cloud = cloud();
        let found = fetch_organizationless_projects(&cloud, &HashSet::new()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, ResourceName::project(9));

        let known = HashSet::from([ResourceName::project(9)]);
        assert!(fetch_organizationless_projects(&cloud, &known).unwrap().is_empty());
    }

    #[test]
    fn select_loader_matches_mode() {
        let cloud = cloud();
        assert_eq!(select_loader(LoadMode::Bulk, &cloud).mode(), LoadMode::Bulk);
        assert_eq!(
            select_loader(LoadMode::Iterative, &cloud).mode(),
            LoadMode::Iterative
        );
    }
}
