//! In-process stand-in for both upstream services
//!
//! Backs the integration tests. Listings paginate with a configurable page
//! size, asset queries honour [`AssetFilter`], and
//! every call is counted so callers can assert that a load was served from
//! cache. Records are returned whatever their lifecycle state, so the
//! engine's own filtering is what keeps deleted resources out.

use super::query::{AssetFilter, AssetQuery};
use super::{AssetInventory, Page, ResourceManager, UpstreamError, UpstreamResult};
use crate::parsing::asset::ASSET_NAME_PREFIX;
use crate::resource::{Folder, Organization, Project, ResourceKind, ResourceName};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

const DEFAULT_PAGE_SIZE: usize = 50;

/// Call counters, one per upstream operation
#[derive(Debug, Default)]
pub struct CallCounts {
    pub search_organizations: AtomicUsize,
    pub list_folders: AtomicUsize,
    pub list_projects: AtomicUsize,
    pub search_projects: AtomicUsize,
    pub get_folder: AtomicUsize,
    pub get_project: AtomicUsize,
    pub query_assets: AtomicUsize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        [
            &self.search_organizations,
            &self.list_folders,
            &self.list_projects,
            &self.search_projects,
            &self.get_folder,
            &self.get_project,
            &self.query_assets,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct MemoryCloud {
    organizations: Vec<Organization>,
    folders: Vec<Folder>,
    projects: Vec<Project>,
    /// Rows appended verbatim to asset query results
    extra_rows: Vec<(ResourceKind, Value)>,
    denied: HashSet<ResourceName>,
    asset_api_enabled: bool,
    /// Emit the `resource.data.parent` column in asset rows
    asset_parent_column: bool,
    page_size: usize,
    calls: CallCounts,
}

impl Default for MemoryCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCloud {
    pub fn new() -> Self {
        Self {
            organizations: Vec::new(),
            folders: Vec::new(),
            projects: Vec::new(),
            extra_rows: Vec::new(),
            denied: HashSet::new(),
            asset_api_enabled: true,
            asset_parent_column: true,
            page_size: DEFAULT_PAGE_SIZE,
            calls: CallCounts::default(),
        }
    }

    pub fn with_organization(mut self, org: Organization) -> Self {
        self.organizations.push(org);
        self
    }

    pub fn with_folder(mut self, folder: Folder) -> Self {
        self.folders.push(folder);
        self
    }

    pub fn with_project(mut self, project: Project) -> Self {
        self.projects.push(project);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fail listings under `name` with `PermissionDenied`
    pub fn deny(mut self, name: ResourceName) -> Self {
        self.denied.insert(name);
        self
    }

    pub fn without_asset_api(mut self) -> Self {
        self.asset_api_enabled = false;
        self
    }

    /// Leave the parent column empty so parsers must fall back to ancestors
    pub fn without_asset_parent_column(mut self) -> Self {
        self.asset_parent_column = false;
        self
    }

    /// Append a raw row to every asset query of `kind`
    pub fn with_raw_asset_row(mut self, kind: ResourceKind, row: Value) -> Self {
        self.extra_rows.push((kind, row));
        self
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    fn page<T: Clone>(&self, items: Vec<T>, token: Option<&str>) -> UpstreamResult<Page<T>> {
        let start = match token {
            Some(t) => t.parse::<usize>().map_err(|_| UpstreamError::Http {
                endpoint: "memory".to_string(),
                status: 400,
                message: format!("invalid page token '{t}'"),
            })?,
            None => 0,
        };
        let end = (start + self.page_size).min(items.len());
        let next_page_token = (end < items.len()).then(|| end.to_string());
        Ok(Page {
            items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
            next_page_token,
        })
    }

    fn check_access(&self, name: &ResourceName) -> UpstreamResult<()> {
        if self.denied.contains(name) {
            return Err(UpstreamError::PermissionDenied {
                resource: name.to_string(),
            });
        }
        Ok(())
    }

    fn parent_of(&self, name: &ResourceName) -> Option<ResourceName> {
        match name.kind() {
            ResourceKind::Organization => None,
            ResourceKind::Folder => self
                .folders
                .iter()
                .find(|f| f.name == *name)
                .map(|f| f.parent),
            ResourceKind::Project => self
                .projects
                .iter()
                .find(|p| p.name == *name)
                .and_then(|p| p.parent),
        }
    }

    /// Self first, organization last, as the Asset API reports them
    fn ancestors_of(&self, name: &ResourceName) -> Vec<ResourceName> {
        let mut chain = vec![*name];
        let mut current = *name;
        while let Some(parent) = self.parent_of(&current) {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    fn matches(&self, name: &ResourceName, parent: Option<ResourceName>, query: &AssetQuery) -> bool {
        let ancestors = self.ancestors_of(name);
        if !ancestors.contains(&query.organization) {
            return false;
        }
        match query.filter {
            AssetFilter::All => true,
            AssetFilter::Parent(p) => parent == Some(p),
            AssetFilter::Ancestor(a) => *name != a && ancestors.contains(&a),
        }
    }

    fn ancestors_column(&self, name: &ResourceName) -> Value {
        let items: Vec<Value> = self
            .ancestors_of(name)
            .iter()
            .map(|a| json!({ "v": a.to_string() }))
            .collect();
        json!({ "v": items })
    }

    fn folder_row(&self, folder: &Folder) -> Value {
        let parent = if self.asset_parent_column {
            json!({ "v": folder.parent.to_string() })
        } else {
            json!({ "v": null })
        };
        json!({ "f": [
            { "v": format!("{ASSET_NAME_PREFIX}{}", folder.name) },
            { "v": folder.display_name },
            parent,
            { "v": folder.lifecycle_state.to_string() },
            self.ancestors_column(&folder.name),
        ]})
    }

    fn project_row(&self, project: &Project) -> Value {
        let parent = match project.parent {
            Some(p) if self.asset_parent_column => json!({ "v": { "f": [
                { "v": p.kind().singular() },
                { "v": p.id().to_string() },
            ]}}),
            _ => json!({ "v": null }),
        };
        json!({ "f": [
            { "v": format!("{ASSET_NAME_PREFIX}{}", project.name) },
            { "v": project.project_number.map(|n| n.to_string()) },
            { "v": project.project_id },
            { "v": project.display_name },
            parent,
            { "v": project.lifecycle_state.to_string() },
            self.ancestors_column(&project.name),
        ]})
    }
}

impl AssetInventory for MemoryCloud {
    fn query_assets(&self, query: &AssetQuery, page_token: Option<&str>) -> UpstreamResult<Page<Value>> {
        CallCounts::bump(&self.calls.query_assets);
        if !self.asset_api_enabled {
            return Err(UpstreamError::Http {
                endpoint: "memory:queryAssets".to_string(),
                status: 403,
                message: "Cloud Asset API has not been used in this project".to_string(),
            });
        }
        self.check_access(&query.organization)?;

        let mut rows: Vec<Value> = match query.kind {
            ResourceKind::Folder => self
                .folders
                .iter()
                .filter(|f| self.matches(&f.name, Some(f.parent), query))
                .map(|f| self.folder_row(f))
                .collect(),
            ResourceKind::Project => self
                .projects
                .iter()
                .filter(|p| self.matches(&p.name, p.parent, query))
                .map(|p| self.project_row(p))
                .collect(),
            ResourceKind::Organization => Vec::new(),
        };
        rows.extend(
            self.extra_rows
                .iter()
                .filter(|(kind, _)| *kind == query.kind)
                .map(|(_, row)| row.clone()),
        );
        self.page(rows, page_token)
    }
}

impl ResourceManager for MemoryCloud {
    fn search_organizations(&self, page_token: Option<&str>) -> UpstreamResult<Page<Organization>> {
        CallCounts::bump(&self.calls.search_organizations);
        self.page(self.organizations.clone(), page_token)
    }

    fn list_folders(&self, parent: &ResourceName, page_token: Option<&str>) -> UpstreamResult<Page<Folder>> {
        CallCounts::bump(&self.calls.list_folders);
        self.check_access(parent)?;
        let items = self
            .folders
            .iter()
            .filter(|f| f.parent == *parent)
            .cloned()
            .collect();
        self.page(items, page_token)
    }

    fn list_projects(&self, parent: &ResourceName, page_token: Option<&str>) -> UpstreamResult<Page<Project>> {
        CallCounts::bump(&self.calls.list_projects);
        self.check_access(parent)?;
        let items = self
            .projects
            .iter()
            .filter(|p| p.parent == Some(*parent))
            .cloned()
            .collect();
        self.page(items, page_token)
    }

    fn search_projects(&self, page_token: Option<&str>) -> UpstreamResult<Page<Project>> {
        CallCounts::bump(&self.calls.search_projects);
        self.page(self.projects.clone(), page_token)
    }

    fn get_folder(&self, name: &ResourceName) -> UpstreamResult<Folder> {
        CallCounts::bump(&self.calls.get_folder);
        self.check_access(name)?;
        self.folders
            .iter()
            .find(|f| f.name == *name)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound {
                resource: name.to_string(),
            })
    }

    fn get_project(&self, name: &ResourceName) -> UpstreamResult<Project> {
        CallCounts::bump(&self.calls.get_project);
        self.check_access(name)?;
        self.projects
            .iter()
            .find(|p| p.name == *name)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound {
                resource: name.to_string(),
            })
    }
}
