//! In-memory resource hierarchy and path resolution
//!
//! A [`Hierarchy`] is a snapshot: one map per resource kind plus a derived
//! child index. It is produced by [`Hierarchy::load`] (or a cache read) and
//! never changes afterwards.

pub mod assemble;
pub mod load;
pub mod path;

pub use assemble::HierarchyBuilder;
pub use load::LoadRequest;
pub use path::{ORGANIZATIONLESS_ROOT, escape_segment, parse_path};

use crate::error::{HierarchyError, HierarchyResult};
use crate::resource::{Folder, Organization, Project, Resource, ResourceKind, ResourceName};
use std::collections::HashMap;

const HIERARCHY_SCOPE: &str = "the loaded hierarchy";

/// Resource counts per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HierarchyCounts {
    pub organizations: usize,
    pub folders: usize,
    pub projects: usize,
}

impl HierarchyCounts {
    pub fn total(&self) -> usize {
        self.organizations + self.folders + self.projects
    }
}

#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    organizations: HashMap<ResourceName, Organization>,
    folders: HashMap<ResourceName, Folder>,
    projects: HashMap<ResourceName, Project>,
    /// Folders first, then projects; each group by display name, then id
    children: HashMap<ResourceName, Vec<ResourceName>>,
    organizationless: Vec<ResourceName>,
}

impl PartialEq for Hierarchy {
    fn eq(&self, other: &Self) -> bool {
        self.organizations == other.organizations
            && self.folders == other.folders
            && self.projects == other.projects
    }
}

impl Eq for Hierarchy {}

fn sorted_values<T>(map: &HashMap<ResourceName, T>) -> Vec<&T> {
    let mut names: Vec<&ResourceName> = map.keys().collect();
    names.sort();
    names.into_iter().filter_map(|name| map.get(name)).collect()
}

/// Lowest id wins when several siblings share a display name
fn pick_lowest(
    mut candidates: Vec<ResourceName>,
    segment: &str,
    scope: &dyn std::fmt::Display,
) -> Option<ResourceName> {
    candidates.sort();
    if candidates.len() > 1 {
        let names: Vec<String> = candidates.iter().map(ToString::to_string).collect();
        tracing::warn!(
            "display name '{segment}' is shared by {} under {scope}; using {}",
            names.join(", "),
            names[0]
        );
    }
    candidates.first().copied()
}

impl Hierarchy {
    /// Start an empty builder
    pub fn builder() -> HierarchyBuilder {
        HierarchyBuilder::new()
    }

    /// Assemble from complete record lists, enforcing every structural rule
    pub fn from_records(
        organizations: Vec<Organization>,
        folders: Vec<Folder>,
        projects: Vec<Project>,
    ) -> HierarchyResult<Self> {
        let mut builder = HierarchyBuilder::new();
        for org in organizations {
            builder.add_organization(org)?;
        }
        for folder in folders {
            builder.add_folder(folder)?;
        }
        for project in projects {
            builder.add_project(project)?;
        }
        builder.build()
    }

    pub fn get(&self, name: &ResourceName) -> Option<Resource<'_>> {
        match name.kind() {
            ResourceKind::Organization => self.organizations.get(name).map(Resource::Organization),
            ResourceKind::Folder => self.folders.get(name).map(Resource::Folder),
            ResourceKind::Project => self.projects.get(name).map(Resource::Project),
        }
    }

    pub fn contains(&self, name: &ResourceName) -> bool {
        self.get(name).is_some()
    }

    pub fn organization(&self, name: &ResourceName) -> Option<&Organization> {
        self.organizations.get(name)
    }

    pub fn folder(&self, name: &ResourceName) -> Option<&Folder> {
        self.folders.get(name)
    }

    pub fn project(&self, name: &ResourceName) -> Option<&Project> {
        self.projects.get(name)
    }

    /// Organizations ordered by resource name
    pub fn organizations(&self) -> Vec<&Organization> {
        sorted_values(&self.organizations)
    }

    /// Folders ordered by resource name
    pub fn folders(&self) -> Vec<&Folder> {
        sorted_values(&self.folders)
    }

    /// Projects ordered by resource name
    pub fn projects(&self) -> Vec<&Project> {
        sorted_values(&self.projects)
    }

    /// Projects under the `_` root, by display name then id
    pub fn organizationless_projects(&self) -> Vec<&Project> {
        self.organizationless
            .iter()
            .filter_map(|name| self.projects.get(name))
            .collect()
    }

    pub fn counts(&self) -> HierarchyCounts {
        HierarchyCounts {
            organizations: self.organizations.len(),
            folders: self.folders.len(),
            projects: self.projects.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts().total() == 0
    }

    fn require(&self, name: &ResourceName) -> HierarchyResult<Resource<'_>> {
        self.get(name)
            .ok_or_else(|| HierarchyError::not_found(name, HIERARCHY_SCOPE))
    }

    /// Human-readable path of a resource, e.g. `//example.com/eng/backend`
    pub fn path_of(&self, name: &ResourceName) -> HierarchyResult<String> {
        let mut current = self.require(name)?;
        let mut segments = Vec::new();
        // A chain can never be longer than every folder plus its two ends
        let limit = self.folders.len() + 2;

        loop {
            segments.push(escape_segment(current.display_name()));
            if segments.len() > limit {
                return Err(HierarchyError::inconsistent(format!(
                    "parent chain of {name} does not terminate"
                )));
            }
            match current.parent() {
                Some(parent) => {
                    current = self.get(&parent).ok_or_else(|| {
                        HierarchyError::inconsistent(format!(
                            "{} has parent {parent} which is not in the hierarchy",
                            current.name()
                        ))
                    })?;
                }
                None if current.kind() == ResourceKind::Organization => break,
                None => {
                    segments.push(ORGANIZATIONLESS_ROOT.to_string());
                    break;
                }
            }
        }

        segments.reverse();
        Ok(path::join_segments(segments))
    }

    /// Resolve a path back to its resource name.
    ///
    /// Folders are matched before projects; projects are only tried on the
    /// last segment. Siblings sharing a display name resolve to the lowest
    /// id.
    pub fn resource_name_of(&self, path: &str) -> HierarchyResult<ResourceName> {
        let segments = parse_path(path)?;
        let not_found = |segment: &str, scope: String| HierarchyError::PathNotFound {
            path: path.to_string(),
            segment: segment.to_string(),
            scope,
        };

        let (root, rest) = segments
            .split_first()
            .ok_or_else(|| HierarchyError::MalformedPath {
                path: path.to_string(),
                reason: "missing root segment".to_string(),
            })?;

        if root == ORGANIZATIONLESS_ROOT {
            let [leaf] = rest else {
                return Err(HierarchyError::MalformedPath {
                    path: path.to_string(),
                    reason: "'//_/' must be followed by exactly one project name".to_string(),
                });
            };
            let candidates = self
                .organizationless_projects()
                .into_iter()
                .filter(|p| p.display_name == *leaf)
                .map(|p| p.name)
                .collect();
            return pick_lowest(candidates, leaf, &"organizationless projects")
                .ok_or_else(|| not_found(leaf, "organizationless projects".to_string()));
        }

        let candidates = self
            .organizations
            .values()
            .filter(|o| o.display_name == *root)
            .map(|o| o.name)
            .collect();
        let mut current = pick_lowest(candidates, root, &"organizations")
            .ok_or_else(|| not_found(root, "organizations".to_string()))?;

        for (i, segment) in rest.iter().enumerate() {
            let last = i + 1 == rest.len();
            let children = self.children.get(&current).map(Vec::as_slice).unwrap_or_default();
            let matching = |kind: ResourceKind| -> Vec<ResourceName> {
                children
                    .iter()
                    .filter(|c| c.kind() == kind)
                    .filter(|c| {
                        self.get(c)
                            .is_some_and(|r| r.display_name() == segment.as_str())
                    })
                    .copied()
                    .collect()
            };

            let mut next = pick_lowest(matching(ResourceKind::Folder), segment, &current);
            if next.is_none() && last {
                next = pick_lowest(matching(ResourceKind::Project), segment, &current);
            }
            current = next.ok_or_else(|| not_found(segment, current.to_string()))?;
        }

        Ok(current)
    }

    /// Immediate children: folders first, then projects, each by display
    /// name then id
    pub fn direct_children_of(&self, name: &ResourceName) -> HierarchyResult<Vec<Resource<'_>>> {
        self.require(name)?;
        Ok(self
            .children
            .get(name)
            .map(|children| children.iter().filter_map(|c| self.get(c)).collect())
            .unwrap_or_default())
    }

    /// Every resource below `name` in pre-order, children ordered as in
    /// [`Hierarchy::direct_children_of`]
    pub fn descendants_of(&self, name: &ResourceName) -> HierarchyResult<Vec<Resource<'_>>> {
        self.require(name)?;
        let mut out = Vec::new();
        let mut stack: Vec<ResourceName> = self
            .children
            .get(name)
            .map(|c| c.iter().rev().copied().collect())
            .unwrap_or_default();

        while let Some(next) = stack.pop() {
            if let Some(resource) = self.get(&next) {
                out.push(resource);
            }
            if let Some(children) = self.children.get(&next) {
                stack.extend(children.iter().rev().copied());
            }
        }
        Ok(out)
    }

    /// Parents of `name`, nearest first, excluding `name` itself
    pub fn ancestors_of(&self, name: &ResourceName) -> HierarchyResult<Vec<Resource<'_>>> {
        let mut current = self.require(name)?;
        let mut out = Vec::new();
        while let Some(parent) = current.parent() {
            current = self.require(&parent)?;
            out.push(current);
            if out.len() > self.folders.len() + 1 {
                return Err(HierarchyError::inconsistent(format!(
                    "parent chain of {name} does not terminate"
                )));
            }
        }
        Ok(out)
    }

    /// Every `(path, name)` pair, sorted by path
    pub fn entries(&self) -> HierarchyResult<Vec<(String, ResourceName)>> {
        let mut entries = self
            .organizations
            .keys()
            .chain(self.folders.keys())
            .chain(self.projects.keys())
            .map(|name| self.path_of(name).map(|path| (path, *name)))
            .collect::<HierarchyResult<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }
}
