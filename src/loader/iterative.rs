//! Iterative loading through Resource Manager listings

use super::{DescendantLoader, Descendants, upstream_error};
use crate::config::LoadMode;
use crate::error::HierarchyResult;
use crate::resource::{Organization, ResourceName};
use crate::upstream::{ResourceManager, drain_pages};
use std::collections::HashSet;

const LOADER: &str = "iterative";

/// Depth-first walk: list folders and projects under each parent, recursing
/// into every folder found
pub struct IterativeLoader<'a, R: ResourceManager + ?Sized> {
    manager: &'a R,
}

impl<'a, R: ResourceManager + ?Sized> IterativeLoader<'a, R> {
    pub fn new(manager: &'a R) -> Self {
        Self { manager }
    }

    fn walk(
        &self,
        parent: ResourceName,
        recursive: bool,
        root: bool,
        visited: &mut HashSet<ResourceName>,
        out: &mut Descendants,
    ) -> HierarchyResult<()> {
        if !visited.insert(parent) {
            tracing::warn!("{parent} reached twice while walking folders, not descending again");
            return Ok(());
        }

        let folders = match drain_pages(|token| self.manager.list_folders(&parent, token)) {
            Ok(folders) => folders,
            // Below the starting point an unreadable folder only hides its own subtree
            Err(err) if err.is_permission_denied() && !root => {
                tracing::warn!("permission denied listing folders under {parent}");
                return Ok(());
            }
            Err(err) => return Err(upstream_error(LOADER, parent)(err)),
        };
        tracing::debug!("list_folders({parent}) returned {} records", folders.len());

        let projects = match drain_pages(|token| self.manager.list_projects(&parent, token)) {
            Ok(projects) => projects,
            Err(err) if err.is_permission_denied() && !root => {
                tracing::warn!("permission denied listing projects under {parent}");
                Vec::new()
            }
            Err(err) => return Err(upstream_error(LOADER, parent)(err)),
        };
        tracing::debug!("list_projects({parent}) returned {} records", projects.len());

        out.projects
            .extend(projects.into_iter().filter(|p| p.lifecycle_state.is_active()));

        for folder in folders {
            if !folder.lifecycle_state.is_active() {
                tracing::debug!("dropping {} in state {}", folder.name, folder.lifecycle_state);
                continue;
            }
            let name = folder.name;
            out.folders.push(folder);
            if recursive {
                self.walk(name, recursive, false, visited, out)?;
            }
        }
        Ok(())
    }
}

impl<R: ResourceManager + ?Sized> DescendantLoader for IterativeLoader<'_, R> {
    fn mode(&self) -> LoadMode {
        LoadMode::Iterative
    }

    fn fetch_descendants(
        &self,
        org: Option<&Organization>,
        target: Option<&ResourceName>,
        recursive: bool,
    ) -> HierarchyResult<Descendants> {
        let start = match (target, org) {
            (Some(target), _) => *target,
            (None, Some(org)) => org.name,
            (None, None) => return Ok(Descendants::default()),
        };
        if start.is_project() {
            return Ok(Descendants::default());
        }

        let mut out = Descendants::default();
        self.walk(start, recursive, true, &mut HashSet::new(), &mut out)?;
        Ok(out)
    }
}
