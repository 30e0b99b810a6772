//! Building a [`Hierarchy`] from loose records
//!
//! The builder accepts records in any order, drops anything that is not
//! `ACTIVE`, folds identical duplicates and rejects conflicting ones. `build`
//! then checks that every parent resolves inside the snapshot, that folder
//! chains end at an organization, and derives the child index.

use super::Hierarchy;
use crate::error::{HierarchyError, HierarchyResult};
use crate::loader::Descendants;
use crate::resource::{Folder, Organization, Project, ResourceKind, ResourceName};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    organizations: HashMap<ResourceName, Organization>,
    folders: HashMap<ResourceName, Folder>,
    projects: HashMap<ResourceName, Project>,
}

fn insert_unique<T>(map: &mut HashMap<ResourceName, T>, name: ResourceName, record: T) -> HierarchyResult<()>
where
    T: PartialEq + std::fmt::Debug,
{
    match map.get(&name) {
        Some(existing) if *existing == record => {
            tracing::debug!("dropping identical duplicate of {name}");
            Ok(())
        }
        Some(existing) => Err(HierarchyError::inconsistent(format!(
            "conflicting records for {name}: {existing:?} vs {record:?}"
        ))),
        None => {
            map.insert(name, record);
            Ok(())
        }
    }
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_organization(&mut self, org: Organization) -> HierarchyResult<()> {
        if !org.lifecycle_state.is_active() {
            tracing::debug!("excluding {} in state {}", org.name, org.lifecycle_state);
            return Ok(());
        }
        insert_unique(&mut self.organizations, org.name, org)
    }

    pub fn add_folder(&mut self, folder: Folder) -> HierarchyResult<()> {
        if !folder.lifecycle_state.is_active() {
            tracing::debug!("excluding {} in state {}", folder.name, folder.lifecycle_state);
            return Ok(());
        }
        insert_unique(&mut self.folders, folder.name, folder)
    }

    pub fn add_project(&mut self, project: Project) -> HierarchyResult<()> {
        if !project.lifecycle_state.is_active() {
            tracing::debug!("excluding {} in state {}", project.name, project.lifecycle_state);
            return Ok(());
        }
        insert_unique(&mut self.projects, project.name, project)
    }

    pub fn add_descendants(&mut self, descendants: Descendants) -> HierarchyResult<()> {
        for folder in descendants.folders {
            self.add_folder(folder)?;
        }
        for project in descendants.projects {
            self.add_project(project)?;
        }
        Ok(())
    }

    pub fn project_names(&self) -> HashSet<ResourceName> {
        self.projects.keys().copied().collect()
    }

    fn check_parent(&self, child: &ResourceName, parent: &ResourceName) -> HierarchyResult<()> {
        let present = match parent.kind() {
            ResourceKind::Organization => self.organizations.contains_key(parent),
            ResourceKind::Folder => self.folders.contains_key(parent),
            ResourceKind::Project => {
                return Err(HierarchyError::inconsistent(format!(
                    "{child} has a project as parent ({parent})"
                )));
            }
        };
        if present {
            Ok(())
        } else {
            Err(HierarchyError::inconsistent(format!(
                "{child} has parent {parent} which is not in the hierarchy"
            )))
        }
    }

    /// Every folder must reach an organization without revisiting itself
    fn check_folder_chains(&self) -> HierarchyResult<()> {
        let mut settled: HashSet<ResourceName> = HashSet::new();
        for start in self.folders.keys() {
            let mut trail = Vec::new();
            let mut current = *start;
            while current.is_folder() && !settled.contains(&current) {
                if trail.contains(&current) {
                    return Err(HierarchyError::inconsistent(format!(
                        "folder {current} is its own ancestor"
                    )));
                }
                trail.push(current);
                match self.folders.get(&current) {
                    Some(folder) => current = folder.parent,
                    None => break,
                }
            }
            settled.extend(trail);
        }
        Ok(())
    }

    pub fn build(self) -> HierarchyResult<Hierarchy> {
        for folder in self.folders.values() {
            self.check_parent(&folder.name, &folder.parent)?;
        }
        for project in self.projects.values() {
            if let Some(parent) = &project.parent {
                self.check_parent(&project.name, parent)?;
            }
        }
        self.check_folder_chains()?;

        let mut children: HashMap<ResourceName, Vec<ResourceName>> = HashMap::new();
        let mut organizationless = Vec::new();

        let mut folders: Vec<&Folder> = self.folders.values().collect();
        folders.sort_by(|a, b| (&a.display_name, a.name).cmp(&(&b.display_name, b.name)));
        for folder in folders {
            children.entry(folder.parent).or_default().push(folder.name);
        }

        let mut projects: Vec<&Project> = self.projects.values().collect();
        projects.sort_by(|a, b| (&a.display_name, a.name).cmp(&(&b.display_name, b.name)));
        for project in projects {
            match project.parent {
                Some(parent) => children.entry(parent).or_default().push(project.name),
                None => organizationless.push(project.name),
            }
        }

        tracing::debug!(
            "assembled hierarchy: {} organizations, {} folders, {} projects",
            self.organizations.len(),
            self.folders.len(),
            self.projects.len()
        );

        Ok(Hierarchy {
            organizations: self.organizations,
            folders: self.folders,
            projects: self.projects,
            children,
            organizationless,
        })
    }
}
