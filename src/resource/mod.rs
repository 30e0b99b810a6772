//! Resource model: organizations, folders and projects
//!
//! Parent links are stored as [`ResourceName`] values and resolved through the
//! owning [`Hierarchy`](crate::hierarchy::Hierarchy), never as pointers.

pub mod name;

pub use name::{ResourceKind, ResourceName};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state as reported by Resource Manager.
///
/// Only [`LifecycleState::Active`] resources make it into a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    #[default]
    Active,
    DeleteRequested,
    #[serde(untagged)]
    Other(String),
}

impl LifecycleState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "ACTIVE" => Self::Active,
            "DELETE_REQUESTED" => Self::DeleteRequested,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("ACTIVE"),
            Self::DeleteRequested => f.write_str("DELETE_REQUESTED"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub name: ResourceName,
    /// Domain name, used as the first path segment
    pub display_name: String,
    #[serde(default)]
    pub lifecycle_state: LifecycleState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub name: ResourceName,
    pub display_name: String,
    #[serde(default)]
    pub lifecycle_state: LifecycleState,
    /// Organization or folder
    pub parent: ResourceName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: ResourceName,
    /// User-chosen project id, e.g. `my-backend-prod`
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_number: Option<u64>,
    pub display_name: String,
    #[serde(default)]
    pub lifecycle_state: LifecycleState,
    /// `None` for organizationless projects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ResourceName>,
}

impl Organization {
    pub fn new(name: ResourceName, display_name: impl Into<String>) -> Self {
        Self {
            name,
            display_name: display_name.into(),
            lifecycle_state: LifecycleState::Active,
        }
    }
}

impl Folder {
    pub fn new(name: ResourceName, display_name: impl Into<String>, parent: ResourceName) -> Self {
        Self {
            name,
            display_name: display_name.into(),
            lifecycle_state: LifecycleState::Active,
            parent,
        }
    }
}

impl Project {
    pub fn new(
        name: ResourceName,
        project_id: impl Into<String>,
        display_name: impl Into<String>,
        parent: Option<ResourceName>,
    ) -> Self {
        Self {
            name,
            project_id: project_id.into(),
            project_number: Some(name.id()),
            display_name: display_name.into(),
            lifecycle_state: LifecycleState::Active,
            parent,
        }
    }

    pub fn is_organizationless(&self) -> bool {
        self.parent.is_none()
    }
}

/// Borrowed view over any resource held by a hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource<'a> {
    Organization(&'a Organization),
    Folder(&'a Folder),
    Project(&'a Project),
}

impl<'a> Resource<'a> {
    pub fn name(&self) -> ResourceName {
        match self {
            Self::Organization(o) => o.name,
            Self::Folder(f) => f.name,
            Self::Project(p) => p.name,
        }
    }

    pub fn display_name(&self) -> &'a str {
        match self {
            Self::Organization(o) => &o.display_name,
            Self::Folder(f) => &f.display_name,
            Self::Project(p) => &p.display_name,
        }
    }

    pub fn parent(&self) -> Option<ResourceName> {
        match self {
            Self::Organization(_) => None,
            Self::Folder(f) => Some(f.parent),
            Self::Project(p) => p.parent,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.name().kind()
    }
}
