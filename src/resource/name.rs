//! Canonical resource names: `organizations/<id>`, `folders/<id>`, `projects/<id>`

use crate::error::{HierarchyError, HierarchyResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The three kinds of node in a resource hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Organization,
    Folder,
    Project,
}

impl ResourceKind {
    /// Plural collection segment used in resource names
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Organization => "organizations",
            Self::Folder => "folders",
            Self::Project => "projects",
        }
    }

    /// Singular type name as it appears in Asset API parent structs
    pub fn singular(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Folder => "folder",
            Self::Project => "project",
        }
    }

    /// Accepts either form: `folders` or `folder`
    pub fn from_collection(segment: &str) -> Option<Self> {
        match segment {
            "organizations" | "organization" => Some(Self::Organization),
            "folders" | "folder" => Some(Self::Folder),
            "projects" | "project" => Some(Self::Project),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

/// A parsed, validated resource name.
///
/// Ordering is by kind, then numeric id, which gives stable iteration over
/// mixed sets of resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceName {
    kind: ResourceKind,
    id: u64,
}

impl ResourceName {
    pub fn new(kind: ResourceKind, id: u64) -> Self {
        Self { kind, id }
    }

    pub fn organization(id: u64) -> Self {
        Self::new(ResourceKind::Organization, id)
    }

    pub fn folder(id: u64) -> Self {
        Self::new(ResourceKind::Folder, id)
    }

    pub fn project(id: u64) -> Self {
        Self::new(ResourceKind::Project, id)
    }

    /// Parse `<kind>/<digits>`
    pub fn parse(name: &str) -> HierarchyResult<Self> {
        let malformed = || HierarchyError::MalformedResourceName {
            name: name.to_string(),
        };

        let (collection, id) = name.split_once('/').ok_or_else(malformed)?;
        // Only the plural form is canonical
        let kind = match collection {
            "organizations" => ResourceKind::Organization,
            "folders" => ResourceKind::Folder,
            "projects" => ResourceKind::Project,
            _ => return Err(malformed()),
        };

        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let id = id.parse::<u64>().map_err(|_| malformed())?;

        Ok(Self { kind, id })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_organization(&self) -> bool {
        self.kind == ResourceKind::Organization
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ResourceKind::Folder
    }

    pub fn is_project(&self) -> bool {
        self.kind == ResourceKind::Project
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.collection(), self.id)
    }
}

impl FromStr for ResourceName {
    type Err = HierarchyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
