//! Cloud Asset SQL statements for folders and projects

use crate::parsing::asset::ASSET_NAME_PREFIX;
use crate::resource::{ResourceKind, ResourceName};

const FOLDER_TABLE: &str = "cloudresourcemanager_googleapis_com_Folder";
const PROJECT_TABLE: &str = "cloudresourcemanager_googleapis_com_Project";

/// Restriction applied on top of the ACTIVE lifecycle filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetFilter {
    /// Everything under the query's organization
    All,
    /// Direct children of one resource (non-recursive)
    Parent(ResourceName),
    /// Every descendant of one resource, excluding the resource itself
    Ancestor(ResourceName),
}

/// One `queryAssets` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetQuery {
    /// Organization the query runs against; the Asset API requires one
    pub organization: ResourceName,
    /// `Folder` or `Project`
    pub kind: ResourceKind,
    pub filter: AssetFilter,
}

impl AssetQuery {
    pub fn new(organization: ResourceName, kind: ResourceKind, filter: AssetFilter) -> Self {
        Self {
            organization,
            kind,
            filter,
        }
    }

    /// Render the SQL statement. Column order matches
    /// [`crate::parsing::asset::folder_columns`] and
    /// [`crate::parsing::asset::project_columns`].
    pub fn statement(&self) -> String {
        match self.kind {
            ResourceKind::Project => project_statement(self.filter),
            _ => folder_statement(self.filter),
        }
    }
}

fn folder_statement(filter: AssetFilter) -> String {
    let base = format!(
        "SELECT name, resource.data.displayName, resource.data.parent, \
         resource.data.lifecycleState, ancestors \
         FROM `{FOLDER_TABLE}` \
         WHERE resource.data.lifecycleState = 'ACTIVE'"
    );

    match filter {
        AssetFilter::All => base,
        AssetFilter::Parent(parent) => format!("{base} AND resource.data.parent = '{parent}'"),
        AssetFilter::Ancestor(ancestor) => format!(
            "{base} AND '{ancestor}' IN UNNEST(ancestors) \
             AND name != '{ASSET_NAME_PREFIX}{ancestor}'"
        ),
    }
}

fn project_statement(filter: AssetFilter) -> String {
    let base = format!(
        "SELECT name, resource.data.projectNumber, resource.data.projectId, \
         resource.data.displayName, resource.data.parent, \
         resource.data.lifecycleState, ancestors \
         FROM `{PROJECT_TABLE}` \
         WHERE resource.data.lifecycleState = 'ACTIVE'"
    );

    match filter {
        AssetFilter::All => base,
        // Project parents are STRUCT<type, id>
        AssetFilter::Parent(parent) => format!(
            "{base} AND resource.data.parent.type = '{}' AND resource.data.parent.id = '{}'",
            parent.kind().singular(),
            parent.id()
        ),
        AssetFilter::Ancestor(ancestor) => {
            format!("{base} AND '{ancestor}' IN UNNEST(ancestors)")
        }
    }
}
