//! Parsing of Cloud Asset `queryAssets` rows into typed records
//!
//! Column order follows the SELECT lists in [`crate::upstream::query`]. Rows
//! that arrive keyed by column name instead of positionally are accepted
//! too.

use super::row::RowValue;
use crate::error::{HierarchyError, HierarchyResult};
use crate::resource::{Folder, LifecycleState, Project, ResourceKind, ResourceName};
use serde_json::Value;

/// Prefix carried by full asset names
pub const ASSET_NAME_PREFIX: &str = "//cloudresourcemanager.googleapis.com/";

/// Folder columns: name, displayName, parent, lifecycleState, ancestors
pub mod folder_columns {
    pub const NAME: usize = 0;
    pub const DISPLAY_NAME: usize = 1;
    pub const PARENT: usize = 2;
    pub const LIFECYCLE_STATE: usize = 3;
    pub const ANCESTORS: usize = 4;
}

/// Project columns: name, projectNumber, projectId, displayName, parent,
/// lifecycleState, ancestors
pub mod project_columns {
    pub const NAME: usize = 0;
    pub const PROJECT_NUMBER: usize = 1;
    pub const PROJECT_ID: usize = 2;
    pub const DISPLAY_NAME: usize = 3;
    pub const PARENT: usize = 4;
    pub const LIFECYCLE_STATE: usize = 5;
    pub const ANCESTORS: usize = 6;
}

/// Strip the `//cloudresourcemanager.googleapis.com/` prefix if present
pub fn clean_asset_name(name: &str) -> &str {
    name.strip_prefix(ASSET_NAME_PREFIX).unwrap_or(name)
}

/// One row after field extraction, before it becomes a [`Folder`] or [`Project`]
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub name: ResourceName,
    pub display_name: Option<String>,
    pub lifecycle_state: LifecycleState,
    /// Parent taken from the direct `resource.data.parent` column
    pub parent: Option<ResourceName>,
    /// Ancestors as listed by the inventory, usually starting with self
    pub ancestors: Vec<ResourceName>,
    pub project_id: Option<String>,
    pub project_number: Option<u64>,
}

impl ParsedRow {
    /// Direct parent if present, otherwise the first ancestor after self
    pub fn resolved_parent(&self) -> Option<ResourceName> {
        self.parent
            .or_else(|| self.ancestors.iter().copied().find(|a| *a != self.name))
    }

    /// Turn a folder row into a [`Folder`], falling back to `default_parent`
    /// when neither the parent column nor the ancestors say anything.
    pub fn into_folder(self, default_parent: Option<ResourceName>) -> HierarchyResult<Folder> {
        let parent = self
            .resolved_parent()
            .or(default_parent)
            .ok_or_else(|| HierarchyError::UnparseableRow {
                kind: "folder",
                reason: format!("no parent for {}", self.name),
            })?;
        let display_name = self
            .display_name
            .unwrap_or_else(|| self.name.id().to_string());
        Ok(Folder {
            name: self.name,
            display_name,
            lifecycle_state: self.lifecycle_state,
            parent,
        })
    }

    /// Turn a project row into a [`Project`]. A project without any parent
    /// information is organizationless unless `default_parent` says otherwise.
    pub fn into_project(self, default_parent: Option<ResourceName>) -> Project {
        let parent = self.resolved_parent().or(default_parent);
        let project_id = self
            .project_id
            .clone()
            .unwrap_or_else(|| self.name.id().to_string());
        let display_name = self
            .display_name
            .clone()
            .unwrap_or_else(|| project_id.clone());
        Project {
            name: self.name,
            project_id,
            project_number: self.project_number.or(Some(self.name.id())),
            display_name,
            lifecycle_state: self.lifecycle_state,
            parent,
        }
    }
}

fn parse_name(value: Option<RowValue<'_>>, kind: ResourceKind) -> HierarchyResult<ResourceName> {
    let label = kind.singular();
    let raw = value
        .and_then(|v| v.as_str())
        .ok_or_else(|| HierarchyError::UnparseableRow {
            kind: label,
            reason: "missing name column".to_string(),
        })?;

    let name =
        ResourceName::parse(clean_asset_name(raw)).map_err(|_| HierarchyError::UnparseableRow {
            kind: label,
            reason: format!("unrecognized resource name '{raw}'"),
        })?;

    if name.kind() != kind {
        return Err(HierarchyError::UnparseableRow {
            kind: label,
            reason: format!("expected a {label} but got '{name}'"),
        });
    }
    Ok(name)
}

/// Parent column: `"folders/1"`, `{"type": "folder", "id": "1"}` or the
/// enveloped struct `{"f": [{"v": "folder"}, {"v": "1"}]}`.
pub fn parse_parent(value: Option<RowValue<'_>>) -> Option<ResourceName> {
    let value = value?.unwrap_v();
    if value.is_null() {
        return None;
    }

    if let Some(raw) = value.as_str() {
        return ResourceName::parse(clean_asset_name(raw)).ok();
    }

    let kind = value
        .field(0, &["type", "parentType"])
        .and_then(|t| t.as_str())
        .and_then(ResourceKind::from_collection)?;
    let id = value.field(1, &["id", "parentId"]).and_then(|i| i.as_u64())?;
    Some(ResourceName::new(kind, id))
}

fn parse_ancestors(value: Option<RowValue<'_>>) -> Vec<ResourceName> {
    let Some(items) = value.and_then(|v| v.as_list()) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.as_str())
        .filter_map(|raw| match ResourceName::parse(clean_asset_name(raw)) {
            Ok(name) => Some(name),
            Err(_) => {
                tracing::debug!("ignoring unrecognized ancestor '{raw}'");
                None
            }
        })
        .collect()
}

fn parse_state(value: Option<RowValue<'_>>) -> LifecycleState {
    value
        .and_then(|v| v.as_str())
        .map(LifecycleState::parse)
        .unwrap_or_default()
}

/// Parse a folder row
pub fn parse_folder_row(row: &Value) -> HierarchyResult<ParsedRow> {
    use folder_columns::*;
    let row = RowValue::new(row);

    let name = parse_name(row.field(NAME, &["name"]), ResourceKind::Folder)?;
    Ok(ParsedRow {
        name,
        display_name: row
            .field(DISPLAY_NAME, &["displayName", "display_name"])
            .and_then(|v| v.as_str())
            .map(str::to_string),
        lifecycle_state: parse_state(row.field(LIFECYCLE_STATE, &["lifecycleState", "state"])),
        parent: parse_parent(row.field(PARENT, &["parent"])),
        ancestors: parse_ancestors(row.field(ANCESTORS, &["ancestors"])),
        project_id: None,
        project_number: None,
    })
}

/// Parse a project row
pub fn parse_project_row(row: &Value) -> HierarchyResult<ParsedRow> {
    use project_columns::*;
    let row = RowValue::new(row);

    let name = parse_name(row.field(NAME, &["name"]), ResourceKind::Project)?;
    Ok(ParsedRow {
        name,
        display_name: row
            .field(DISPLAY_NAME, &["displayName", "display_name"])
            .and_then(|v| v.as_str())
            .map(str::to_string),
        lifecycle_state: parse_state(row.field(LIFECYCLE_STATE, &["lifecycleState", "state"])),
        parent: parse_parent(row.field(PARENT, &["parent"])),
        ancestors: parse_ancestors(row.field(ANCESTORS, &["ancestors"])),
        project_id: row
            .field(PROJECT_ID, &["projectId", "project_id"])
            .and_then(|v| v.as_str())
            .map(str::to_string),
        project_number: row
            .field(PROJECT_NUMBER, &["projectNumber", "project_number"])
            .and_then(|v| v.as_u64()),
    })
}
