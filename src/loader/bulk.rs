//! Bulk loading through Cloud Asset `queryAssets`

use super::{DescendantLoader, Descendants, upstream_error};
use crate::config::LoadMode;
use crate::error::HierarchyResult;
use crate::parsing::{ParsedRow, parse_folder_row, parse_project_row};
use crate::resource::{Organization, ResourceKind, ResourceName};
use crate::upstream::{AssetFilter, AssetInventory, AssetQuery, drain_pages};
use serde_json::Value;

const LOADER: &str = "bulk";

/// One filtered query per kind, every page drained before returning
pub struct BulkLoader<'a, A: AssetInventory + ?Sized> {
    inventory: &'a A,
}

impl<'a, A: AssetInventory + ?Sized> BulkLoader<'a, A> {
    pub fn new(inventory: &'a A) -> Self {
        Self { inventory }
    }

    fn run(&self, query: &AssetQuery) -> HierarchyResult<Vec<Value>> {
        let scope = match query.filter {
            AssetFilter::All => query.organization,
            AssetFilter::Parent(name) | AssetFilter::Ancestor(name) => name,
        };
        tracing::debug!("queryAssets {}: {}", query.organization, query.statement());
        let rows = drain_pages(|token| self.inventory.query_assets(query, token))
            .map_err(upstream_error(LOADER, scope))?;
        tracing::debug!("queryAssets returned {} {} rows", rows.len(), query.kind);
        Ok(rows)
    }
}

/// Parse every row with `parse`, dropping and counting the ones that fail
fn parse_rows<F>(rows: &[Value], kind: ResourceKind, parse: F) -> (Vec<ParsedRow>, usize)
where
    F: Fn(&Value) -> HierarchyResult<ParsedRow>,
{
    let mut skipped = 0;
    let mut parsed = Vec::with_capacity(rows.len());
    for row in rows {
        match parse(row) {
            Ok(row) if row.lifecycle_state.is_active() => parsed.push(row),
            Ok(row) => {
                tracing::debug!("dropping {} in state {}", row.name, row.lifecycle_state);
            }
            Err(e) => {
                tracing::warn!("skipping {kind} row: {e}");
                skipped += 1;
            }
        }
    }
    (parsed, skipped)
}

impl<A: AssetInventory + ?Sized> DescendantLoader for BulkLoader<'_, A> {
    fn mode(&self) -> LoadMode {
        LoadMode::Bulk
    }

    fn fetch_descendants(
        &self,
        org: Option<&Organization>,
        target: Option<&ResourceName>,
        recursive: bool,
    ) -> HierarchyResult<Descendants> {
        // The Asset API needs an organization to query against
        let Some(org) = org else {
            tracing::debug!("bulk loader has no organization to query, returning nothing");
            return Ok(Descendants::default());
        };
        if target.is_some_and(ResourceName::is_project) {
            return Ok(Descendants::default());
        }

        let filter = match (target, recursive) {
            (None, true) => AssetFilter::All,
            (None, false) => AssetFilter::Parent(org.name),
            (Some(target), true) => AssetFilter::Ancestor(*target),
            (Some(target), false) => AssetFilter::Parent(*target),
        };
        // Used only when a row carries neither a parent nor ancestors
        let default_parent = match filter {
            AssetFilter::Parent(parent) => parent,
            _ => org.name,
        };

        let mut descendants = Descendants::default();

        let rows = self.run(&AssetQuery::new(org.name, ResourceKind::Folder, filter))?;
        let (parsed, skipped) = parse_rows(&rows, ResourceKind::Folder, parse_folder_row);
        descendants.skipped_rows += skipped;
        for row in parsed {
            match row.into_folder(Some(default_parent)) {
                Ok(folder) => descendants.folders.push(folder),
                Err(e) => {
                    tracing::warn!("skipping folder row: {e}");
                    descendants.skipped_rows += 1;
                }
            }
        }

        let rows = self.run(&AssetQuery::new(org.name, ResourceKind::Project, filter))?;
        let (parsed, skipped) = parse_rows(&rows, ResourceKind::Project, parse_project_row);
        descendants.skipped_rows += skipped;
        descendants.projects.extend(
            parsed
                .into_iter()
                .map(|row| row.into_project(Some(default_parent))),
        );

        if descendants.skipped_rows > 0 {
            tracing::warn!(
                "{} unparseable rows skipped while loading {}",
                descendants.skipped_rows,
                target.copied().unwrap_or(org.name)
            );
        }
        Ok(descendants)
    }
}
