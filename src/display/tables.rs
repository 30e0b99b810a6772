//! Table formatting utilities for structured output.

use crate::cache::CacheInfo;
use crate::resource::ResourceName;
use comfy_table::{Attribute, Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        // Apply rounded corners
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// Paths with their resource names, as printed by `ls --long`.
pub fn create_listing_table(entries: &[(String, ResourceName)]) -> String {
    entries
        .iter()
        .fold(
            TableBuilder::new().set_headers(vec!["Path", "Resource name"]),
            |table, (path, name)| table.add_row(vec![path.clone(), name.to_string()]),
        )
        .build()
}

/// Key/value view of the cache slot.
pub fn create_cache_info_table(info: &CacheInfo) -> String {
    fn or_dash<T: ToString>(value: Option<T>) -> String {
        value.map_or_else(|| "-".to_string(), |v| v.to_string())
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Field").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    table.add_row(vec!["Path".to_string(), info.path.display().to_string()]);
    table.add_row(vec!["Exists".to_string(), info.exists.to_string()]);
    if info.exists {
        table.add_row(vec!["Size (bytes)".to_string(), or_dash(info.size_bytes)]);
        table.add_row(vec!["Version".to_string(), or_dash(info.version)]);
        table.add_row(vec![
            "Created".to_string(),
            or_dash(info.created_at.map(|t| t.to_rfc3339())),
        ]);
        table.add_row(vec![
            "Age".to_string(),
            or_dash(info.age_secs.map(|s| format!("{}h {}m", s / 3600, (s % 3600) / 60))),
        ]);
        table.add_row(vec!["Fresh".to_string(), info.fresh.to_string()]);
        table.add_row(vec!["Scope".to_string(), or_dash(info.scope.as_ref())]);
        table.add_row(vec!["Organizations".to_string(), or_dash(info.organizations)]);
        table.add_row(vec!["Folders".to_string(), or_dash(info.folders)]);
        table.add_row(vec!["Projects".to_string(), or_dash(info.projects)]);
        if let Some(problem) = &info.problem {
            table.add_row(vec!["Problem".to_string(), problem.clone()]);
        }
    }

    table.to_string()
}
