//! Row parsing for the bulk (Cloud Asset) loader

pub mod asset;
pub mod row;

pub use asset::{ParsedRow, clean_asset_name, parse_folder_row, parse_parent, parse_project_row};
pub use row::RowValue;
