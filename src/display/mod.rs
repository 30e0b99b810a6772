//! Terminal display utilities for CLI output.
//!
//! Provides styled tables and tree rendering for hierarchies.

pub mod tables;
pub mod theme;
pub mod tree;

pub use tables::{TableBuilder, create_cache_info_table, create_listing_table};
pub use theme::{THEME, Theme};
pub use tree::{TreeOptions, render_tree};
