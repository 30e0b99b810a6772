//! The main library module for gcpath
//!
//! Resolves Google Cloud resource hierarchies (organizations, folders,
//! projects) and translates between resource names such as `folders/123`
//! and paths such as `//example.com/engineering/backend`.

pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod hierarchy;
pub mod io;
pub mod loader;
pub mod logging;
pub mod parsing;
pub mod resource;
pub mod upstream;

// Explicit exports for better API clarity
pub use cache::{CACHE_VERSION, CacheEntry, CacheInfo, CacheKey, CacheMiss, HierarchyCache};
pub use config::{LoadMode, Settings};
pub use error::{HierarchyError, HierarchyResult};
pub use hierarchy::{Hierarchy, HierarchyBuilder, HierarchyCounts, LoadRequest};
pub use loader::{BulkLoader, DescendantLoader, Descendants, IterativeLoader};
pub use resource::{
    Folder, LifecycleState, Organization, Project, Resource, ResourceKind, ResourceName,
};
pub use upstream::{AssetInventory, CloudBackend, MemoryCloud, ResourceManager, RestCloud};
