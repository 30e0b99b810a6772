//! Boundary to the two remote services the engine depends on
//!
//! - [`AssetInventory`]: Cloud Asset `queryAssets`, used by the bulk loader.
//! - [`ResourceManager`]: Cloud Resource Manager v3, used by the iterative
//!   loader and for the calls common to both modes.
//!
//! [`rest`] talks to the real services, [`memory`] is an in-process stand-in.

pub mod memory;
pub mod query;
pub mod rest;

pub use memory::MemoryCloud;
pub use rest::RestCloud;
pub use query::{AssetFilter, AssetQuery};

use crate::resource::{Folder, Organization, Project, ResourceName};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("permission denied on '{resource}'")]
    PermissionDenied { resource: String },

    #[error("'{resource}' not found")]
    NotFound { resource: String },

    #[error("HTTP {status} from {endpoint}: {message}")]
    Http {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("request to {endpoint} failed: {cause}")]
    Transport { endpoint: String, cause: String },

    #[error("could not decode response from {endpoint}: {cause}")]
    Decode { endpoint: String, cause: String },

    #[error("no access token available: {0}")]
    Auth(String),

    #[error("asset query did not finish after {attempts} polls")]
    QueryTimeout { attempts: u32 },
}

impl UpstreamError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// One page of a paginated listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }
}

/// Follow `next_page_token` until the listing is exhausted
pub fn drain_pages<T, F>(mut fetch: F) -> UpstreamResult<Vec<T>>
where
    F: FnMut(Option<&str>) -> UpstreamResult<Page<T>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = fetch(token.as_deref())?;
        items.extend(page.items);
        match page.next_page_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => return Ok(items),
        }
    }
}

/// Search/inventory API used by bulk mode
pub trait AssetInventory {
    /// Run one page of `query`. Rows are returned exactly as the service
    /// renders them; see [`crate::parsing`].
    fn query_assets(&self, query: &AssetQuery, page_token: Option<&str>) -> UpstreamResult<Page<Value>>;
}

/// Resource management API used by iterative mode and for organizations
pub trait ResourceManager {
    fn search_organizations(&self, page_token: Option<&str>) -> UpstreamResult<Page<Organization>>;

    fn list_folders(&self, parent: &ResourceName, page_token: Option<&str>) -> UpstreamResult<Page<Folder>>;

    fn list_projects(&self, parent: &ResourceName, page_token: Option<&str>) -> UpstreamResult<Page<Project>>;

    /// Every project the caller can see, regardless of parent
    fn search_projects(&self, page_token: Option<&str>) -> UpstreamResult<Page<Project>>;

    fn get_folder(&self, name: &ResourceName) -> UpstreamResult<Folder>;

    fn get_project(&self, name: &ResourceName) -> UpstreamResult<Project>;
}

/// Both services behind one handle, as the engine consumes them
pub trait CloudBackend: AssetInventory + ResourceManager {}

impl<T: AssetInventory + ResourceManager> CloudBackend for T {}
