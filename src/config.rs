//! Configuration module for gcpath.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `GCPATH_` and use double
//! underscores to separate nested levels:
//! - `GCPATH_LOADER__MODE=iterative` sets `loader.mode`
//! - `GCPATH_CACHE__TTL_HOURS=1` sets `cache.ttl_hours`
//! - `GCPATH_API__ACCESS_TOKEN=...` sets `api.access_token`

use crate::error::{HierarchyError, HierarchyResult};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Loader selection and paging
    #[serde(default)]
    pub loader: LoaderConfig,

    /// On-disk hierarchy cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Upstream API endpoints and credentials
    #[serde(default)]
    pub api: ApiConfig,
}

/// How descendants are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// One Cloud Asset query per kind
    #[default]
    Bulk,
    /// Recursive Resource Manager listings
    Iterative,
}

impl LoadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bulk => "bulk",
            Self::Iterative => "iterative",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoaderConfig {
    /// Default loading strategy
    #[serde(default)]
    pub mode: LoadMode,

    /// Page size requested from list and query calls
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Read and write the cache at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache file location; defaults to `<cache dir>/gcpath/cache.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Entries older than this are ignored; 0 disables expiry
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_resource_manager_endpoint")]
    pub resource_manager_endpoint: String,

    #[serde(default = "default_asset_endpoint")]
    pub asset_endpoint: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How many times to poll an unfinished asset query
    #[serde(default = "default_max_query_polls")]
    pub max_query_polls: u32,

    /// OAuth access token; when unset, `gcloud auth print-access-token` is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_page_size() -> u32 {
    500
}
fn default_ttl_hours() -> u64 {
    72
}
fn default_resource_manager_endpoint() -> String {
    "https://cloudresourcemanager.googleapis.com/v3".to_string()
}
fn default_asset_endpoint() -> String {
    "https://cloudasset.googleapis.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_query_polls() -> u32 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            loader: LoaderConfig::default(),
            cache: CacheConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            mode: LoadMode::Bulk,
            page_size: default_page_size(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            ttl_hours: default_ttl_hours(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            resource_manager_endpoint: default_resource_manager_endpoint(),
            asset_endpoint: default_asset_endpoint(),
            timeout_secs: default_timeout_secs(),
            max_query_polls: default_max_query_polls(),
            access_token: None,
        }
    }
}

impl CacheConfig {
    /// Resolved cache file location
    pub fn file_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("gcpath")
                .join("cache.json")
        })
    }

    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_hours > 0).then(|| Duration::from_secs(self.ttl_hours * 3600))
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Settings {
    /// Default settings file: `<config dir>/gcpath/settings.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gcpath")
            .join("settings.toml")
    }

    /// Load configuration from all sources
    pub fn load() -> HierarchyResult<Self> {
        Self::load_from(Self::default_config_path())
    }

    /// Load configuration from a specific file, then layer environment
    /// variables on top
    pub fn load_from(path: impl AsRef<Path>) -> HierarchyResult<Self> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels
            .merge(Env::prefixed("GCPATH_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
            .extract()
            .map_err(|e| HierarchyError::Config {
                reason: e.to_string(),
            })
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(
        path: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = path.as_ref().to_path_buf();

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r#"# gcpath configuration file

# Version of the configuration schema
version = 1

# Global debug mode
debug = false

[loader]
# "bulk" uses one Cloud Asset query per resource kind (fast, needs the
# Cloud Asset API and cloudasset.assets.queryAssets permission).
# "iterative" walks Resource Manager folder by folder (slower, no index).
mode = "bulk"

# Page size for list and query calls
page_size = 500

[cache]
# Reuse the last loaded hierarchy between invocations
enabled = true

# Cache file location (defaults to the platform cache directory)
# path = "/home/me/.cache/gcpath/cache.json"

# Ignore cached hierarchies older than this many hours (0 = never expire)
ttl_hours = 72

[api]
resource_manager_endpoint = "https://cloudresourcemanager.googleapis.com/v3"
asset_endpoint = "https://cloudasset.googleapis.com/v1"
timeout_secs = 60
max_query_polls = 30

# Access token; when unset, `gcloud auth print-access-token` is used
# access_token = "ya29...."
"#;

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }
}
