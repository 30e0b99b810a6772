//! Versioned on-disk snapshot of the last loaded hierarchy
//!
//! One JSON file holds one [`CacheEntry`]. A read only hits when the stored
//! schema version, the stored [`CacheKey`] and the entry's age all check out;
//! anything else is a miss with a [`CacheMiss`] reason, never an error.
//! Writes go to a temporary file in the same directory which is then renamed
//! over the slot.

use crate::config::{CacheConfig, LoadMode};
use crate::error::{HierarchyError, HierarchyResult};
use crate::hierarchy::{Hierarchy, HierarchyCounts};
use crate::resource::{Folder, Organization, Project, ResourceName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Bump when the entry layout changes; older files become misses
pub const CACHE_VERSION: u32 = 2;

/// What a hierarchy was loaded for. Only an equal key is served from cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheKey {
    pub mode: LoadMode,
    #[serde(default)]
    pub org_filter: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ResourceName>,
    pub recursive: bool,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} load of ", self.mode.as_str())?;
        match (&self.target, self.org_filter.is_empty()) {
            (Some(target), _) => write!(f, "{target}")?,
            (None, true) => f.write_str("all organizations")?,
            (None, false) => write!(f, "{}", self.org_filter.join(", "))?,
        }
        if !self.recursive {
            f.write_str(" (one level)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub scope: CacheKey,
    pub organizations: Vec<Organization>,
    pub folders: Vec<Folder>,
    pub projects: Vec<Project>,
}

impl CacheEntry {
    /// Snapshot `hierarchy`, every list ordered by resource name
    pub fn new(hierarchy: &Hierarchy, scope: CacheKey) -> Self {
        Self {
            version: CACHE_VERSION,
            created_at: Utc::now(),
            scope,
            organizations: hierarchy.organizations().into_iter().cloned().collect(),
            folders: hierarchy.folders().into_iter().cloned().collect(),
            projects: hierarchy.projects().into_iter().cloned().collect(),
        }
    }

    pub fn counts(&self) -> HierarchyCounts {
        HierarchyCounts {
            organizations: self.organizations.len(),
            folders: self.folders.len(),
            projects: self.projects.len(),
        }
    }

    pub fn age(&self) -> Duration {
        (Utc::now() - self.created_at).to_std().unwrap_or_default()
    }

    pub fn into_hierarchy(self) -> HierarchyResult<Hierarchy> {
        Hierarchy::from_records(self.organizations, self.folders, self.projects)
    }
}

/// Why a read did not produce a hierarchy
#[derive(Debug, Error)]
pub enum CacheMiss {
    #[error("no cache file")]
    Absent,

    #[error("cache file unreadable: {0}")]
    Unreadable(String),

    #[error("cache file corrupt: {0}")]
    Corrupt(String),

    #[error("cache version {found} does not match {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("cache holds a {stored}, wanted a {requested}")]
    ScopeMismatch { stored: String, requested: String },

    #[error("cache is {age_secs}s old, limit is {ttl_secs}s")]
    Expired { age_secs: u64, ttl_secs: u64 },

    #[error("cached hierarchy is inconsistent: {0}")]
    Inconsistent(String),
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Inspection of the cache slot without building a hierarchy
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub path: PathBuf,
    pub exists: bool,
    pub size_bytes: Option<u64>,
    pub version: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    pub age_secs: Option<u64>,
    /// Current version and within the TTL
    pub fresh: bool,
    pub scope: Option<CacheKey>,
    pub organizations: Option<usize>,
    pub folders: Option<usize>,
    pub projects: Option<usize>,
    /// Set when the file exists but cannot be used
    pub problem: Option<String>,
}

/// Single-slot hierarchy cache
#[derive(Debug, Clone)]
pub struct HierarchyCache {
    path: PathBuf,
    ttl: Option<Duration>,
}

impl HierarchyCache {
    /// `ttl` of `None` keeps entries forever
    pub fn new(path: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    /// Cache described by configuration, or `None` when caching is disabled
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.file_path(), config.ttl()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn cache_error(&self, reason: impl fmt::Display) -> HierarchyError {
        HierarchyError::Cache {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Read and version-check the stored entry, ignoring scope and age
    pub fn load_entry(&self) -> Result<CacheEntry, CacheMiss> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(CacheMiss::Absent),
            Err(e) => return Err(CacheMiss::Unreadable(e.to_string())),
        };

        let probe: VersionProbe =
            serde_json::from_slice(&bytes).map_err(|e| CacheMiss::Corrupt(e.to_string()))?;
        if probe.version != CACHE_VERSION {
            return Err(CacheMiss::VersionMismatch {
                found: probe.version,
                expected: CACHE_VERSION,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| CacheMiss::Corrupt(e.to_string()))
    }

    /// Look up a hierarchy for `key`, reporting why on a miss
    pub fn lookup(&self, key: &CacheKey) -> Result<Hierarchy, CacheMiss> {
        let entry = self.load_entry()?;

        if entry.scope != *key {
            return Err(CacheMiss::ScopeMismatch {
                stored: entry.scope.to_string(),
                requested: key.to_string(),
            });
        }

        if let Some(ttl) = self.ttl {
            let age = entry.age();
            if age > ttl {
                return Err(CacheMiss::Expired {
                    age_secs: age.as_secs(),
                    ttl_secs: ttl.as_secs(),
                });
            }
        }

        entry
            .into_hierarchy()
            .map_err(|e| CacheMiss::Inconsistent(e.to_string()))
    }

    /// Hierarchy for `key`, or `None` on any miss
    pub fn read(&self, key: &CacheKey) -> Option<Hierarchy> {
        match self.lookup(key) {
            Ok(hierarchy) => {
                tracing::debug!("cache hit for {key} at {}", self.path.display());
                Some(hierarchy)
            }
            Err(miss) => {
                tracing::debug!("cache miss for {key}: {miss}");
                None
            }
        }
    }

    /// Replace the slot with `hierarchy`
    pub fn write(&self, hierarchy: &Hierarchy, key: &CacheKey) -> HierarchyResult<()> {
        let entry = CacheEntry::new(hierarchy, key.clone());
        let bytes = serde_json::to_vec_pretty(&entry).map_err(|e| self.cache_error(e))?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.cache_error(e))?;

        // Write atomically (temp file + rename)
        let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.cache_error(e))?;
        temp.write_all(&bytes).map_err(|e| self.cache_error(e))?;
        temp.flush().map_err(|e| self.cache_error(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.cache_error(e.error))?;

        tracing::debug!(
            "wrote {} resources for {key} to {}",
            entry.counts().total(),
            self.path.display()
        );
        Ok(())
    }

    /// Remove the slot. Returns whether a file was removed.
    pub fn clear(&self) -> HierarchyResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.cache_error(e)),
        }
    }

    pub fn info(&self) -> CacheInfo {
        let size_bytes = std::fs::metadata(&self.path).ok().map(|m| m.len());
        let mut info = CacheInfo {
            path: self.path.clone(),
            exists: size_bytes.is_some(),
            size_bytes,
            version: None,
            created_at: None,
            age_secs: None,
            fresh: false,
            scope: None,
            organizations: None,
            folders: None,
            projects: None,
            problem: None,
        };
        if !info.exists {
            return info;
        }

        match self.load_entry() {
            Ok(entry) => {
                let age = entry.age();
                let counts = entry.counts();
                info.version = Some(entry.version);
                info.created_at = Some(entry.created_at);
                info.age_secs = Some(age.as_secs());
                info.fresh = self.ttl.is_none_or(|ttl| age <= ttl);
                info.organizations = Some(counts.organizations);
                info.folders = Some(counts.folders);
                info.projects = Some(counts.projects);
                info.scope = Some(entry.scope);
            }
            Err(miss) => {
                if let CacheMiss::VersionMismatch { found, .. } = &miss {
                    info.version = Some(*found);
                }
                info.problem = Some(miss.to_string());
            }
        }
        info
    }
}
