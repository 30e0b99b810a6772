//! Cache-first loading of a [`Hierarchy`]

use super::{Hierarchy, HierarchyBuilder};
use crate::cache::{CacheKey, HierarchyCache};
use crate::config::{LoadMode, Settings};
use crate::error::{HierarchyError, HierarchyResult};
use crate::loader::{
    fetch_organizationless_projects, fetch_organizations, fetch_scope_chain, select_loader,
};
use crate::resource::{Organization, ResourceName};
use crate::upstream::CloudBackend;

/// What to load and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Organization display names to keep; empty keeps all
    pub org_filter: Vec<String>,
    /// Restrict loading to this resource and what lies below it
    pub target: Option<ResourceName>,
    /// Whole subtree rather than one level
    pub recursive: bool,
    pub mode: LoadMode,
    /// Skip the cache read (the result is still written)
    pub force_refresh: bool,
}

impl Default for LoadRequest {
    fn default() -> Self {
        Self {
            org_filter: Vec::new(),
            target: None,
            recursive: true,
            mode: LoadMode::default(),
            force_refresh: false,
        }
    }
}

impl LoadRequest {
    pub fn new(mode: LoadMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Request using the configured loader mode
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.loader.mode)
    }

    pub fn with_target(mut self, target: ResourceName) -> Self {
        self.target = Some(target);
        self
    }

    /// Keep only these organizations. Order and repeats do not matter.
    pub fn with_org_filter(mut self, mut display_names: Vec<String>) -> Self {
        display_names.sort();
        display_names.dedup();
        self.org_filter = display_names;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            mode: self.mode,
            org_filter: self.org_filter.clone(),
            target: self.target,
            recursive: self.recursive,
        }
    }
}

impl Hierarchy {
    /// Load a hierarchy, serving it from `cache` when possible.
    ///
    /// Cache problems never fail a load: misses fall through to the
    /// upstream services and write failures are only logged.
    pub fn load<B>(
        request: &LoadRequest,
        backend: &B,
        cache: Option<&HierarchyCache>,
    ) -> HierarchyResult<Self>
    where
        B: CloudBackend + ?Sized,
    {
        let key = request.cache_key();

        if let Some(cache) = cache {
            if request.force_refresh {
                tracing::debug!("forced refresh, skipping cache for {key}");
            } else if let Some(hierarchy) = cache.read(&key) {
                return Ok(hierarchy);
            }
        }

        let hierarchy = Self::fetch(request, backend)?;

        if let Some(cache) = cache {
            if let Err(e) = cache.write(&hierarchy, &key) {
                tracing::warn!("could not write hierarchy cache: {e}");
            }
        }
        Ok(hierarchy)
    }

    /// Load straight from the upstream services, bypassing any cache
    pub fn fetch<B>(request: &LoadRequest, backend: &B) -> HierarchyResult<Self>
    where
        B: CloudBackend + ?Sized,
    {
        let loader = select_loader(request.mode, backend);
        tracing::debug!("loading with the {} loader", loader.mode().as_str());

        let organizations = fetch_organizations(backend, &request.org_filter)?;
        let mut builder = HierarchyBuilder::new();

        match request.target {
            None => {
                for org in &organizations {
                    builder.add_organization(org.clone())?;
                    let descendants = loader.fetch_descendants(Some(org), None, request.recursive)?;
                    builder.add_descendants(descendants)?;
                }
                if request.org_filter.is_empty() {
                    let known = builder.project_names();
                    for project in fetch_organizationless_projects(backend, &known)? {
                        builder.add_project(project)?;
                    }
                }
            }
            Some(target) => {
                let chain = fetch_scope_chain(backend, &target)?;
                let org = Self::scope_organization(&organizations, chain.organization, &target)?;

                if let Some(org) = org {
                    builder.add_organization(org.clone())?;
                }
                for folder in chain.folders {
                    builder.add_folder(folder)?;
                }
                if let Some(project) = chain.project {
                    builder.add_project(project)?;
                }

                let descendants = loader.fetch_descendants(org, Some(&target), request.recursive)?;
                builder.add_descendants(descendants)?;
            }
        }

        builder.build()
    }

    /// The enumerated organization a scoped target belongs to
    fn scope_organization<'o>(
        organizations: &'o [Organization],
        wanted: Option<ResourceName>,
        target: &ResourceName,
    ) -> HierarchyResult<Option<&'o Organization>> {
        let Some(wanted) = wanted else {
            return Ok(None);
        };
        organizations
            .iter()
            .find(|org| org.name == wanted)
            .map(Some)
            .ok_or_else(|| HierarchyError::ResourceNotFound {
                name: wanted.to_string(),
                scope: format!("organizations visible to the caller (ancestor of {target})"),
            })
    }
}
