//! Error types for the resource hierarchy engine
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use crate::resource::ResourceName;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for hierarchy operations
#[derive(Error, Debug)]
pub enum HierarchyError {
    /// Resource name does not match `<kind>/<digits>`
    #[error(
        "Malformed resource name '{name}': expected organizations/<id>, folders/<id> or projects/<id>"
    )]
    MalformedResourceName { name: String },

    /// Path does not follow the `//root/segment/...` grammar
    #[error("Malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    /// A bulk row whose resource name could not be recovered
    #[error("Unparseable {kind} row: {reason}")]
    UnparseableRow { kind: &'static str, reason: String },

    /// The assembled tree violates a structural invariant
    #[error("Inconsistent hierarchy: {reason}")]
    InconsistentHierarchy { reason: String },

    #[error("Resource '{name}' not found in {scope}")]
    ResourceNotFound { name: String, scope: String },

    #[error("Path '{path}' not found: no match for segment '{segment}' under {scope}")]
    PathNotFound {
        path: String,
        segment: String,
        scope: String,
    },

    /// Upstream API failure, wrapped with the loader and scope that issued it
    #[error("{loader} loader failed while loading {scope}: {source}")]
    Upstream {
        loader: &'static str,
        scope: String,
        #[source]
        source: crate::upstream::UpstreamError,
    },

    /// Cache read/write failures. `Hierarchy::load` logs and swallows these.
    #[error("Cache error at '{path}': {reason}")]
    Cache { path: PathBuf, reason: String },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl HierarchyError {
    pub fn inconsistent(reason: impl Into<String>) -> Self {
        Self::InconsistentHierarchy {
            reason: reason.into(),
        }
    }

    pub fn not_found(name: &ResourceName, scope: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            name: name.to_string(),
            scope: scope.into(),
        }
    }

    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::MalformedResourceName { .. } => "MALFORMED_RESOURCE_NAME",
            Self::MalformedPath { .. } => "MALFORMED_PATH",
            Self::UnparseableRow { .. } => "UNPARSEABLE_ROW",
            Self::InconsistentHierarchy { .. } => "INCONSISTENT_HIERARCHY",
            Self::ResourceNotFound { .. } => "RESOURCE_NOT_FOUND",
            Self::PathNotFound { .. } => "PATH_NOT_FOUND",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Cache { .. } => "CACHE_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::MalformedResourceName { .. } => vec![
                "Use the canonical form, e.g. 'folders/123456789'",
                "Use 'gcpath name <path>' to look up a resource name from a path",
            ],
            Self::MalformedPath { .. } => vec![
                "Paths start with '//' followed by an organization domain or '_'",
                "Escape '/' inside display names as '%2F'",
            ],
            Self::InconsistentHierarchy { .. } => vec![
                "Run the command again with --refresh to bypass the cache",
                "Try --iterative if the Cloud Asset index is stale",
            ],
            Self::ResourceNotFound { .. } | Self::PathNotFound { .. } => vec![
                "Run with --refresh in case the cached hierarchy is out of date",
                "Check that your account can see the resource",
            ],
            Self::Upstream { .. } => vec![
                "Run 'gcloud auth application-default login' and try again",
                "Use --iterative if the Cloud Asset API is not enabled",
            ],
            Self::Cache { .. } => vec![
                "Run 'gcpath cache clear' to remove the cache file",
                "Check permissions on the cache directory",
            ],
            Self::Config { .. } => vec![
                "Run 'gcpath init --force' to regenerate the settings file",
            ],
            Self::UnparseableRow { .. } => vec![],
        }
    }
}

/// Result type alias for hierarchy operations
pub type HierarchyResult<T> = Result<T, HierarchyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_stable() {
        let err = HierarchyError::inconsistent("dangling parent");
        assert_eq!(err.status_code(), "INCONSISTENT_HIERARCHY");
        assert!(!err.recovery_suggestions().is_empty());

        let err = HierarchyError::PathNotFound {
            path: "//example.com/x".to_string(),
            segment: "x".to_string(),
            scope: "organizations/1".to_string(),
        };
        assert_eq!(err.status_code(), "PATH_NOT_FOUND");
        assert!(err.to_string().contains("'x'"));
    }
}
