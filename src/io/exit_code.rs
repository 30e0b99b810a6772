//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success
//! - `1`: General error - unspecified failure
//! - `3-8`: Specific errors scripts can react to
//! - `126-255`: Reserved by shell

use crate::error::HierarchyError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Resource or path not found (code 3)
    NotFound = 3,

    /// Malformed resource name or path (code 4)
    InvalidInput = 4,

    /// Cache or file I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Loaded data violates the hierarchy rules (code 7)
    InconsistentHierarchy = 7,

    /// Upstream API failure (code 8)
    UpstreamError = 8,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Map a library error to the exit code scripts should see.
    pub fn from_error(error: &HierarchyError) -> Self {
        match error {
            HierarchyError::ResourceNotFound { .. } | HierarchyError::PathNotFound { .. } => {
                ExitCode::NotFound
            }
            HierarchyError::MalformedResourceName { .. } | HierarchyError::MalformedPath { .. } => {
                ExitCode::InvalidInput
            }
            HierarchyError::Cache { .. } => ExitCode::IoError,
            HierarchyError::Config { .. } => ExitCode::ConfigError,
            HierarchyError::InconsistentHierarchy { .. } => ExitCode::InconsistentHierarchy,
            HierarchyError::Upstream { .. } => ExitCode::UpstreamError,
            HierarchyError::UnparseableRow { .. } => ExitCode::GeneralError,
        }
    }

    /// Exit code for an `anyhow` error, looking through its chain for a
    /// [`HierarchyError`]
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        error
            .chain()
            .find_map(|cause| cause.downcast_ref::<HierarchyError>())
            .map_or(ExitCode::GeneralError, Self::from_error)
    }

    /// Check if this exit code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::NotFound => "Not found",
            ExitCode::InvalidInput => "Invalid input",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::InconsistentHierarchy => "Inconsistent hierarchy",
            ExitCode::UpstreamError => "Upstream API error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceName;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success as u8, 0);
        assert_eq!(ExitCode::GeneralError as u8, 1);
        assert_eq!(ExitCode::NotFound as u8, 3);
        assert_eq!(i32::from(ExitCode::UpstreamError), 8);
    }

    #[test]
    fn test_from_error() {
        let err = HierarchyError::not_found(&ResourceName::folder(1), "the loaded hierarchy");
        assert_eq!(ExitCode::from_error(&err), ExitCode::NotFound);

        let err = HierarchyError::inconsistent("dangling parent");
        assert_eq!(ExitCode::from_error(&err), ExitCode::InconsistentHierarchy);

        let err = HierarchyError::Config {
            reason: "bad".to_string(),
        };
        assert_eq!(ExitCode::from_error(&err), ExitCode::ConfigError);
    }

    #[test]
    fn test_from_anyhow_finds_wrapped_error() {
        let err = anyhow::Error::new(HierarchyError::MalformedPath {
            path: "x".to_string(),
            reason: "paths start with '//'".to_string(),
        })
        .context("resolving path");
        assert_eq!(ExitCode::from_anyhow(&err), ExitCode::InvalidInput);

        let plain = anyhow::anyhow!("something else");
        assert_eq!(ExitCode::from_anyhow(&plain), ExitCode::GeneralError);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(ExitCode::IoError.description(), "I/O error");
        assert!(ExitCode::Success.is_success());
    }
}
