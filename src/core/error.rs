//! Error handling for the release pipeline
//!
//! This module provides the error taxonomy shared by every pipeline step,
//! with recovery guidance, using the thiserror crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad class of a release error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// A required artifact is missing or unreadable
    Structural,
    /// A gating heuristic condition is unmet
    Heuristic,
    /// A collaborator outside the core failed (network, git, credentials)
    External,
    /// The pipeline configuration is invalid
    Configuration,
}

/// Main error type for release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    // Structural errors
    #[error("Missing {} required artifact(s): {}", missing.len(), missing.join(", "))]
    MissingArtifacts { missing: Vec<String> },

    #[error("Artifact {path} could not be read: {message}")]
    ArtifactUnreadable { path: String, message: String },

    // Heuristic errors
    #[error("[{check}] gating checks failed: {}", failed.join(", "))]
    HeuristicFailed { check: String, failed: Vec<String> },

    // Bundle errors
    #[error("Bundle assembly failed: {message}")]
    BundleFailed { message: String },

    // External errors
    #[error("Environment variable {variable} is not set")]
    TokenMissing { variable: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Repository {repository} was not found")]
    RepositoryNotFound { repository: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Command error: {message}")]
    CommandError { message: String },

    #[error("Failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid pipeline state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl ReleaseError {
    /// Get the category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingArtifacts { .. } | Self::ArtifactUnreadable { .. } => {
                ErrorCategory::Structural
            }
            Self::HeuristicFailed { .. } => ErrorCategory::Heuristic,
            Self::BundleFailed { .. }
            | Self::TokenMissing { .. }
            | Self::AuthenticationFailed { .. }
            | Self::RepositoryNotFound { .. }
            | Self::NetworkError { .. }
            | Self::CommandError { .. }
            | Self::WriteFailed { .. } => ErrorCategory::External,
            Self::ConfigError(_) | Self::InvalidTransition { .. } => ErrorCategory::Configuration,
        }
    }

    /// Check if this error is recoverable by simply re-running the pipeline
    ///
    /// Structural and heuristic failures need a source change first.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::CommandError { .. } | Self::BundleFailed { .. }
        )
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::MissingArtifacts { .. } => vec![
                "Check that the command runs from the project root",
                "Restore the missing files or update the manifest in .release-config.yaml",
            ],
            Self::ArtifactUnreadable { .. } => {
                vec!["Check file permissions and that the file is valid UTF-8"]
            }
            Self::HeuristicFailed { .. } => vec![
                "Review the failed sub-checks printed above",
                "Fix the artifact source before releasing",
            ],
            Self::BundleFailed { .. } => vec![
                "Check that the output directory is writable",
                "Check free disk space",
            ],
            Self::TokenMissing { .. } => vec![
                "Export the token, e.g. export GITHUB_TOKEN='your_token_here'",
                "Create a token at https://github.com/settings/tokens",
            ],
            Self::AuthenticationFailed { .. } => vec![
                "Check that the token has not expired",
                "Check that the token has the repo scope",
            ],
            Self::RepositoryNotFound { .. } => vec![
                "Create the repository on GitHub first",
                "Check project.owner and project.name in the configuration",
            ],
            Self::NetworkError { .. } => vec![
                "Check the internet connection",
                "Wait a moment and run the pipeline again",
            ],
            Self::CommandError { .. } => vec![
                "Check the command output above",
                "Check that git is installed and on PATH",
            ],
            Self::WriteFailed { .. } => vec!["Check that the project directory is writable"],
            Self::ConfigError(_) => vec!["Fix .release-config.yaml and run again"],
            Self::InvalidTransition { .. } => vec!["Create a new pipeline for every run"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingArtifacts { .. } => "MISSING_ARTIFACTS",
            Self::ArtifactUnreadable { .. } => "ARTIFACT_UNREADABLE",
            Self::HeuristicFailed { .. } => "HEURISTIC_FAILED",
            Self::BundleFailed { .. } => "BUNDLE_FAILED",
            Self::TokenMissing { .. } => "TOKEN_MISSING",
            Self::AuthenticationFailed { .. } => "AUTHENTICATION_FAILED",
            Self::RepositoryNotFound { .. } => "REPOSITORY_NOT_FOUND",
            Self::NetworkError { .. } => "NETWORK_ERROR",
            Self::CommandError { .. } => "COMMAND_ERROR",
            Self::WriteFailed { .. } => "WRITE_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifacts_error() {
        let error = ReleaseError::MissingArtifacts {
            missing: vec!["src/index.js".to_string(), "src/utils/jwt.js".to_string()],
        };

        assert_eq!(error.category(), ErrorCategory::Structural);
        assert!(!error.is_recoverable());
        assert_eq!(error.code(), "MISSING_ARTIFACTS");
        let message = error.to_string();
        assert!(message.contains("Missing 2 required artifact(s)"));
        assert!(message.contains("src/utils/jwt.js"));
    }

    #[test]
    fn test_heuristic_failed_error() {
        let error = ReleaseError::HeuristicFailed {
            check: "Token Handling".to_string(),
            failed: vec!["Token expiration check".to_string()],
        };

        assert_eq!(error.category(), ErrorCategory::Heuristic);
        assert!(!error.is_recoverable());
        assert!(error.to_string().contains("[Token Handling]"));
    }

    #[test]
    fn test_network_error_is_recoverable() {
        let error = ReleaseError::NetworkError {
            message: "connection refused".to_string(),
        };

        assert_eq!(error.category(), ErrorCategory::External);
        assert!(error.is_recoverable());
        assert_eq!(error.code(), "NETWORK_ERROR");
    }

    #[test]
    fn test_token_missing_error() {
        let error = ReleaseError::TokenMissing {
            variable: "GITHUB_TOKEN".to_string(),
        };

        assert_eq!(error.category(), ErrorCategory::External);
        assert!(!error.is_recoverable());
        let actions = error.suggested_actions();
        assert!(actions.iter().any(|a| a.contains("GITHUB_TOKEN")));
    }

    #[test]
    fn test_config_error_display() {
        let error = ReleaseError::ConfigError("budgetBytes must be positive".to_string());

        assert_eq!(error.category(), ErrorCategory::Configuration);
        assert!(error.to_string().contains("budgetBytes"));
    }

    #[test]
    fn test_every_error_has_actions() {
        let errors = vec![
            ReleaseError::ArtifactUnreadable {
                path: "a".to_string(),
                message: "b".to_string(),
            },
            ReleaseError::BundleFailed {
                message: "disk full".to_string(),
            },
            ReleaseError::RepositoryNotFound {
                repository: "owner/repo".to_string(),
            },
            ReleaseError::CommandError {
                message: "git not found".to_string(),
            },
        ];

        for error in errors {
            assert!(!error.suggested_actions().is_empty(), "{}", error.code());
        }
    }
}
