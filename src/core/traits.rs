//! Core traits and types for the release pipeline
//!
//! This module defines the step outcome, the step abstraction driven by the
//! pipeline runner, and the publish collaborator interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Outcome
// ============================================================================

/// Result of running one pipeline step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail(String),
    Error(String),
}

impl Outcome {
    pub fn fail(reason: impl Into<String>) -> Self {
        Outcome::Fail(reason.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Error(message.into())
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    /// Reason or message for non-Pass outcomes
    pub fn detail(&self) -> Option<&str> {
        match self {
            Outcome::Pass => None,
            Outcome::Fail(reason) => Some(reason),
            Outcome::Error(message) => Some(message),
        }
    }

    /// Short status label
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Fail(_) => "FAIL",
            Outcome::Error(_) => "ERROR",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{}: {}", self.label(), detail),
            None => write!(f, "{}", self.label()),
        }
    }
}

// ============================================================================
// Pipeline Step Trait
// ============================================================================

/// One named unit of work executed by the pipeline runner
///
/// An `Err` returned from `run` is converted by the runner into
/// [`Outcome::Error`], so implementations can use `?` freely.
///
/// # Examples
///
/// ```
/// # use cdn_release::core::{Outcome, PipelineStep};
/// # use async_trait::async_trait;
/// struct AlwaysPass;
///
/// #[async_trait]
/// impl PipelineStep for AlwaysPass {
///     fn name(&self) -> &str {
///         "Always Pass"
///     }
///
///     async fn run(&self) -> anyhow::Result<Outcome> {
///         Ok(Outcome::Pass)
///     }
/// }
/// ```
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// Step name shown in progress output and the summary
    fn name(&self) -> &str;

    /// Execute the step
    async fn run(&self) -> anyhow::Result<Outcome>;
}

// ============================================================================
// Publish Coordinator Trait
// ============================================================================

/// External collaborators that publish the bundle to hosting and the CDN
///
/// Every method maps onto one pipeline step. Implementations report their own
/// progress; the runner only looks at the returned outcome.
#[async_trait]
pub trait PublishCoordinator: Send + Sync {
    /// Check that the publish credential is present and accepted
    async fn validate_credentials(&self) -> anyhow::Result<Outcome>;

    /// Check that the target repository exists
    async fn check_repository(&self) -> anyhow::Result<Outcome>;

    /// Announce the versioned CDN URL and how stale copies get purged
    async fn announce_purge(&self) -> anyhow::Result<Outcome>;

    /// Emit the CDN auto-update workflow file
    async fn emit_workflow(&self) -> anyhow::Result<Outcome>;

    /// Commit, tag and push the release
    async fn publish_release(&self) -> anyhow::Result<Outcome>;

    /// Probe the CDN for the published entry point (never gating)
    async fn verify_availability(&self) -> anyhow::Result<Outcome>;
}
