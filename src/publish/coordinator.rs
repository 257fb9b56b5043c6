//! GitHub + jsDelivr implementation of [`PublishCoordinator`]

use super::cdn::{self, Availability};
use super::git::GitPublisher;
use super::github::GitHubClient;
use crate::core::config::PipelineConfig;
use crate::core::error::ReleaseError;
use crate::core::traits::{Outcome, PublishCoordinator};
use crate::orchestration::reporter::Reporter;
use crate::security::SecureTokenManager;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Publishes to a GitHub repository served through jsDelivr
pub struct GitHubCoordinator {
    config: Arc<PipelineConfig>,
    project_root: PathBuf,
    reporter: Arc<dyn Reporter>,
    tokens: SecureTokenManager,
    github: GitHubClient,
}

impl GitHubCoordinator {
    pub fn new<P: AsRef<Path>>(
        config: Arc<PipelineConfig>,
        project_root: P,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self, ReleaseError> {
        let tokens = SecureTokenManager::new(&config.publish.token_env);
        let github = GitHubClient::new(&config.publish.api_base_url)?;

        Ok(Self {
            project_root: project_root.as_ref().to_path_buf(),
            config,
            reporter,
            tokens,
            github,
        })
    }
}

#[async_trait]
impl PublishCoordinator for GitHubCoordinator {
    async fn validate_credentials(&self) -> anyhow::Result<Outcome> {
        let Some(token) = self.tokens.get_token() else {
            let error = ReleaseError::TokenMissing {
                variable: self.tokens.token_name().to_string(),
            };
            for action in error.suggested_actions() {
                self.reporter.info(action);
            }
            return Ok(Outcome::fail(error.to_string()));
        };

        match self.github.authenticated_login(&token).await? {
            Some(login) => {
                self.reporter.info(&format!("Authenticated as {}", login));
                Ok(Outcome::Pass)
            }
            None => Ok(Outcome::fail(
                ReleaseError::AuthenticationFailed {
                    message: "GitHub rejected the token".to_string(),
                }
                .to_string(),
            )),
        }
    }

    async fn check_repository(&self) -> anyhow::Result<Outcome> {
        let token = self.tokens.require_token()?;
        let slug = self.config.repository_slug();

        match self.github.repository_full_name(&token, &slug).await? {
            Some(full_name) => {
                self.reporter.info(&format!("Repository found: {}", full_name));
                Ok(Outcome::Pass)
            }
            None => {
                self.reporter.info("You'll need to create it first on GitHub");
                Ok(Outcome::fail(
                    ReleaseError::RepositoryNotFound { repository: slug }.to_string(),
                ))
            }
        }
    }

    async fn announce_purge(&self) -> anyhow::Result<Outcome> {
        self.reporter
            .info(&format!("New CDN URL: {}", self.config.cdn_url()));
        self.reporter
            .info("jsDelivr picks up the new tag within 12-24 hours");
        self.reporter.info(&format!(
            "Force purge: {}",
            self.config.publish.purge_tool_url
        ));
        Ok(Outcome::Pass)
    }

    async fn emit_workflow(&self) -> anyhow::Result<Outcome> {
        let publish = &self.config.publish;
        cdn::write_workflow(
            &self.project_root,
            &publish.workflow_path,
            &self.config.project.branch,
            &publish.entry_point,
        )?;

        self.reporter
            .info(&format!("GitHub Action created: {}", publish.workflow_path));
        self.reporter.info(&format!(
            "CDN will auto-update on every push to {} or new tag",
            self.config.project.branch
        ));
        Ok(Outcome::Pass)
    }

    async fn publish_release(&self) -> anyhow::Result<Outcome> {
        let publisher = GitPublisher::new(&self.project_root, self.tokens.clone())?;

        for line in publisher.publish(&self.config)? {
            self.reporter.info(&line);
        }
        Ok(Outcome::Pass)
    }

    async fn verify_availability(&self) -> anyhow::Result<Outcome> {
        let url = self.config.cdn_url();
        let timeout = Duration::from_secs(self.config.publish.availability_timeout_secs);

        self.reporter.info(&format!("Testing URL: {}", url));
        match cdn::probe(&url, timeout).await {
            Availability::Available(status) => {
                self.reporter
                    .info(&format!("CDN URL is accessible (HTTP {})", status));
            }
            Availability::Pending(status) => self.reporter.warning(&format!(
                "CDN not yet available (HTTP {}); it may take a few minutes",
                status
            )),
            Availability::Unreachable(reason) => self
                .reporter
                .warning(&format!("Could not verify CDN: {}", reason)),
        }

        // Availability never gates the release
        Ok(Outcome::Pass)
    }
}
