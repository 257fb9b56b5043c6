//! Version-control publishing through the whitelisted git executor
//!
//! The sequence mirrors a manual release: init if needed, stage everything,
//! commit, force-move the release tag, make sure `origin` exists, then
//! force-push the branch and the tag. The token only ever appears in the
//! remote URL and is masked in every message that leaves this module.

use crate::core::config::PipelineConfig;
use crate::core::error::ReleaseError;
use crate::security::{SafeCommandExecutor, SecureTokenManager};
use secrecy::ExposeSecret;
use std::path::Path;
use tracing::info;

/// Commit message of a release
pub fn commit_message(config: &PipelineConfig) -> String {
    format!("Release {} v{}", config.project.name, config.project.version)
}

/// HTTPS remote URL embedding the token
pub fn remote_url(token: &str, config: &PipelineConfig) -> String {
    format!(
        "https://{}@github.com/{}.git",
        token,
        config.repository_slug()
    )
}

/// Whether git reported an empty commit
fn nothing_to_commit(output: &std::process::Output) -> bool {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    stdout.contains("nothing to commit") || stderr.contains("nothing to commit")
}

/// Publishes the working tree to the configured repository
pub struct GitPublisher {
    executor: SafeCommandExecutor,
    tokens: SecureTokenManager,
}

impl GitPublisher {
    pub fn new(project_root: &Path, tokens: SecureTokenManager) -> Result<Self, ReleaseError> {
        Ok(Self {
            executor: SafeCommandExecutor::new(project_root)?,
            tokens,
        })
    }

    /// Run the full publish sequence, returning the log lines worth showing
    pub fn publish(&self, config: &PipelineConfig) -> Result<Vec<String>, ReleaseError> {
        self.run(config).map_err(|e| self.masked(e))
    }

    fn run(&self, config: &PipelineConfig) -> Result<Vec<String>, ReleaseError> {
        let mut log = Vec::new();
        let tag = config.release_tag();

        if !self.executor.working_dir().join(".git").exists() {
            self.git(&["init"])?;
            log.push("Initialized git repository".to_string());
        }

        self.git(&["add", "."])?;

        let message = commit_message(config);
        let commit = self.executor.execute("git", &["commit", "-m", &message])?;
        if commit.status.success() {
            log.push(format!("Committed: {}", message));
        } else if nothing_to_commit(&commit) {
            log.push("Nothing new to commit".to_string());
        } else {
            return Err(ReleaseError::CommandError {
                message: format!(
                    "git commit exited with {}: {}",
                    commit.status,
                    String::from_utf8_lossy(&commit.stderr).trim()
                ),
            });
        }

        self.git(&["tag", "-f", &tag])?;
        log.push(format!("Tagged {}", tag));

        let origin = self.executor.execute("git", &["remote", "get-url", "origin"])?;
        if !origin.status.success() {
            let token = self.tokens.require_token()?;
            let url = remote_url(token.expose_secret(), config);
            self.git(&["remote", "add", "origin", &url])?;
            log.push(format!("Added remote origin {}", self.tokens.mask_tokens_in_string(&url)));
        }

        let branch = config.project.branch.as_str();
        self.git(&["push", "-u", "origin", branch, "--force"])?;
        self.git(&["push", "origin", &tag, "--force"])?;
        log.push(format!("Pushed {} and {} to {}", branch, tag, config.repository_slug()));

        info!(tag = %tag, "release pushed");
        Ok(log)
    }

    fn git(&self, args: &[&str]) -> Result<(), ReleaseError> {
        self.executor.run_checked("git", args).map(|_| ())
    }

    fn masked(&self, error: ReleaseError) -> ReleaseError {
        match error {
            ReleaseError::CommandError { message } => ReleaseError::CommandError {
                message: self.tokens.mask_tokens_in_string(&message),
            },
            other => other,
        }
    }
}
