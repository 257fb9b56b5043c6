//! Whitelisted command execution for version-control publishing
//!
//! Commands run through `std::process::Command` with arguments passed as a
//! vector, never through a shell, and only binaries on the whitelist may run.

use crate::core::error::ReleaseError;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Commands the release pipeline is allowed to run
const ALLOWED_COMMANDS: &[&str] = &["git"];

/// Command executor bound to one working directory
#[derive(Debug, Clone)]
pub struct SafeCommandExecutor {
    working_dir: PathBuf,
}

impl SafeCommandExecutor {
    /// Create an executor for an existing directory
    ///
    /// # Errors
    ///
    /// Returns `ReleaseError::CommandError` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, ReleaseError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.is_dir() {
            return Err(ReleaseError::CommandError {
                message: format!(
                    "Working directory does not exist: {}",
                    working_dir.display()
                ),
            });
        }

        Ok(Self { working_dir })
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Run a whitelisted command and capture its output
    ///
    /// A non-zero exit status is not an error here; see [`Self::run_checked`].
    pub fn execute(&self, command: &str, args: &[&str]) -> Result<Output, ReleaseError> {
        if !ALLOWED_COMMANDS.contains(&command) {
            return Err(ReleaseError::CommandError {
                message: format!("Command '{}' is not in the allowed whitelist", command),
            });
        }

        debug!(command, args = args.len(), "executing command");

        Command::new(command)
            .args(args)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| ReleaseError::CommandError {
                message: format!("{} failed to start: {}", command, e),
            })
    }

    /// Run a whitelisted command and fail on a non-zero exit status
    ///
    /// The error message carries stderr, which callers must mask if the
    /// arguments contained a credential.
    pub fn run_checked(&self, command: &str, args: &[&str]) -> Result<Output, ReleaseError> {
        let output = self.execute(command, args)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReleaseError::CommandError {
                message: format!(
                    "{} {} exited with {}: {}",
                    command,
                    args.first().copied().unwrap_or_default(),
                    output.status,
                    stderr.trim()
                ),
            });
        }

        Ok(output)
    }
}
