//! CDN side of a release: the auto-update workflow and the availability probe

use crate::core::error::ReleaseError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// GitHub Actions workflow purging the jsDelivr cache on every push
///
/// `__BRANCH__` and `__ENTRY_POINT__` are filled in by [`render_workflow`];
/// everything else is written verbatim.
pub const WORKFLOW_TEMPLATE: &str = r#"name: CDN Auto-Update

on:
  push:
    branches: [ __BRANCH__ ]
    tags:
      - 'v*'

jobs:
  purge-cdn:
    runs-on: ubuntu-latest
    steps:
      - name: Purge jsdelivr cache
        run: |
          curl -X POST https://purge.jsdelivr.net/gh/${{ github.repository }}@${{ github.ref_name }}/__ENTRY_POINT__
          echo "CDN cache purged for ${{ github.ref_name }}"
"#;

pub fn render_workflow(branch: &str, entry_point: &str) -> String {
    WORKFLOW_TEMPLATE
        .replace("__BRANCH__", branch)
        .replace("__ENTRY_POINT__", entry_point)
}

/// Write the workflow file under `project_root`, creating parent directories
pub fn write_workflow(
    project_root: &Path,
    relative: &str,
    branch: &str,
    entry_point: &str,
) -> Result<PathBuf, ReleaseError> {
    let path = project_root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ReleaseError::WriteFailed {
            path: parent.display().to_string(),
            message: e.to_string(),
        })?;
    }

    fs::write(&path, render_workflow(branch, entry_point)).map_err(|e| {
        ReleaseError::WriteFailed {
            path: relative.to_string(),
            message: e.to_string(),
        }
    })?;

    info!(path = relative, "workflow written");
    Ok(path)
}

/// What the availability probe saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available(u16),
    /// The CDN answered but not with success, usually because it has not picked
    /// up the tag yet
    Pending(u16),
    Unreachable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }
}

/// `HEAD` the URL once, bounded by `timeout`; never returns an error
pub async fn probe(url: &str, timeout: Duration) -> Availability {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => return Availability::Unreachable(e.to_string()),
    };

    match client.head(url).send().await {
        Ok(response) if response.status().is_success() => {
            Availability::Available(response.status().as_u16())
        }
        Ok(response) => Availability::Pending(response.status().as_u16()),
        Err(e) => {
            warn!(%url, error = %e, "CDN probe failed");
            let reason = if e.is_timeout() {
                format!("timed out after {}s", timeout.as_secs())
            } else {
                e.without_url().to_string()
            };
            Availability::Unreachable(reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_workflow() {
        let workflow = render_workflow("main", "src/index.js");

        assert!(workflow.contains("branches: [ main ]"));
        assert!(workflow.contains("@${{ github.ref_name }}/src/index.js"));
        assert!(!workflow.contains("__"));

        let parsed: serde_yaml::Value = serde_yaml::from_str(&workflow).unwrap();
        assert_eq!(parsed["name"], "CDN Auto-Update");
    }

    #[test]
    fn test_write_workflow_creates_directories() {
        let dir = TempDir::new().unwrap();

        let path = write_workflow(
            dir.path(),
            ".github/workflows/cdn-update.yml",
            "release",
            "dist/index.js",
        )
        .unwrap();

        let written = fs::read_to_string(path).unwrap();
        assert_eq!(written, render_workflow("release", "dist/index.js"));
    }

    #[tokio::test]
    async fn test_probe_unreachable_never_errors() {
        let availability = probe("http://127.0.0.1:9/missing.js", Duration::from_secs(2)).await;

        assert!(!availability.is_available());
        assert!(matches!(availability, Availability::Unreachable(_)));
    }
}
