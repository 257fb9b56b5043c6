//! Source inventory - verifies that every required artifact exists
//!
//! Existence is the only property checked. Contents and sizes are left to the
//! heuristic checks and the bundle assembler.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Result of an inventory check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReport {
    /// Paths that were required, in manifest order
    pub required: Vec<String>,
    /// Required paths that do not exist, in manifest order
    pub missing: Vec<String>,
}

impl InventoryReport {
    /// True when nothing is missing
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn present_count(&self) -> usize {
        self.required.len() - self.missing.len()
    }
}

/// Checks a fixed manifest of relative paths against a project root
///
/// # Example
///
/// ```
/// use cdn_release::validation::SourceInventoryChecker;
///
/// let checker = SourceInventoryChecker::new(vec!["does/not/exist.js".to_string()]);
/// let report = checker.check(std::env::temp_dir());
/// assert_eq!(report.missing, vec!["does/not/exist.js".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct SourceInventoryChecker {
    manifest: Vec<String>,
}

impl SourceInventoryChecker {
    pub fn new(manifest: Vec<String>) -> Self {
        Self { manifest }
    }

    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    /// Check every manifest entry; never fails early
    ///
    /// Entries whose existence cannot be determined count as missing.
    pub fn check<P: AsRef<Path>>(&self, project_root: P) -> InventoryReport {
        let root = project_root.as_ref();

        let missing: Vec<String> = self
            .manifest
            .iter()
            .filter(|relative| {
                let exists = matches!(root.join(relative.as_str()).try_exists(), Ok(true));
                debug!(path = relative.as_str(), exists, "inventory entry");
                !exists
            })
            .cloned()
            .collect();

        InventoryReport {
            required: self.manifest.clone(),
            missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "// ok").unwrap();
    }

    #[test]
    fn test_all_present() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/index.js");
        touch(dir.path(), "src/core/Router.js");

        let checker = SourceInventoryChecker::new(vec![
            "src/index.js".to_string(),
            "src/core/Router.js".to_string(),
        ]);
        let report = checker.check(dir.path());

        assert!(report.is_complete());
        assert_eq!(report.present_count(), 2);
    }

    #[test]
    fn test_missing_reported_in_manifest_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/b.js");

        let checker = SourceInventoryChecker::new(vec![
            "src/c.js".to_string(),
            "src/b.js".to_string(),
            "src/a.js".to_string(),
        ]);
        let report = checker.check(dir.path());

        assert!(!report.is_complete());
        assert_eq!(report.missing, vec!["src/c.js".to_string(), "src/a.js".to_string()]);
        assert_eq!(report.required.len(), 3);
    }

    #[test]
    fn test_empty_manifest_is_complete() {
        let dir = TempDir::new().unwrap();
        let report = SourceInventoryChecker::new(Vec::new()).check(dir.path());
        assert!(report.is_complete());
    }

    #[test]
    fn test_default_manifest_against_empty_root() {
        let dir = TempDir::new().unwrap();
        let manifest = crate::core::config::SourcesConfig::default().manifest;

        let report = SourceInventoryChecker::new(manifest.clone()).check(dir.path());

        assert_eq!(report.missing, manifest);
    }
}
