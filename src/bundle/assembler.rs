//! Bundle assembler - copies the distributable subset of the source tree
//!
//! Every file under the source directory is classified by exclusion rules
//! (plain substring containment on its project-relative path). Included files
//! are copied verbatim under the output directory and their sizes summed.
//! Traversal is sorted by file name, so the manifest does not depend on the
//! order the filesystem enumerates entries in.

use crate::core::error::ReleaseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Path substring marking a file as excluded from the bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule(String);

impl ExclusionRule {
    pub fn new(pattern: &str) -> Self {
        Self(pattern.to_string())
    }

    pub fn pattern(&self) -> &str {
        &self.0
    }

    /// Exact substring containment, no globbing
    pub fn matches(&self, path: &str) -> bool {
        path.contains(self.0.as_str())
    }
}

/// What a bundle run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleManifest {
    /// Project-relative paths that were copied
    pub included: BTreeSet<String>,
    /// Project-relative paths matched by an exclusion rule
    pub excluded: BTreeSet<String>,
    /// Sum of the byte sizes of the copied files
    pub total_bytes: u64,
    pub budget_bytes: u64,
    /// `total_bytes > budget_bytes`; a warning, never a failure
    pub over_budget: bool,
    pub output_dir: PathBuf,
}

impl BundleManifest {
    pub fn file_count(&self) -> usize {
        self.included.len()
    }

    /// Total size in KiB, for display
    pub fn total_kib(&self) -> f64 {
        self.total_bytes as f64 / 1024.0
    }
}

/// Assembles the distributable bundle
///
/// # Example
///
/// ```no_run
/// use cdn_release::bundle::BundleAssembler;
///
/// let assembler = BundleAssembler::new(&["src/plugins/".to_string()], 100 * 1024);
/// let manifest = assembler.assemble(".", "src", "dist")?;
/// println!("{} files, {} bytes", manifest.file_count(), manifest.total_bytes);
/// # Ok::<(), cdn_release::core::ReleaseError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BundleAssembler {
    exclusions: Vec<ExclusionRule>,
    budget_bytes: u64,
}

impl BundleAssembler {
    pub fn new(exclusions: &[String], budget_bytes: u64) -> Self {
        Self {
            exclusions: exclusions.iter().map(|e| ExclusionRule::new(e)).collect(),
            budget_bytes,
        }
    }

    pub fn exclusions(&self) -> &[ExclusionRule] {
        &self.exclusions
    }

    /// Whether a project-relative path is excluded
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.iter().any(|rule| rule.matches(path))
    }

    /// Copy included files from `source_dir` to `dist_dir`
    ///
    /// Both directories are relative to `project_root`. If the output
    /// directory lives inside the source directory it is skipped during
    /// traversal. The source tree is only read.
    ///
    /// # Errors
    ///
    /// `ReleaseError::BundleFailed` if the source directory is missing or a
    /// file cannot be traversed or copied.
    pub fn assemble<P: AsRef<Path>>(
        &self,
        project_root: P,
        source_dir: &str,
        dist_dir: &str,
    ) -> Result<BundleManifest, ReleaseError> {
        let root = project_root.as_ref();
        let source_root = root.join(source_dir);
        let dist_root = root.join(dist_dir);

        if !source_root.is_dir() {
            return Err(ReleaseError::BundleFailed {
                message: format!("Source directory not found: {}", source_dir),
            });
        }

        fs::create_dir_all(&dist_root).map_err(|e| ReleaseError::BundleFailed {
            message: format!("Failed to create {}: {}", dist_dir, e),
        })?;

        let mut included = BTreeSet::new();
        let mut excluded = BTreeSet::new();
        let mut total_bytes = 0u64;

        // Linked files are bundled through their target
        let walker = WalkDir::new(&source_root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.path() != dist_root);

        for entry in walker {
            let entry = entry.map_err(|e| ReleaseError::BundleFailed {
                message: format!("Failed to traverse {}: {}", source_dir, e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let key = relative_key(root, entry.path());
            if self.is_excluded(&key) {
                debug!(path = %key, "excluded from bundle");
                excluded.insert(key);
                continue;
            }

            let within_source = entry
                .path()
                .strip_prefix(&source_root)
                .map_err(|e| ReleaseError::BundleFailed {
                    message: format!("{}: {}", key, e),
                })?;
            let destination = dist_root.join(within_source);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).map_err(|e| ReleaseError::BundleFailed {
                    message: format!("Failed to create {}: {}", parent.display(), e),
                })?;
            }

            let copied = fs::copy(entry.path(), &destination).map_err(|e| {
                ReleaseError::BundleFailed {
                    message: format!("Failed to copy {}: {}", key, e),
                }
            })?;

            debug!(path = %key, bytes = copied, "copied into bundle");
            total_bytes += copied;
            included.insert(key);
        }

        let over_budget = total_bytes > self.budget_bytes;
        if over_budget {
            warn!(total_bytes, budget_bytes = self.budget_bytes, "bundle exceeds size budget");
        }
        info!(
            included = included.len(),
            excluded = excluded.len(),
            total_bytes,
            "bundle assembled"
        );

        Ok(BundleManifest {
            included,
            excluded,
            total_bytes,
            budget_bytes: self.budget_bytes,
            over_budget,
            output_dir: dist_root,
        })
    }
}

/// Project-relative path with `/` separators
fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
