//! Configuration structures and types for cdn-release
//!
//! This module provides type-safe configuration management with serde support.
//! Every section has defaults, so a partial `.release-config.yaml` is enough.

use serde::{Deserialize, Serialize};

/// Default size budget for the distributable bundle (100 KiB)
pub const DEFAULT_BUDGET_BYTES: u64 = 100 * 1024;

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Schema version
    pub version: String,

    /// Extend from base configuration file (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Project identity and release version
    pub project: ProjectConfig,

    /// Source tree layout and gated artifacts
    pub sources: SourcesConfig,

    /// Bundle assembly settings
    pub bundle: BundleConfig,

    /// Publish collaborator settings
    pub publish: PublishSettings,
}

/// Project identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Repository owner on GitHub
    pub owner: String,

    /// Repository name, also used as the library name
    pub name: String,

    /// Release version (semver, without the leading `v`)
    pub version: String,

    /// Branch pushed on release
    pub branch: String,
}

/// Source tree layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    /// Directory holding the library sources, relative to the project root
    #[serde(rename = "sourceDir")]
    pub source_dir: String,

    /// Directory receiving the bundle, relative to the project root
    #[serde(rename = "distDir")]
    pub dist_dir: String,

    /// Required artifacts, relative to the project root
    pub manifest: Vec<String>,

    /// Artifacts inspected by the heuristic checks
    pub artifacts: ArtifactPaths,
}

/// Paths of the artifacts the heuristic checks read
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArtifactPaths {
    /// Input validation helpers (sanitization check)
    pub validation: String,

    /// Query engine (injection-safety check)
    pub query: String,

    /// Token helpers (token-handling check)
    pub token: String,

    /// Router (cross-origin and routing-surface checks)
    pub routing: String,
}

/// Bundle assembly settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BundleConfig {
    /// Substrings marking files excluded from the bundle
    pub exclusions: Vec<String>,

    /// Size budget in bytes (warning only)
    #[serde(rename = "budgetBytes")]
    pub budget_bytes: u64,
}

/// Publish collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PublishSettings {
    /// Environment variable holding the GitHub token
    #[serde(rename = "tokenEnv")]
    pub token_env: String,

    /// GitHub REST API base URL
    #[serde(rename = "apiBaseUrl")]
    pub api_base_url: String,

    /// CDN base URL for GitHub-hosted files
    #[serde(rename = "cdnBaseUrl")]
    pub cdn_base_url: String,

    /// Manual purge tool URL shown to the user
    #[serde(rename = "purgeToolUrl")]
    pub purge_tool_url: String,

    /// Library entry point served by the CDN, relative to the project root
    #[serde(rename = "entryPoint")]
    pub entry_point: String,

    /// Where the CDN auto-update workflow is written
    #[serde(rename = "workflowPath")]
    pub workflow_path: String,

    /// Timeout for the final CDN availability probe
    #[serde(rename = "availabilityTimeoutSecs")]
    pub availability_timeout_secs: u64,
}

impl PipelineConfig {
    /// `owner/name` slug of the repository
    pub fn repository_slug(&self) -> String {
        format!("{}/{}", self.project.owner, self.project.name)
    }

    /// Git tag of the release (`v{version}`)
    pub fn release_tag(&self) -> String {
        format!("v{}", self.project.version)
    }

    /// Versioned CDN URL of the entry point
    pub fn cdn_url(&self) -> String {
        format!(
            "{}/{}@{}/{}",
            self.publish.cdn_base_url.trim_end_matches('/'),
            self.repository_slug(),
            self.release_tag(),
            self.publish.entry_point
        )
    }

    /// Public web URL of the repository
    pub fn repository_url(&self) -> String {
        format!("https://github.com/{}", self.repository_slug())
    }
}

/// Default configuration values
impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            extends: None,
            project: ProjectConfig::default(),
            sources: SourcesConfig::default(),
            bundle: BundleConfig::default(),
            publish: PublishSettings::default(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            owner: "Nexus-Studio-CEO".to_string(),
            name: "FrontendRAFT".to_string(),
            version: "0.1.0".to_string(),
            branch: "main".to_string(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        let manifest = [
            "src/index.js",
            "src/core/FrontendRAFT.js",
            "src/core/CacheLayer.js",
            "src/core/StreamManager.js",
            "src/core/BatchManager.js",
            "src/core/OptimisticEngine.js",
            "src/core/QueryEngine.js",
            "src/core/AuthLayer.js",
            "src/core/Router.js",
            "src/core/StorageLayer.js",
            "src/core/ComputeLayer.js",
            "src/core/P2PLayer.js",
            "src/core/CDNClient.js",
            "src/plugins/react.js",
            "src/plugins/vue.js",
            "src/utils/jwt.js",
            "src/utils/crypto.js",
            "src/utils/validation.js",
        ];

        Self {
            source_dir: "src".to_string(),
            dist_dir: "dist".to_string(),
            manifest: manifest.iter().map(|p| p.to_string()).collect(),
            artifacts: ArtifactPaths::default(),
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            validation: "src/utils/validation.js".to_string(),
            query: "src/core/QueryEngine.js".to_string(),
            token: "src/utils/jwt.js".to_string(),
            routing: "src/core/Router.js".to_string(),
        }
    }
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            // Plugin templates are not served from the CDN
            exclusions: vec![
                "src/plugins/react.js".to_string(),
                "src/plugins/vue.js".to_string(),
            ],
            budget_bytes: DEFAULT_BUDGET_BYTES,
        }
    }
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            token_env: "GITHUB_TOKEN".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            cdn_base_url: "https://cdn.jsdelivr.net/gh".to_string(),
            purge_tool_url: "https://www.jsdelivr.com/tools/purge".to_string(),
            entry_point: "src/index.js".to_string(),
            workflow_path: ".github/workflows/cdn-update.yml".to_string(),
            availability_timeout_secs: 10,
        }
    }
}
