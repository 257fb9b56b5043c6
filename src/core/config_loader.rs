//! Configuration file loader for cdn-release
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::ReleaseError;
use regex::Regex;
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".release-config.yaml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    /// Is configuration valid?
    pub valid: bool,

    /// Validation errors
    pub errors: Vec<ConfigValidationError>,

    /// Validation warnings
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "bundle.budgetBytes")
    pub field: String,

    /// Error message
    pub message: String,

    /// Expected type/value
    pub expected: Option<String>,

    /// Actual type/value
    pub actual: Option<String>,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    /// Field path
    pub field: String,

    /// Warning message
    pub message: String,

    /// Suggestion
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. Environment overrides (RELEASE_VERSION, RELEASE_OWNER, RELEASE_REPO, RELEASE_BRANCH)
    /// 2. Project config (./.release-config.yaml, with its `extends` chain)
    /// 3. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PipelineConfig, ReleaseError> {
        let config_path = options.project_path.join(CONFIG_FILENAME);

        let mut config = match Self::load_config_value(&config_path, Vec::new()).await? {
            Some(value) => serde_yaml::from_value::<PipelineConfig>(value).map_err(|e| {
                ReleaseError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?,
            None => {
                debug!(path = %config_path.display(), "no project config, using defaults");
                PipelineConfig::default()
            }
        };

        Self::apply_env_overrides(&mut config, &options.env);

        Self::expand_env_vars(config, &options.env)
    }

    /// Load a configuration file as a raw YAML value, resolving `extends`
    ///
    /// `chain` holds the canonical paths already being loaded; reaching one
    /// of them again is an `extends` cycle.
    fn load_config_value(
        file_path: &Path,
        mut chain: Vec<PathBuf>,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Option<Value>, ReleaseError>> + Send + '_>,
    > {
        Box::pin(async move {
            if !file_path.exists() {
                return Ok(None);
            }

            let canonical = fs::canonicalize(file_path).await.map_err(|e| {
                ReleaseError::ConfigError(format!("Failed to resolve config file: {}", e))
            })?;
            if chain.contains(&canonical) {
                let cycle: Vec<String> = chain
                    .iter()
                    .chain(std::iter::once(&canonical))
                    .map(|p| p.display().to_string())
                    .collect();
                return Err(ReleaseError::ConfigError(format!(
                    "extends cycle: {}",
                    cycle.join(" -> ")
                )));
            }
            chain.push(canonical);

            let content = fs::read_to_string(file_path).await.map_err(|e| {
                ReleaseError::ConfigError(format!("Failed to read config file: {}", e))
            })?;

            let value: Value = serde_yaml::from_str(&content).map_err(|e| {
                ReleaseError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?;

            let extends = value
                .get("extends")
                .and_then(Value::as_str)
                .map(str::to_string);

            if let Some(extends_path) = extends {
                let base_path = file_path
                    .parent()
                    .ok_or_else(|| ReleaseError::ConfigError("Invalid config file path".to_string()))?
                    .join(&extends_path);

                match Self::load_config_value(&base_path, chain).await? {
                    Some(base) => return Ok(Some(Self::merge_values(base, value))),
                    None => {
                        return Err(ReleaseError::ConfigError(format!(
                            "Base config not found: {}",
                            base_path.display()
                        )));
                    }
                }
            }

            Ok(Some(value))
        })
    }

    /// Deep-merge two YAML values, `overlay` wins on conflicts
    fn merge_values(base: Value, overlay: Value) -> Value {
        match (base, overlay) {
            (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
                for (key, overlay_value) in overlay_map {
                    let merged = match base_map.remove(&key) {
                        Some(base_value) => Self::merge_values(base_value, overlay_value),
                        None => overlay_value,
                    };
                    base_map.insert(key, merged);
                }
                Value::Mapping(base_map)
            }
            (_, overlay) => overlay,
        }
    }

    /// Apply environment overrides to the project section
    fn apply_env_overrides(config: &mut PipelineConfig, env: &HashMap<String, String>) {
        let overrides = [
            ("RELEASE_VERSION", &mut config.project.version),
            ("RELEASE_OWNER", &mut config.project.owner),
            ("RELEASE_REPO", &mut config.project.name),
            ("RELEASE_BRANCH", &mut config.project.branch),
        ];

        for (variable, field) in overrides {
            if let Some(value) = env.get(variable).filter(|v| !v.is_empty()) {
                debug!(variable, "configuration overridden from environment");
                *field = value.clone();
            }
        }
    }

    /// Expand environment variables in configuration strings
    ///
    /// The publish token variable is never expanded into the configuration.
    fn expand_env_vars(
        mut config: PipelineConfig,
        env: &HashMap<String, String>,
    ) -> Result<PipelineConfig, ReleaseError> {
        let forbidden = config.publish.token_env.clone();

        let fields = [
            &mut config.project.owner,
            &mut config.project.name,
            &mut config.project.version,
            &mut config.project.branch,
            &mut config.publish.api_base_url,
            &mut config.publish.cdn_base_url,
        ];

        for field in fields {
            *field = Self::expand_string(field, env, &forbidden)?;
        }

        Ok(config)
    }

    /// Expand environment variables in a single string
    fn expand_string(
        input: &str,
        env: &HashMap<String, String>,
        forbidden: &str,
    ) -> Result<String, ReleaseError> {
        let env_var_regex = Regex::new(ENV_VAR_PATTERN)
            .map_err(|e| ReleaseError::ConfigError(e.to_string()))?;

        let mut result = input.to_string();
        for cap in env_var_regex.captures_iter(input) {
            let var_name = &cap[1];

            if var_name == forbidden {
                warn!(variable = var_name, "refusing to expand the publish token into configuration");
                continue;
            }

            if let Some(value) = env.get(var_name) {
                result = result.replace(&format!("${{{}}}", var_name), value);
            } else {
                warn!(variable = var_name, "environment variable not found");
            }
        }

        Ok(result)
    }

    /// Validate configuration
    pub fn validate(config: &PipelineConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Schema version
        if config.version.is_empty() {
            errors.push(ConfigValidationError {
                field: "version".to_string(),
                message: "Version is required".to_string(),
                expected: Some("string (e.g., \"1.0\")".to_string()),
                actual: Some("empty".to_string()),
            });
        } else if config.version != "1.0" {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("Unknown version: {}", config.version),
                suggestion: Some("Currently supported version is \"1.0\" only".to_string()),
            });
        }

        // 2. Project identity
        Self::validate_project(&config.project, &mut errors);

        // 3. Sources and artifacts
        Self::validate_sources(&config.sources, &mut errors, &mut warnings);

        // 4. Bundle
        Self::validate_bundle(&config.bundle, &mut errors);

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn validate_project(project: &ProjectConfig, errors: &mut Vec<ConfigValidationError>) {
        if let Err(e) = semver::Version::parse(&project.version) {
            errors.push(ConfigValidationError {
                field: "project.version".to_string(),
                message: format!("Release version is not valid SemVer: {}", e),
                expected: Some("MAJOR.MINOR.PATCH (e.g., 0.1.0)".to_string()),
                actual: Some(project.version.clone()),
            });
        }

        for (field, value) in [
            ("project.owner", &project.owner),
            ("project.name", &project.name),
            ("project.branch", &project.branch),
        ] {
            if value.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: format!("{} is required", field),
                    expected: Some("non-empty string".to_string()),
                    actual: Some("empty".to_string()),
                });
            }
        }
    }

    fn validate_sources(
        sources: &SourcesConfig,
        errors: &mut Vec<ConfigValidationError>,
        warnings: &mut Vec<ConfigValidationWarning>,
    ) {
        if sources.manifest.is_empty() {
            errors.push(ConfigValidationError {
                field: "sources.manifest".to_string(),
                message: "manifest must list at least one file".to_string(),
                expected: Some("non-empty array".to_string()),
                actual: Some("empty array".to_string()),
            });
        }

        if sources.source_dir.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "sources.sourceDir".to_string(),
                message: "sourceDir is required".to_string(),
                expected: Some("non-empty string".to_string()),
                actual: Some("empty".to_string()),
            });
        }

        if sources.dist_dir.trim().is_empty() || sources.dist_dir == sources.source_dir {
            errors.push(ConfigValidationError {
                field: "sources.distDir".to_string(),
                message: "distDir must be set and differ from sourceDir".to_string(),
                expected: Some("separate output directory".to_string()),
                actual: Some(sources.dist_dir.clone()),
            });
        }

        let artifacts = [
            ("sources.artifacts.validation", &sources.artifacts.validation),
            ("sources.artifacts.query", &sources.artifacts.query),
            ("sources.artifacts.token", &sources.artifacts.token),
            ("sources.artifacts.routing", &sources.artifacts.routing),
        ];

        for (field, path) in artifacts {
            if path.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "artifact path is required".to_string(),
                    expected: Some("path relative to the project root".to_string()),
                    actual: Some("empty".to_string()),
                });
            } else if !sources.manifest.contains(path) {
                warnings.push(ConfigValidationWarning {
                    field: field.to_string(),
                    message: format!("{} is not listed in sources.manifest", path),
                    suggestion: Some("Add it to the manifest so a missing file fails early".to_string()),
                });
            }
        }
    }

    fn validate_bundle(bundle: &BundleConfig, errors: &mut Vec<ConfigValidationError>) {
        for (i, rule) in bundle.exclusions.iter().enumerate() {
            if rule.is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("bundle.exclusions[{}]", i),
                    message: "an empty exclusion would exclude every file".to_string(),
                    expected: Some("non-empty path substring".to_string()),
                    actual: Some("empty".to_string()),
                });
            }
        }

        if bundle.budget_bytes == 0 {
            errors.push(ConfigValidationError {
                field: "bundle.budgetBytes".to_string(),
                message: "budgetBytes must be positive".to_string(),
                expected: Some("integer > 0".to_string()),
                actual: Some("0".to_string()),
            });
        }
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("✅ Configuration validation succeeded".to_string());
        } else {
            lines.push("❌ Configuration has errors".to_string());
        }

        if !result.errors.is_empty() {
            lines.push("\n🔴 Errors:".to_string());
            for error in &result.errors {
                lines.push(format!("  - [{}] {}", error.field, error.message));
                if let (Some(expected), Some(actual)) = (&error.expected, &error.actual) {
                    lines.push(format!("    Expected: {}", expected));
                    lines.push(format!("    Actual: {}", actual));
                }
            }
        }

        if !result.warnings.is_empty() {
            lines.push("\n🟡 Warnings:".to_string());
            for warning in &result.warnings {
                lines.push(format!("  - [{}] {}", warning.field, warning.message));
                if let Some(suggestion) = &warning.suggestion {
                    lines.push(format!("    Suggestion: {}", suggestion));
                }
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(dir: &TempDir, env: HashMap<String, String>) -> ConfigLoadOptions {
        ConfigLoadOptions {
            project_path: dir.path().to_path_buf(),
            env,
        }
    }

    #[tokio::test]
    async fn test_load_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load(options(&dir, HashMap::new())).await.unwrap();

        assert_eq!(config, PipelineConfig::default());
    }

    #[tokio::test]
    async fn test_load_project_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "project:\n  owner: acme\n  version: 1.2.3\nbundle:\n  exclusions: [demo/]\n",
        )
        .unwrap();

        let config = ConfigLoader::load(options(&dir, HashMap::new())).await.unwrap();

        assert_eq!(config.project.owner, "acme");
        assert_eq!(config.project.version, "1.2.3");
        assert_eq!(config.project.name, "FrontendRAFT");
        assert_eq!(config.bundle.exclusions, vec!["demo/".to_string()]);
    }

    #[tokio::test]
    async fn test_load_with_extends() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("base.yaml"),
            "project:\n  owner: base-owner\n  name: base-lib\nbundle:\n  budgetBytes: 4096\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "extends: base.yaml\nproject:\n  name: child-lib\n",
        )
        .unwrap();

        let config = ConfigLoader::load(options(&dir, HashMap::new())).await.unwrap();

        assert_eq!(config.project.owner, "base-owner");
        assert_eq!(config.project.name, "child-lib");
        assert_eq!(config.bundle.budget_bytes, 4096);
    }

    #[tokio::test]
    async fn test_load_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "project: [unclosed").unwrap();

        let result = ConfigLoader::load(options(&dir, HashMap::new())).await;

        assert!(matches!(result, Err(ReleaseError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_load_extends_cycle() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "extends: b.yaml\n").unwrap();
        std::fs::write(
            dir.path().join("b.yaml"),
            format!("extends: {}\n", CONFIG_FILENAME),
        )
        .unwrap();

        let result = ConfigLoader::load(options(&dir, HashMap::new())).await;

        match result {
            Err(ReleaseError::ConfigError(message)) => {
                assert!(message.starts_with("extends cycle:"), "{}", message)
            }
            other => panic!("expected extends cycle error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_extends_itself() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            format!("extends: ./{}\n", CONFIG_FILENAME),
        )
        .unwrap();

        let result = ConfigLoader::load(options(&dir, HashMap::new())).await;

        assert!(matches!(result, Err(ReleaseError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_env_overrides() {
        let dir = TempDir::new().unwrap();
        let mut env = HashMap::new();
        env.insert("RELEASE_VERSION".to_string(), "0.2.0".to_string());
        env.insert("RELEASE_BRANCH".to_string(), "release".to_string());

        let config = ConfigLoader::load(options(&dir, env)).await.unwrap();

        assert_eq!(config.project.version, "0.2.0");
        assert_eq!(config.project.branch, "release");
    }

    #[test]
    fn test_expand_string() {
        let mut env = HashMap::new();
        env.insert("CDN_HOST".to_string(), "cdn.example.com".to_string());

        let result =
            ConfigLoader::expand_string("https://${CDN_HOST}/gh", &env, "GITHUB_TOKEN").unwrap();

        assert_eq!(result, "https://cdn.example.com/gh");
    }

    #[test]
    fn test_expand_string_refuses_token() {
        let mut env = HashMap::new();
        env.insert("GITHUB_TOKEN".to_string(), "ghp_secret".to_string());

        let result = ConfigLoader::expand_string("${GITHUB_TOKEN}", &env, "GITHUB_TOKEN").unwrap();

        assert_eq!(result, "${GITHUB_TOKEN}");
    }

    #[test]
    fn test_merge_values_overlay_wins() {
        let base: Value = serde_yaml::from_str("a: 1\nb:\n  c: 2\n  d: 3\n").unwrap();
        let overlay: Value = serde_yaml::from_str("b:\n  c: 20\n").unwrap();

        let merged = ConfigLoader::merge_values(base, overlay);

        assert_eq!(merged["a"], Value::from(1));
        assert_eq!(merged["b"]["c"], Value::from(20));
        assert_eq!(merged["b"]["d"], Value::from(3));
    }

    #[test]
    fn test_validate_default_config() {
        let result = ConfigLoader::validate(&PipelineConfig::default());

        assert!(result.valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_version() {
        let mut config = PipelineConfig::default();
        config.project.version = "v1".to_string();

        let result = ConfigLoader::validate(&config);

        assert!(!result.valid);
        assert_eq!(result.errors[0].field, "project.version");
    }

    #[test]
    fn test_validate_rejects_empty_exclusion_and_budget() {
        let mut config = PipelineConfig::default();
        config.bundle.exclusions.push(String::new());
        config.bundle.budget_bytes = 0;

        let result = ConfigLoader::validate(&config);

        assert!(!result.valid);
        let fields: Vec<_> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"bundle.exclusions[2]"));
        assert!(fields.contains(&"bundle.budgetBytes"));
    }

    #[test]
    fn test_validate_warns_on_artifact_outside_manifest() {
        let mut config = PipelineConfig::default();
        config.sources.artifacts.query = "src/core/Other.js".to_string();

        let result = ConfigLoader::validate(&config);

        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].field, "sources.artifacts.query");
    }

    #[test]
    fn test_format_validation_result() {
        let result = ConfigValidationResult {
            valid: false,
            errors: vec![ConfigValidationError {
                field: "project.version".to_string(),
                message: "Release version is not valid SemVer".to_string(),
                expected: Some("MAJOR.MINOR.PATCH".to_string()),
                actual: Some("v1".to_string()),
            }],
            warnings: vec![ConfigValidationWarning {
                field: "sources.artifacts.query".to_string(),
                message: "not listed".to_string(),
                suggestion: Some("Add it".to_string()),
            }],
        };

        let formatted = ConfigLoader::format_validation_result(&result);

        assert!(formatted.contains("❌ Configuration has errors"));
        assert!(formatted.contains("[project.version]"));
        assert!(formatted.contains("🟡 Warnings:"));
        assert!(formatted.contains("Suggestion: Add it"));
    }
}
