//! Heuristic source checks gating a release
//!
//! Each check reads one artifact's raw text and evaluates a fixed [`RuleSet`]
//! against it. There is no parsing: the evidence is purely textual, and some
//! informational rules (script awareness, HTTP verb coverage) are deliberately
//! weak and never gate the verdict.
//!
//! # Example
//!
//! ```
//! use cdn_release::security::heuristics::CheckKind;
//!
//! let report = CheckKind::InjectionSafety
//!     .rule_set()
//!     .evaluate("const where = this._filter(q); if (op === '$eq') {}");
//! assert!(report.passed);
//! ```

use super::rules::{CheckReport, Evidence, Rule, RuleSet};
use crate::core::config::ArtifactPaths;
use crate::core::error::ReleaseError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

lazy_static! {
    /// `secret = "literal"` style assignments
    static ref HARDCODED_SECRET: Regex =
        Regex::new(r#"(?i)secret\s*=\s*["'][^"']+["']"#).expect("valid secret pattern");
}

/// HTTP verbs whose presence the routing check reports
const HTTP_VERBS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];

/// Which artifact a check reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactRole {
    Validation,
    Query,
    Token,
    Routing,
}

impl ArtifactRole {
    /// Configured path of this artifact
    pub fn path<'a>(&self, artifacts: &'a ArtifactPaths) -> &'a str {
        match self {
            ArtifactRole::Validation => &artifacts.validation,
            ArtifactRole::Query => &artifacts.query,
            ArtifactRole::Token => &artifacts.token,
            ArtifactRole::Routing => &artifacts.routing,
        }
    }
}

/// The heuristic checks run before bundling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    Sanitization,
    InjectionSafety,
    TokenHandling,
    CrossOrigin,
    RoutingSurface,
}

impl CheckKind {
    /// All checks in pipeline order
    pub const ALL: [CheckKind; 5] = [
        CheckKind::Sanitization,
        CheckKind::InjectionSafety,
        CheckKind::TokenHandling,
        CheckKind::CrossOrigin,
        CheckKind::RoutingSurface,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Sanitization => "Sanitization",
            CheckKind::InjectionSafety => "Injection Safety",
            CheckKind::TokenHandling => "Token Handling",
            CheckKind::CrossOrigin => "Cross-Origin",
            CheckKind::RoutingSurface => "Routing Surface",
        }
    }

    /// Artifact inspected by this check
    pub fn artifact(&self) -> ArtifactRole {
        match self {
            CheckKind::Sanitization => ArtifactRole::Validation,
            CheckKind::InjectionSafety => ArtifactRole::Query,
            CheckKind::TokenHandling => ArtifactRole::Token,
            CheckKind::CrossOrigin | CheckKind::RoutingSurface => ArtifactRole::Routing,
        }
    }

    /// Rule set of this check
    pub fn rule_set(&self) -> RuleSet {
        match self {
            CheckKind::Sanitization => sanitization_rules(),
            CheckKind::InjectionSafety => injection_safety_rules(),
            CheckKind::TokenHandling => token_handling_rules(),
            CheckKind::CrossOrigin => cross_origin_rules(),
            CheckKind::RoutingSurface => routing_surface_rules(),
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn sanitization_rules() -> RuleSet {
    RuleSet::new(
        CheckKind::Sanitization.as_str(),
        vec![
            // also matches `export function sanitize`
            Rule::gating("Sanitize function exists", Evidence::literal("function sanitize")),
            Rule::gating(
                "HTML escape implemented",
                Evidence::any_literal(&["&lt;", "replace(/</g"]),
            ),
            Rule::informational(
                "Script tag protection",
                Evidence::any_of(vec![
                    Evidence::literal("&lt;script"),
                    Evidence::literal_ignore_case("script"),
                ]),
            ),
        ],
    )
}

fn injection_safety_rules() -> RuleSet {
    RuleSet::new(
        CheckKind::InjectionSafety.as_str(),
        vec![
            Rule::gating("Safe WHERE clause filtering", Evidence::literal("_filter")),
            Rule::gating(
                "Query operator validation",
                Evidence::any_literal(&["$eq", "operator"]),
            ),
            Rule::gating("No eval() usage", Evidence::absent(Evidence::literal("eval("))),
        ],
    )
}

fn token_handling_rules() -> RuleSet {
    RuleSet::new(
        CheckKind::TokenHandling.as_str(),
        vec![
            Rule::gating("JWT verification function", Evidence::literal("verifyJWT")),
            Rule::gating(
                "Signature validation",
                Evidence::all_of(vec![Evidence::literal("signature"), Evidence::literal("!=")]),
            ),
            Rule::gating(
                "Token expiration check",
                Evidence::all_of(vec![Evidence::literal("exp"), Evidence::literal("Date.now()")]),
            ),
            Rule::informational(
                "No hardcoded secrets",
                Evidence::absent(Evidence::pattern(HARDCODED_SECRET.clone())),
            ),
        ],
    )
}

fn cross_origin_rules() -> RuleSet {
    RuleSet::new(
        CheckKind::CrossOrigin.as_str(),
        vec![
            Rule::gating(
                "CORS handling present",
                Evidence::any_of(vec![
                    Evidence::literal_ignore_case("cors"),
                    Evidence::literal_ignore_case("origin"),
                ]),
            ),
            Rule::informational(
                "No unsafe wildcard CORS",
                Evidence::any_of(vec![
                    Evidence::absent(Evidence::literal("*")),
                    Evidence::literal_ignore_case("wildcard"),
                ]),
            ),
        ],
    )
}

fn routing_surface_rules() -> RuleSet {
    let mut rules = vec![Rule::gating(
        "Route definition method",
        Evidence::all_of(vec![
            Evidence::literal("define"),
            Evidence::literal_ignore_case("route"),
        ]),
    )];

    for verb in HTTP_VERBS {
        rules.push(Rule::informational(
            &format!("HTTP {} support", verb),
            Evidence::literal(verb),
        ));
    }

    rules.extend([
        Rule::informational(
            "Path parameters (/users/:id)",
            Evidence::all_of(vec![Evidence::literal(":"), Evidence::literal("params")]),
        ),
        Rule::informational("Middleware support", Evidence::literal_ignore_case("middleware")),
        Rule::gating(
            "Error handling (try/catch)",
            Evidence::all_of(vec![Evidence::literal("try"), Evidence::literal("catch")]),
        ),
        Rule::gating(
            "404 Not Found handling",
            Evidence::any_of(vec![
                Evidence::literal("404"),
                Evidence::literal_ignore_case("not found"),
            ]),
        ),
    ]);

    RuleSet::new(CheckKind::RoutingSurface.as_str(), rules)
}

/// Runs heuristic checks against artifacts under a project root
///
/// Artifacts are read fresh on every call; nothing is cached or written.
#[derive(Debug, Clone)]
pub struct HeuristicAnalyzer {
    project_root: PathBuf,
    artifacts: ArtifactPaths,
}

impl HeuristicAnalyzer {
    pub fn new<P: AsRef<Path>>(project_root: P, artifacts: ArtifactPaths) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            artifacts,
        }
    }

    /// Run one check
    ///
    /// # Errors
    ///
    /// - `ReleaseError::MissingArtifacts` if the artifact does not exist
    /// - `ReleaseError::ArtifactUnreadable` if it cannot be read as UTF-8 text
    pub fn analyze(&self, kind: CheckKind) -> Result<CheckReport, ReleaseError> {
        let relative = kind.artifact().path(&self.artifacts);
        let text = self.read_artifact(relative)?;

        debug!(check = %kind, artifact = relative, bytes = text.len(), "running heuristic check");
        let report = kind.rule_set().evaluate(&text);
        info!(check = %kind, passed = report.passed, "heuristic check finished");

        Ok(report)
    }

    /// Evaluate a check against text already in memory
    pub fn analyze_text(kind: CheckKind, text: &str) -> CheckReport {
        kind.rule_set().evaluate(text)
    }

    fn read_artifact(&self, relative: &str) -> Result<String, ReleaseError> {
        let path = self.project_root.join(relative);

        fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ReleaseError::MissingArtifacts {
                missing: vec![relative.to_string()],
            },
            _ => ReleaseError::ArtifactUnreadable {
                path: relative.to_string(),
                message: e.to_string(),
            },
        })
    }
}
