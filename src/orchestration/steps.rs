//! Pipeline steps wrapping the inventory, heuristic, bundle and publish stages

use super::reporter::Reporter;
use crate::bundle::BundleAssembler;
use crate::core::error::ReleaseError;
use crate::core::traits::{Outcome, PipelineStep, PublishCoordinator};
use crate::security::heuristics::{CheckKind, HeuristicAnalyzer};
use crate::validation::SourceInventoryChecker;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Fails when any manifest entry is missing
pub struct InventoryStep {
    checker: SourceInventoryChecker,
    project_root: PathBuf,
    reporter: Arc<dyn Reporter>,
}

impl InventoryStep {
    pub fn new(
        checker: SourceInventoryChecker,
        project_root: PathBuf,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            checker,
            project_root,
            reporter,
        }
    }
}

#[async_trait]
impl PipelineStep for InventoryStep {
    fn name(&self) -> &str {
        "Source Inventory"
    }

    async fn run(&self) -> anyhow::Result<Outcome> {
        let report = self.checker.check(&self.project_root);

        if report.is_complete() {
            self.reporter
                .info(&format!("All {} required files present", report.required.len()));
            return Ok(Outcome::Pass);
        }

        for path in &report.missing {
            self.reporter.warning(&format!("Missing: {}", path));
        }
        Ok(Outcome::fail(
            ReleaseError::MissingArtifacts {
                missing: report.missing,
            }
            .to_string(),
        ))
    }
}

/// Runs one heuristic check and gates on its verdict
pub struct HeuristicStep {
    name: String,
    kind: CheckKind,
    analyzer: Arc<HeuristicAnalyzer>,
    reporter: Arc<dyn Reporter>,
}

impl HeuristicStep {
    pub fn new(kind: CheckKind, analyzer: Arc<HeuristicAnalyzer>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            name: format!("{} Check", kind),
            kind,
            analyzer,
            reporter,
        }
    }
}

#[async_trait]
impl PipelineStep for HeuristicStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> anyhow::Result<Outcome> {
        let report = match self.analyzer.analyze(self.kind) {
            Ok(report) => report,
            // A missing artifact is structural, not a crash
            Err(e @ ReleaseError::MissingArtifacts { .. }) => {
                return Ok(Outcome::fail(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        self.reporter.check_reported(&report);
        for warning in report.warnings() {
            self.reporter
                .warning(&format!("{}: {} (informational)", report.check_name, warning));
        }

        if report.passed {
            return Ok(Outcome::Pass);
        }

        Ok(Outcome::fail(
            ReleaseError::HeuristicFailed {
                check: report.check_name.clone(),
                failed: report
                    .gating_failures()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            }
            .to_string(),
        ))
    }
}

/// Copies the distributable subset of the source tree
pub struct BundleStep {
    assembler: BundleAssembler,
    project_root: PathBuf,
    source_dir: String,
    dist_dir: String,
    reporter: Arc<dyn Reporter>,
}

impl BundleStep {
    pub fn new(
        assembler: BundleAssembler,
        project_root: PathBuf,
        source_dir: &str,
        dist_dir: &str,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            assembler,
            project_root,
            source_dir: source_dir.to_string(),
            dist_dir: dist_dir.to_string(),
            reporter,
        }
    }
}

#[async_trait]
impl PipelineStep for BundleStep {
    fn name(&self) -> &str {
        "Bundle Assembly"
    }

    async fn run(&self) -> anyhow::Result<Outcome> {
        let manifest =
            self.assembler
                .assemble(&self.project_root, &self.source_dir, &self.dist_dir)?;

        self.reporter.bundle_assembled(&manifest);
        if manifest.over_budget {
            self.reporter.warning(&format!(
                "Bundle exceeds {:.0} KB target ({:.2} KB)",
                manifest.budget_bytes as f64 / 1024.0,
                manifest.total_kib()
            ));
        }

        Ok(Outcome::Pass)
    }
}

/// Which collaborator call a [`CoordinatorStep`] makes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorAction {
    ValidateCredentials,
    CheckRepository,
    AnnouncePurge,
    EmitWorkflow,
    PublishRelease,
    VerifyAvailability,
}

impl CoordinatorAction {
    pub fn step_name(&self) -> &'static str {
        match self {
            CoordinatorAction::ValidateCredentials => "Credential Validation",
            CoordinatorAction::CheckRepository => "Repository Check",
            CoordinatorAction::AnnouncePurge => "Purge Notice",
            CoordinatorAction::EmitWorkflow => "Workflow Setup",
            CoordinatorAction::PublishRelease => "Version Control Publish",
            CoordinatorAction::VerifyAvailability => "CDN Availability",
        }
    }
}

/// Delegates to the publish coordinator
pub struct CoordinatorStep {
    action: CoordinatorAction,
    coordinator: Arc<dyn PublishCoordinator>,
}

impl CoordinatorStep {
    pub fn new(action: CoordinatorAction, coordinator: Arc<dyn PublishCoordinator>) -> Self {
        Self {
            action,
            coordinator,
        }
    }
}

#[async_trait]
impl PipelineStep for CoordinatorStep {
    fn name(&self) -> &str {
        self.action.step_name()
    }

    async fn run(&self) -> anyhow::Result<Outcome> {
        match self.action {
            CoordinatorAction::ValidateCredentials => self.coordinator.validate_credentials().await,
            CoordinatorAction::CheckRepository => self.coordinator.check_repository().await,
            CoordinatorAction::AnnouncePurge => self.coordinator.announce_purge().await,
            CoordinatorAction::EmitWorkflow => self.coordinator.emit_workflow().await,
            CoordinatorAction::PublishRelease => self.coordinator.publish_release().await,
            CoordinatorAction::VerifyAvailability => self.coordinator.verify_availability().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ArtifactPaths;
    use crate::orchestration::reporter::MemoryReporter;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_inventory_step_lists_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("present.js"), "x").unwrap();
        let reporter = Arc::new(MemoryReporter::new());
        let checker =
            SourceInventoryChecker::new(vec!["present.js".to_string(), "absent.js".to_string()]);

        let step = InventoryStep::new(checker, dir.path().to_path_buf(), reporter.clone());
        let outcome = step.run().await.unwrap();

        assert_eq!(
            outcome,
            Outcome::fail("Missing 1 required artifact(s): absent.js")
        );
        assert_eq!(reporter.warnings(), vec!["Missing: absent.js".to_string()]);
    }

    #[tokio::test]
    async fn test_heuristic_step_missing_artifact_fails() {
        let dir = TempDir::new().unwrap();
        let analyzer = Arc::new(HeuristicAnalyzer::new(dir.path(), ArtifactPaths::default()));

        let step = HeuristicStep::new(
            CheckKind::Sanitization,
            analyzer,
            Arc::new(MemoryReporter::new()),
        );

        assert_eq!(step.name(), "Sanitization Check");
        let outcome = step.run().await.unwrap();
        assert!(matches!(outcome, Outcome::Fail(reason) if reason.contains("validation.js")));
    }

    #[tokio::test]
    async fn test_heuristic_step_reports_failed_rules() {
        let dir = TempDir::new().unwrap();
        let artifacts = ArtifactPaths::default();
        let path = dir.path().join(&artifacts.query);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "_filter(); operator; eval(code);").unwrap();
        let reporter = Arc::new(MemoryReporter::new());

        let step = HeuristicStep::new(
            CheckKind::InjectionSafety,
            Arc::new(HeuristicAnalyzer::new(dir.path(), artifacts)),
            reporter.clone(),
        );
        let outcome = step.run().await.unwrap();

        assert_eq!(
            outcome,
            Outcome::fail("[Injection Safety] gating checks failed: No eval() usage")
        );
        assert_eq!(reporter.check_reports().len(), 1);
    }

    #[tokio::test]
    async fn test_bundle_step_warns_over_budget() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.js"), vec![b'x'; 2048]).unwrap();
        let reporter = Arc::new(MemoryReporter::new());

        let step = BundleStep::new(
            BundleAssembler::new(&[], 1024),
            dir.path().to_path_buf(),
            "src",
            "dist",
            reporter.clone(),
        );
        let outcome = step.run().await.unwrap();

        assert_eq!(outcome, Outcome::Pass);
        assert!(reporter.bundle_manifest().unwrap().over_budget);
        assert_eq!(
            reporter.warnings(),
            vec!["Bundle exceeds 1 KB target (2.00 KB)".to_string()]
        );
    }

    #[tokio::test]
    async fn test_bundle_step_missing_source_is_error() {
        let dir = TempDir::new().unwrap();
        let step = BundleStep::new(
            BundleAssembler::new(&[], 1024),
            dir.path().to_path_buf(),
            "src",
            "dist",
            Arc::new(MemoryReporter::new()),
        );

        assert!(step.run().await.is_err());
    }
}
