//! Release pipeline - the full ordered step list for one release
//!
//! Credential validation runs first so a missing token fails fast. After it
//! come the inventory and heuristic gates, then bundle assembly, and last the
//! publish steps handled by the [`PublishCoordinator`].

use super::pipeline_runner::{PipelineResult, PipelineRunner};
use super::reporter::Reporter;
use super::steps::{BundleStep, CoordinatorAction, CoordinatorStep, HeuristicStep, InventoryStep};
use crate::bundle::BundleAssembler;
use crate::core::config::PipelineConfig;
use crate::core::error::ReleaseError;
use crate::core::traits::PublishCoordinator;
use crate::security::heuristics::{CheckKind, HeuristicAnalyzer};
use crate::validation::SourceInventoryChecker;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builds and runs the release steps for one project
pub struct ReleasePipeline {
    config: Arc<PipelineConfig>,
    project_root: PathBuf,
    reporter: Arc<dyn Reporter>,
    coordinator: Arc<dyn PublishCoordinator>,
}

impl ReleasePipeline {
    pub fn new<P: AsRef<Path>>(
        config: Arc<PipelineConfig>,
        project_root: P,
        reporter: Arc<dyn Reporter>,
        coordinator: Arc<dyn PublishCoordinator>,
    ) -> Self {
        Self {
            config,
            project_root: project_root.as_ref().to_path_buf(),
            reporter,
            coordinator,
        }
    }

    /// Assemble the runner with every step in release order
    pub fn build(&self) -> PipelineRunner {
        let config = &self.config;
        let title = format!(
            "Releasing {} v{}",
            config.repository_slug(),
            config.project.version
        );
        let analyzer = Arc::new(HeuristicAnalyzer::new(
            &self.project_root,
            config.sources.artifacts.clone(),
        ));

        let mut runner = PipelineRunner::new(&title, Arc::clone(&self.reporter))
            .add_step(self.coordinator_step(CoordinatorAction::ValidateCredentials))
            .add_step(Box::new(InventoryStep::new(
                SourceInventoryChecker::new(config.sources.manifest.clone()),
                self.project_root.clone(),
                Arc::clone(&self.reporter),
            )));

        for kind in CheckKind::ALL {
            runner = runner.add_step(Box::new(HeuristicStep::new(
                kind,
                Arc::clone(&analyzer),
                Arc::clone(&self.reporter),
            )));
        }

        runner
            .add_step(Box::new(BundleStep::new(
                BundleAssembler::new(&config.bundle.exclusions, config.bundle.budget_bytes),
                self.project_root.clone(),
                &config.sources.source_dir,
                &config.sources.dist_dir,
                Arc::clone(&self.reporter),
            )))
            .add_step(self.coordinator_step(CoordinatorAction::CheckRepository))
            .add_step(self.coordinator_step(CoordinatorAction::AnnouncePurge))
            .add_step(self.coordinator_step(CoordinatorAction::EmitWorkflow))
            .add_step(self.coordinator_step(CoordinatorAction::PublishRelease))
            .add_step(self.coordinator_step(CoordinatorAction::VerifyAvailability))
    }

    /// Build and run the pipeline
    pub async fn run(&self) -> Result<PipelineResult, ReleaseError> {
        self.build().run().await
    }

    fn coordinator_step(&self, action: CoordinatorAction) -> Box<CoordinatorStep> {
        Box::new(CoordinatorStep::new(action, Arc::clone(&self.coordinator)))
    }
}
