//! Orchestration layer for the release pipeline
//!
//! This module provides the step runner, the concrete release steps and the
//! reporting interface they share.

pub mod pipeline_runner;
pub mod release_pipeline;
pub mod reporter;
pub mod steps;

// Re-export main types for convenience
pub use pipeline_runner::{PipelineResult, PipelineRunner, StepRecord};
pub use release_pipeline::ReleasePipeline;
pub use reporter::{ConsoleReporter, MemoryReporter, ReportEvent, Reporter};
pub use steps::{BundleStep, CoordinatorAction, CoordinatorStep, HeuristicStep, InventoryStep};
