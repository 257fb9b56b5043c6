//! Progress reporting for pipeline runs
//!
//! The runner and its steps never print directly; they talk to a [`Reporter`].
//! [`ConsoleReporter`] renders the familiar emoji progress output, and
//! [`MemoryReporter`] records events so tests can assert on them.

use super::pipeline_runner::PipelineResult;
use crate::bundle::BundleManifest;
use crate::core::state_machine::PipelineState;
use crate::core::traits::Outcome;
use crate::security::rules::CheckReport;
use std::sync::Mutex;
use tracing::{info, warn};

/// Receives progress events from a pipeline run
pub trait Reporter: Send + Sync {
    fn pipeline_started(&self, title: &str, step_count: usize);

    fn step_started(&self, index: usize, total: usize, name: &str);

    fn step_finished(&self, name: &str, outcome: &Outcome, duration_ms: u64);

    /// A heuristic check finished evaluating its rules
    fn check_reported(&self, report: &CheckReport);

    fn bundle_assembled(&self, manifest: &BundleManifest);

    fn info(&self, message: &str);

    fn warning(&self, message: &str);

    fn pipeline_finished(&self, result: &PipelineResult);
}

// ============================================================================
// Console
// ============================================================================

/// Reporter printing progress to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn pipeline_started(&self, title: &str, step_count: usize) {
        info!(title, step_count, "pipeline started");
        println!("\n🚀 {}", title);
        println!("{}", "=".repeat(60));
    }

    fn step_started(&self, index: usize, total: usize, name: &str) {
        info!(step = name, index, total, "step started");
        println!("\n▶️  Step {}/{}: {}", index, total, name);
    }

    fn step_finished(&self, name: &str, outcome: &Outcome, duration_ms: u64) {
        info!(step = name, status = outcome.label(), duration_ms, "step finished");
        match outcome {
            Outcome::Pass => println!("  ✅ {} passed ({}ms)", name, duration_ms),
            Outcome::Fail(reason) => println!("  ❌ {} failed: {}", name, reason),
            Outcome::Error(message) => println!("  💥 {} errored: {}", name, message),
        }
    }

    fn check_reported(&self, report: &CheckReport) {
        for sub_check in &report.sub_checks {
            let icon = match (sub_check.passed, sub_check.gating) {
                (true, _) => "✅",
                (false, true) => "❌",
                (false, false) => "⚠️ ",
            };
            match &sub_check.detail {
                Some(detail) => println!("    {} {} ({})", icon, sub_check.description, detail),
                None => println!("    {} {}", icon, sub_check.description),
            }
        }
    }

    fn bundle_assembled(&self, manifest: &BundleManifest) {
        for path in &manifest.excluded {
            println!("    ⚠️  Excluded: {}", path);
        }
        println!("    📦 {} file(s) copied to {}", manifest.file_count(), manifest.output_dir.display());
        println!(
            "    📏 Total bundle size: {} bytes ({:.2} KB)",
            manifest.total_bytes,
            manifest.total_kib()
        );
    }

    fn info(&self, message: &str) {
        info!("{}", message);
        println!("    ℹ️  {}", message);
    }

    fn warning(&self, message: &str) {
        warn!("{}", message);
        println!("    ⚠️  {}", message);
    }

    fn pipeline_finished(&self, result: &PipelineResult) {
        println!("\n{}", "=".repeat(60));
        println!("📋 Summary");
        println!("{}", "=".repeat(60));

        for record in &result.records {
            let icon = if record.outcome.is_pass() { "✅" } else { "❌" };
            println!("  {} {}: {}", icon, record.name, record.outcome);
        }
        for name in &result.not_executed {
            println!("  ⏭️  {}: not executed", name);
        }

        println!(
            "\n  {}/{} executed step(s) passed",
            result.passed_count(),
            result.executed_count()
        );
        match result.state {
            PipelineState::Completed => println!("\n🎉 Release pipeline completed"),
            _ => println!("\n🛑 Release pipeline aborted"),
        }
    }
}

// ============================================================================
// Memory
// ============================================================================

/// One recorded reporter call
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    PipelineStarted { title: String, step_count: usize },
    StepStarted { index: usize, name: String },
    StepFinished { name: String, outcome: Outcome },
    CheckReported(CheckReport),
    BundleAssembled(BundleManifest),
    Info(String),
    Warning(String),
    PipelineFinished { state: PipelineState, executed: usize, passed: usize },
}

/// Reporter recording every event in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events, oldest first
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Check reports recorded so far
    pub fn check_reports(&self) -> Vec<CheckReport> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::CheckReported(report) => Some(report),
                _ => None,
            })
            .collect()
    }

    /// The last bundle manifest recorded, if any
    pub fn bundle_manifest(&self) -> Option<BundleManifest> {
        self.events().into_iter().rev().find_map(|event| match event {
            ReportEvent::BundleAssembled(manifest) => Some(manifest),
            _ => None,
        })
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Warning(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: ReportEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

impl Reporter for MemoryReporter {
    fn pipeline_started(&self, title: &str, step_count: usize) {
        self.record(ReportEvent::PipelineStarted {
            title: title.to_string(),
            step_count,
        });
    }

    fn step_started(&self, index: usize, _total: usize, name: &str) {
        self.record(ReportEvent::StepStarted {
            index,
            name: name.to_string(),
        });
    }

    fn step_finished(&self, name: &str, outcome: &Outcome, _duration_ms: u64) {
        self.record(ReportEvent::StepFinished {
            name: name.to_string(),
            outcome: outcome.clone(),
        });
    }

    fn check_reported(&self, report: &CheckReport) {
        self.record(ReportEvent::CheckReported(report.clone()));
    }

    fn bundle_assembled(&self, manifest: &BundleManifest) {
        self.record(ReportEvent::BundleAssembled(manifest.clone()));
    }

    fn info(&self, message: &str) {
        self.record(ReportEvent::Info(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.record(ReportEvent::Warning(message.to_string()));
    }

    fn pipeline_finished(&self, result: &PipelineResult) {
        self.record(ReportEvent::PipelineFinished {
            state: result.state,
            executed: result.executed_count(),
            passed: result.passed_count(),
        });
    }
}
