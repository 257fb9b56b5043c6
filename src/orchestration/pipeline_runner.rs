//! Pipeline runner - ordered step execution with abort on first failure
//!
//! Steps run strictly one after another. Whatever a step produces, a normal
//! [`Outcome`], an error or a panic, becomes an outcome in the result; the first
//! non-`Pass` outcome moves the run to `Aborted` and the remaining steps are
//! listed as not executed.

use super::reporter::Reporter;
use crate::core::error::ReleaseError;
use crate::core::state_machine::{PipelineState, PipelineStateMachine};
use crate::core::traits::{Outcome, PipelineStep};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Outcome of one executed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
}

/// Result of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub state: PipelineState,
    /// Executed steps in execution order
    pub records: Vec<StepRecord>,
    /// Declared steps skipped after an abort, in declared order
    pub not_executed: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineResult {
    pub fn executed_count(&self) -> usize {
        self.records.len()
    }

    pub fn passed_count(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_pass()).count()
    }

    pub fn is_success(&self) -> bool {
        self.state == PipelineState::Completed
    }

    /// Process exit code: 0 on `Completed`, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    /// The record that aborted the run, if any
    pub fn failed_step(&self) -> Option<&StepRecord> {
        self.records.iter().find(|r| !r.outcome.is_pass())
    }
}

/// Executes an ordered list of steps
pub struct PipelineRunner {
    title: String,
    steps: Vec<Arc<dyn PipelineStep>>,
    reporter: Arc<dyn Reporter>,
    state_machine: PipelineStateMachine,
}

impl PipelineRunner {
    pub fn new(title: &str, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            title: title.to_string(),
            steps: Vec::new(),
            reporter,
            state_machine: PipelineStateMachine::new(),
        }
    }

    /// Append a step; steps run in the order they are added
    pub fn add_step(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step until one does not pass
    ///
    /// The runner is consumed; a finished run cannot be resumed or retried.
    pub async fn run(mut self) -> Result<PipelineResult, ReleaseError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = self.steps.len();

        self.state_machine.transition(PipelineState::Running, None)?;
        self.reporter.pipeline_started(&self.title, total);
        info!(%run_id, steps = total, "pipeline running");

        let mut records = Vec::with_capacity(total);
        let mut aborted_at = None;

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name().to_string();
            self.reporter.step_started(index + 1, total, &name);

            let started = Instant::now();
            let outcome = Self::execute(Arc::clone(step)).await;
            if let Outcome::Error(message) = &outcome {
                error!(step = %name, error = %message, "step raised an error");
            }
            let duration_ms = started.elapsed().as_millis() as u64;

            self.reporter.step_finished(&name, &outcome, duration_ms);
            let passed = outcome.is_pass();
            records.push(StepRecord {
                name,
                outcome,
                duration_ms,
            });

            if !passed {
                aborted_at = Some(index);
                break;
            }
        }

        let not_executed: Vec<String> = match aborted_at {
            Some(index) => {
                let failed = records[index].name.as_str();
                self.state_machine
                    .transition(PipelineState::Aborted, Some(failed))?;
                self.steps[index + 1..]
                    .iter()
                    .map(|s| s.name().to_string())
                    .collect()
            }
            None => {
                self.state_machine
                    .transition(PipelineState::Completed, None)?;
                Vec::new()
            }
        };

        debug!(history = %self.state_machine.get_history(), "pipeline transitions");

        let result = PipelineResult {
            run_id,
            state: self.state_machine.get_state(),
            records,
            not_executed,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            %run_id,
            state = %result.state,
            executed = result.executed_count(),
            passed = result.passed_count(),
            elapsed_ms = self.state_machine.get_elapsed_time(),
            "pipeline finished"
        );
        self.reporter.pipeline_finished(&result);

        Ok(result)
    }

    /// Run one step on its own task so a panic surfaces as an error outcome
    async fn execute(step: Arc<dyn PipelineStep>) -> Outcome {
        match tokio::spawn(async move { step.run().await }).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => Outcome::error(format!("{:#}", e)),
            Err(join_error) if join_error.is_panic() => {
                let payload = join_error.into_panic();
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Outcome::error(format!("step panicked: {}", message))
            }
            Err(join_error) => Outcome::error(format!("step task failed: {}", join_error)),
        }
    }
}
