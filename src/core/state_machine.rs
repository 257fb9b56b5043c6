//! State machine for a single pipeline run
//!
//! `NotStarted -> Running -> {Completed, Aborted}`. Terminal states are final.

use crate::core::error::ReleaseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline run state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    NotStarted,
    Running,
    Completed,
    Aborted,
}

impl PipelineState {
    /// Whether no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Aborted)
    }

    fn can_transition_to(&self, to: PipelineState) -> bool {
        matches!(
            (self, to),
            (PipelineState::NotStarted, PipelineState::Running)
                | (PipelineState::Running, PipelineState::Completed)
                | (PipelineState::Running, PipelineState::Aborted)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::NotStarted => "NotStarted",
            PipelineState::Running => "Running",
            PipelineState::Completed => "Completed",
            PipelineState::Aborted => "Aborted",
        };
        write!(f, "{}", label)
    }
}

/// State transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTransition {
    /// From state
    pub from: PipelineState,

    /// To state
    pub to: PipelineState,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Step that caused the transition, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

/// State machine tracking one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStateMachine {
    current_state: PipelineState,
    transitions: Vec<StateTransition>,
}

impl Default for PipelineStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStateMachine {
    /// Create a new state machine in `NotStarted`
    pub fn new() -> Self {
        Self {
            current_state: PipelineState::NotStarted,
            transitions: Vec::new(),
        }
    }

    /// Transition to a new state
    pub fn transition(
        &mut self,
        to: PipelineState,
        step: Option<&str>,
    ) -> Result<(), ReleaseError> {
        if !self.current_state.can_transition_to(to) {
            return Err(ReleaseError::InvalidTransition {
                from: self.current_state.to_string(),
                to: to.to_string(),
            });
        }

        self.transitions.push(StateTransition {
            from: self.current_state,
            to,
            timestamp: Utc::now(),
            step: step.map(str::to_string),
        });
        self.current_state = to;

        Ok(())
    }

    /// Get current state
    pub fn get_state(&self) -> PipelineState {
        self.current_state
    }

    /// Recorded transitions, oldest first
    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    /// Get elapsed time between the first and last transition in milliseconds
    pub fn get_elapsed_time(&self) -> i64 {
        match (self.transitions.first(), self.transitions.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_milliseconds(),
            _ => 0,
        }
    }

    /// Get transition history as human-readable string
    pub fn get_history(&self) -> String {
        self.transitions
            .iter()
            .map(|t| {
                let step = t
                    .step
                    .as_ref()
                    .map(|s| format!(" ({})", s))
                    .unwrap_or_default();
                format!("{}: {} → {}{}", t.timestamp.to_rfc3339(), t.from, t.to, step)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_machine() {
        let state_machine = PipelineStateMachine::new();

        assert_eq!(state_machine.get_state(), PipelineState::NotStarted);
        assert!(state_machine.transitions().is_empty());
        assert_eq!(state_machine.get_elapsed_time(), 0);
    }

    #[test]
    fn test_completed_path() {
        let mut state_machine = PipelineStateMachine::new();

        state_machine.transition(PipelineState::Running, None).unwrap();
        state_machine.transition(PipelineState::Completed, None).unwrap();

        assert_eq!(state_machine.get_state(), PipelineState::Completed);
        assert!(state_machine.get_state().is_terminal());
        assert_eq!(state_machine.transitions().len(), 2);
    }

    #[test]
    fn test_aborted_records_step() {
        let mut state_machine = PipelineStateMachine::new();

        state_machine.transition(PipelineState::Running, None).unwrap();
        state_machine
            .transition(PipelineState::Aborted, Some("Token Handling Check"))
            .unwrap();

        assert_eq!(
            state_machine.transitions()[1].step.as_deref(),
            Some("Token Handling Check")
        );
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut state_machine = PipelineStateMachine::new();
        state_machine.transition(PipelineState::Running, None).unwrap();
        state_machine.transition(PipelineState::Aborted, None).unwrap();

        let result = state_machine.transition(PipelineState::Running, None);

        assert!(matches!(result, Err(ReleaseError::InvalidTransition { .. })));
        assert_eq!(state_machine.get_state(), PipelineState::Aborted);
    }

    #[test]
    fn test_cannot_skip_running() {
        let mut state_machine = PipelineStateMachine::new();

        assert!(state_machine.transition(PipelineState::Completed, None).is_err());
    }

    #[test]
    fn test_get_history() {
        let mut state_machine = PipelineStateMachine::new();
        state_machine.transition(PipelineState::Running, None).unwrap();
        state_machine
            .transition(PipelineState::Aborted, Some("Bundle Assembly"))
            .unwrap();

        let history = state_machine.get_history();
        assert!(history.contains("NotStarted → Running"));
        assert!(history.contains("Running → Aborted (Bundle Assembly)"));
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&PipelineState::NotStarted).unwrap();
        assert_eq!(json, r#""NOT_STARTED""#);
    }
}
