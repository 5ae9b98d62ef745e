use crate::error::{TransferError, TransferResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Lifecycle of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Run created, client not yet bound
    #[default]
    Init,
    /// Reading the job configuration table
    Configuring,
    /// Running batches
    Fetching,
    /// Normalizing the aggregate
    Cleaning,
    /// Writing destinations
    Writing,
    /// Writing best-effort status rows
    Reporting,
    /// Run finished
    Done,
    /// Run aborted on a fatal error
    Failed,
}

impl PipelineState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Init, Configuring)
                | (Configuring, Fetching)
                | (Configuring, Done)
                | (Configuring, Failed)
                | (Fetching, Cleaning)
                | (Fetching, Failed)
                | (Cleaning, Writing)
                | (Cleaning, Failed)
                | (Writing, Reporting)
                | (Writing, Failed)
                | (Reporting, Done)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Configuring => write!(f, "configuring"),
            Self::Fetching => write!(f, "fetching"),
            Self::Cleaning => write!(f, "cleaning"),
            Self::Writing => write!(f, "writing"),
            Self::Reporting => write!(f, "reporting"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PipelineState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Self::Init),
            "configuring" => Ok(Self::Configuring),
            "fetching" => Ok(Self::Fetching),
            "cleaning" => Ok(Self::Cleaning),
            "writing" => Ok(Self::Writing),
            "reporting" => Ok(Self::Reporting),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid pipeline state: {s}")),
        }
    }
}

/// Tracks the current state and every state visited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStateMachine {
    current: PipelineState,
    history: Vec<PipelineState>,
}

impl Default for PipelineStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStateMachine {
    pub fn new() -> Self {
        Self {
            current: PipelineState::Init,
            history: vec![PipelineState::Init],
        }
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn transition(&mut self, next: PipelineState) -> TransferResult<()> {
        if !self.current.can_transition_to(next) {
            return Err(TransferError::StateTransition {
                from: self.current.to_string(),
                to: next.to_string(),
            });
        }
        debug!(from = %self.current, to = %next, "🔄 Pipeline state transition");
        self.current = next;
        self.history.push(next);
        Ok(())
    }

    /// Move to `Failed` if the current state allows it; returns whether it did
    pub fn fail(&mut self) -> bool {
        self.transition(PipelineState::Failed).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut machine = PipelineStateMachine::new();
        for state in [
            PipelineState::Configuring,
            PipelineState::Fetching,
            PipelineState::Cleaning,
            PipelineState::Writing,
            PipelineState::Reporting,
            PipelineState::Done,
        ] {
            machine.transition(state).unwrap();
        }
        assert!(machine.current().is_terminal());
        assert_eq!(machine.history().len(), 7);
    }

    #[test]
    fn test_empty_configuration_short_circuits() {
        let mut machine = PipelineStateMachine::new();
        machine.transition(PipelineState::Configuring).unwrap();
        machine.transition(PipelineState::Done).unwrap();
        assert_eq!(machine.current(), PipelineState::Done);
    }

    #[test]
    fn test_failed_reachable_from_work_states_only() {
        for state in [
            PipelineState::Configuring,
            PipelineState::Fetching,
            PipelineState::Cleaning,
            PipelineState::Writing,
        ] {
            assert!(state.can_transition_to(PipelineState::Failed), "{state}");
        }
        for state in [
            PipelineState::Init,
            PipelineState::Reporting,
            PipelineState::Done,
            PipelineState::Failed,
        ] {
            assert!(!state.can_transition_to(PipelineState::Failed), "{state}");
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut machine = PipelineStateMachine::new();
        machine.transition(PipelineState::Configuring).unwrap();
        assert!(machine.fail());
        assert!(!machine.fail());
        let err = machine.transition(PipelineState::Fetching).unwrap_err();
        assert!(matches!(err, TransferError::StateTransition { .. }));
    }

    #[test]
    fn test_skipping_states_rejected() {
        let mut machine = PipelineStateMachine::new();
        assert!(machine.transition(PipelineState::Fetching).is_err());
        assert_eq!(machine.current(), PipelineState::Init);
    }

    #[test]
    fn test_string_round_trip() {
        for state in ["init", "fetching", "reporting", "failed"] {
            let parsed: PipelineState = state.parse().unwrap();
            assert_eq!(parsed.to_string(), state);
        }
        assert!("paused".parse::<PipelineState>().is_err());
    }
}
