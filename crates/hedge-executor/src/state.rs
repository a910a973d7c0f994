//! Execution lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExecutorError, ExecutorResult};

/// Where an execution stands.
///
/// ```text
/// Idle -> AwaitingChainConfirmation -> ChainFailed
///                                   -> ChainConfirmed -> AwaitingHedgeAck -> HedgeComplete
///                                                                         -> HedgeFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExecutionState {
    #[default]
    Idle,
    AwaitingChainConfirmation,
    ChainConfirmed,
    ChainFailed,
    AwaitingHedgeAck,
    HedgeComplete,
    HedgeFailed,
}

impl ExecutionState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ChainFailed | Self::HedgeComplete | Self::HedgeFailed)
    }

    #[must_use]
    pub fn can_transition_to(&self, next: ExecutionState) -> bool {
        use ExecutionState::*;
        matches!(
            (self, next),
            (Idle, AwaitingChainConfirmation)
                | (AwaitingChainConfirmation, ChainConfirmed)
                | (AwaitingChainConfirmation, ChainFailed)
                | (ChainConfirmed, AwaitingHedgeAck)
                | (AwaitingHedgeAck, HedgeComplete)
                | (AwaitingHedgeAck, HedgeFailed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingChainConfirmation => "awaiting_chain_confirmation",
            Self::ChainConfirmed => "chain_confirmed",
            Self::ChainFailed => "chain_failed",
            Self::AwaitingHedgeAck => "awaiting_hedge_ack",
            Self::HedgeComplete => "hedge_complete",
            Self::HedgeFailed => "hedge_failed",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state plus every state passed through, starting at `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionTracker {
    state: ExecutionState,
    history: Vec<ExecutionState>,
}

impl Default for ExecutionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionTracker {
    pub fn new() -> Self {
        Self {
            state: ExecutionState::Idle,
            history: vec![ExecutionState::Idle],
        }
    }

    #[must_use]
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    #[must_use]
    pub fn history(&self) -> &[ExecutionState] {
        &self.history
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: ExecutionState) -> ExecutorResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(ExecutorError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(from = %self.state, to = %next, "Execution transition");
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    pub fn into_history(self) -> Vec<ExecutionState> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ExecutionState::*;

    #[test]
    fn test_happy_path() {
        let mut tracker = ExecutionTracker::new();
        for next in [AwaitingChainConfirmation, ChainConfirmed, AwaitingHedgeAck, HedgeComplete] {
            tracker.transition(next).unwrap();
        }
        assert_eq!(tracker.state(), HedgeComplete);
        assert!(tracker.state().is_terminal());
        assert_eq!(tracker.history().len(), 5);
    }

    #[test]
    fn test_hedge_requires_confirmed_chain() {
        assert!(!Idle.can_transition_to(AwaitingHedgeAck));
        assert!(!AwaitingChainConfirmation.can_transition_to(AwaitingHedgeAck));
        assert!(!ChainFailed.can_transition_to(AwaitingHedgeAck));
        assert!(ChainConfirmed.can_transition_to(AwaitingHedgeAck));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [ChainFailed, HedgeComplete, HedgeFailed] {
            for next in [
                Idle,
                AwaitingChainConfirmation,
                ChainConfirmed,
                ChainFailed,
                AwaitingHedgeAck,
                HedgeComplete,
                HedgeFailed,
            ] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut tracker = ExecutionTracker::new();
        let err = tracker.transition(HedgeComplete).unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::InvalidTransition {
                from: Idle,
                to: HedgeComplete
            }
        ));
        assert_eq!(tracker.history(), &[Idle]);
    }
}
