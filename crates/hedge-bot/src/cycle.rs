//! Per-cycle outcome and report.

use std::fmt;
use std::time::Duration;

use hedge_chain::StateChange;
use hedge_executor::{ExecutionReport, ExecutionState};
use hedge_feed::FeedWarning;
use hedge_pricing::{CostedQuote, HedgeDecision};

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleOutcome {
    /// The watched value did not change.
    NoTrigger,
    /// Swap confirmed and hedge order accepted.
    Completed,
    /// Swap not confirmed; no hedge order was attempted.
    ChainFailed,
    /// Swap confirmed, hedge order failed. The position is unhedged.
    HedgeFailedAfterChainSuccess,
    /// Nothing to select from.
    NoViableVenue,
    /// Decision computed in observation mode, nothing executed.
    Observed,
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoTrigger => "no_trigger",
            Self::Completed => "completed",
            Self::ChainFailed => "chain_failed",
            Self::HedgeFailedAfterChainSuccess => "hedge_failed",
            Self::NoViableVenue => "no_viable_venue",
            Self::Observed => "observed",
        }
    }

    /// Map a finished execution to the cycle outcome.
    pub fn from_execution(state: ExecutionState) -> Self {
        match state {
            ExecutionState::HedgeComplete => Self::Completed,
            ExecutionState::HedgeFailed => Self::HedgeFailedAfterChainSuccess,
            // The coordinator always ends terminal; anything short of a hedge
            // attempt means the chain leg did not confirm.
            _ => Self::ChainFailed,
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one cycle produced.
#[derive(Debug)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub trigger: Option<StateChange>,
    pub decision: Option<HedgeDecision>,
    pub quotes: Vec<CostedQuote>,
    pub warnings: Vec<FeedWarning>,
    pub execution: Option<ExecutionReport>,
    pub duration: Duration,
}

impl CycleReport {
    pub fn no_trigger() -> Self {
        Self {
            outcome: CycleOutcome::NoTrigger,
            trigger: None,
            decision: None,
            quotes: Vec::new(),
            warnings: Vec::new(),
            execution: None,
            duration: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_execution() {
        assert_eq!(
            CycleOutcome::from_execution(ExecutionState::HedgeComplete),
            CycleOutcome::Completed
        );
        assert_eq!(
            CycleOutcome::from_execution(ExecutionState::HedgeFailed),
            CycleOutcome::HedgeFailedAfterChainSuccess
        );
        assert_eq!(
            CycleOutcome::from_execution(ExecutionState::ChainFailed),
            CycleOutcome::ChainFailed
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(CycleOutcome::HedgeFailedAfterChainSuccess.to_string(), "hedge_failed");
        assert_eq!(CycleReport::no_trigger().outcome.as_str(), "no_trigger");
    }
}
