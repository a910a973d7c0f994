//! Executor error types.

use hedge_chain::ChainError;
use hedge_core::{CoreError, VenueId};
use hedge_venue::VenueError;
use thiserror::Error;

use crate::state::ExecutionState;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Chain transaction failed: {0}")]
    ChainTransaction(#[source] ChainError),

    #[error("Hedge order failed on {venue}: {source}")]
    HedgeOrder {
        venue: VenueId,
        #[source]
        source: VenueError,
    },

    #[error("Decision for {0} cannot cover the target amount")]
    InfeasibleDecision(VenueId),

    #[error("Invalid hedge order: {0}")]
    InvalidOrder(#[from] CoreError),

    #[error("Venue {0} is not connected")]
    UnknownVenue(VenueId),

    #[error("Decision for {0} has no limit price")]
    MissingLimitPrice(VenueId),

    #[error("Invalid transition {from} -> {to}")]
    InvalidTransition {
        from: ExecutionState,
        to: ExecutionState,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
