//! Two-phase execution of a hedge decision.
//!
//! Phase A submits the on-chain swap and waits for confirmation. Phase B
//! places the hedge order on the selected venue, and only runs after Phase A
//! confirmed. The phases are not atomic: a failed hedge leaves the confirmed
//! swap in place and the report says so.
//!
//! # Key Components
//!
//! - [`ExecutionCoordinator`]: runs both phases for one decision
//! - [`ExecutionState`]: the lifecycle and its legal transitions
//! - [`ExecutionReport`]: final state, transition history and leg results

pub mod config;
pub mod coordinator;
pub mod error;
pub mod state;

pub use config::ExecutionConfig;
pub use coordinator::{ExecutionCoordinator, ExecutionReport};
pub use error::{ExecutorError, ExecutorResult};
pub use state::{ExecutionState, ExecutionTracker};
