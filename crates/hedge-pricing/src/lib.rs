//! Hedge pricing: fill simulation, cost adjustment and venue selection.
//!
//! Pure, synchronous stages applied to the snapshots of one aggregation:
//!
//! 1. [`simulate_fill`] walks one side of a book for the target volume
//! 2. [`CostModel`] adjusts the fill cost for taker fees and funding
//! 3. [`select_venue`] picks the cheapest quote and builds a [`HedgeDecision`]
//!
//! [`HedgePlanner`] chains the three for a set of snapshots.

pub mod config;
pub mod cost;
pub mod error;
pub mod fill;
pub mod planner;
pub mod selector;

pub use config::{CostPolicy, PricingConfig};
pub use cost::{CostModel, CostedQuote, QuoteWarning};
pub use error::{PricingError, PricingResult};
pub use fill::{simulate_fill, simulate_snapshot_fill, FillResult, INFEASIBLE_COST};
pub use planner::{HedgePlan, HedgePlanner};
pub use selector::{select_venue, HedgeDecision};
