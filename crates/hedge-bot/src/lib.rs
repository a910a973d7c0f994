//! Chain-triggered hedge bot.
//!
//! Watches an on-chain value; every change starts a cycle that snapshots all
//! configured venues, prices the hedge on each, selects the cheapest venue
//! and, in trading mode, executes the swap and the hedge order.

pub mod app;
pub mod config;
pub mod cycle;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, OperatingMode, TelemetryConfig};
pub use cycle::{CycleOutcome, CycleReport};
pub use error::{AppError, AppResult};
