//! Prometheus metrics and structured logging for the hedge engine.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters and histograms for cycles, venues and orders

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
