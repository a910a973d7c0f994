//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Venue error: {0}")]
    Venue(#[from] hedge_venue::VenueError),

    #[error("Feed error: {0}")]
    Feed(#[from] hedge_feed::FeedError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] hedge_pricing::PricingError),

    #[error("Chain error: {0}")]
    Chain(#[from] hedge_chain::ChainError),

    #[error("Executor error: {0}")]
    Executor(#[from] hedge_executor::ExecutorError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] hedge_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;
