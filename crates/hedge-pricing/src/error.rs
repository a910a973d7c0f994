//! Pricing error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("No viable venue: no quotes to select from")]
    NoViableVenue,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type PricingResult<T> = Result<T, PricingError>;
