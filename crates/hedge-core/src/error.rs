//! Error types for hedge-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
