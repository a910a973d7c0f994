//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type FeedResult<T> = Result<T, FeedError>;
