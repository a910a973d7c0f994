//! Venue error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VenueError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Venue error {code}: {message}")]
    Exchange { code: i64, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Missing API credentials for {0}")]
    MissingCredentials(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for VenueError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e.to_string())
        }
    }
}

pub type VenueResult<T> = Result<T, VenueError>;
