//! Chain error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract call failed: {0}")]
    Contract(String),

    #[error("Transaction submission failed: {0}")]
    Submission(String),

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Confirmation timed out for {tx_hash}")]
    ConfirmationTimeout { tx_hash: String },

    #[error("No signer configured: {0}")]
    MissingSigner(String),

    #[error("Invalid signer key: {0}")]
    InvalidKey(String),

    #[error("Invalid address {field}: {reason}")]
    InvalidAddress { field: &'static str, reason: String },

    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unit conversion failed: {0}")]
    Conversion(String),
}

pub type ChainResult<T> = Result<T, ChainError>;
