//! Chain capability trait.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use chrono::{DateTime, Utc};

use crate::error::ChainResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handle to a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxHandle {
    pub hash: TxHash,
    pub submitted_at: DateTime<Utc>,
}

impl TxHandle {
    pub fn new(hash: TxHash) -> Self {
        Self {
            hash,
            submitted_at: Utc::now(),
        }
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// A transaction mined with a successful status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub hash: TxHash,
    pub block_number: Option<u64>,
}

/// Access to the monitored contract and the swap router.
pub trait ChainClient: Send + Sync {
    /// Latest block number.
    fn block_number(&self) -> BoxFuture<'_, ChainResult<u64>>;

    /// Read the monitored state value: `getAmountOut(amountIn, tokenIn, tokenOut)`.
    fn get_amount_out(
        &self,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
    ) -> BoxFuture<'_, ChainResult<U256>>;

    /// Submit `swapForExactTokens`. Returns once the transaction is broadcast.
    fn swap_for_exact_tokens(
        &self,
        amount_out: U256,
        token_in: Address,
        token_out: Address,
        max_cost: U256,
    ) -> BoxFuture<'_, ChainResult<TxHandle>>;

    /// Wait until the transaction is mined.
    ///
    /// Unbounded; callers apply a timeout. A reverted receipt is
    /// `ChainError::Reverted`.
    fn wait_for_confirmation(&self, tx: TxHandle) -> BoxFuture<'_, ChainResult<Confirmation>>;
}

/// Arc wrapper for ChainClient trait objects.
pub type DynChainClient = Arc<dyn ChainClient>;
