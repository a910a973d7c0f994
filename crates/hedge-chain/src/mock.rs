//! Scripted chain client for tests.

use std::collections::VecDeque;

use alloy::primitives::{Address, TxHash, U256};
use parking_lot::Mutex;

use crate::client::{BoxFuture, ChainClient, Confirmation, TxHandle};
use crate::error::{ChainError, ChainResult};

/// How a submitted swap resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmBehavior {
    #[default]
    Confirm,
    Revert,
    /// Never mined.
    Hang,
}

/// A recorded `swapForExactTokens` submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapCall {
    pub amount_out: U256,
    pub token_in: Address,
    pub token_out: Address,
    pub max_cost: U256,
}

/// In-memory [`ChainClient`].
///
/// The block number and state value are set directly; queued states are
/// served one per read before falling back to the current state.
#[derive(Debug, Default)]
pub struct MockChainClient {
    block: Mutex<u64>,
    state: Mutex<U256>,
    queued_states: Mutex<VecDeque<U256>>,
    fail_reads: Mutex<Option<String>>,
    fail_submission: Mutex<Option<String>>,
    confirm: Mutex<ConfirmBehavior>,
    reads: Mutex<u64>,
    submissions: Mutex<Vec<SwapCall>>,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_state(self, state: U256) -> Self {
        *self.state.lock() = state;
        self
    }

    pub fn set_block(&self, block: u64) {
        *self.block.lock() = block;
    }

    /// Advance the chain by `blocks`; returns the new head.
    pub fn advance(&self, blocks: u64) -> u64 {
        let mut block = self.block.lock();
        *block += blocks;
        *block
    }

    pub fn set_state(&self, state: U256) {
        *self.state.lock() = state;
    }

    /// Serve `states` on the next reads, in order.
    pub fn queue_states(&self, states: impl IntoIterator<Item = U256>) {
        self.queued_states.lock().extend(states);
    }

    pub fn set_fail_reads(&self, reason: Option<&str>) {
        *self.fail_reads.lock() = reason.map(str::to_string);
    }

    pub fn set_fail_submission(&self, reason: Option<&str>) {
        *self.fail_submission.lock() = reason.map(str::to_string);
    }

    pub fn set_confirm_behavior(&self, behavior: ConfirmBehavior) {
        *self.confirm.lock() = behavior;
    }

    #[must_use]
    pub fn read_count(&self) -> u64 {
        *self.reads.lock()
    }

    #[must_use]
    pub fn submissions(&self) -> Vec<SwapCall> {
        self.submissions.lock().clone()
    }

    #[must_use]
    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }
}

impl ChainClient for MockChainClient {
    fn block_number(&self) -> BoxFuture<'_, ChainResult<u64>> {
        Box::pin(async move { Ok(*self.block.lock()) })
    }

    fn get_amount_out(
        &self,
        _amount_in: U256,
        _token_in: Address,
        _token_out: Address,
    ) -> BoxFuture<'_, ChainResult<U256>> {
        Box::pin(async move {
            *self.reads.lock() += 1;
            if let Some(reason) = self.fail_reads.lock().clone() {
                return Err(ChainError::Contract(reason));
            }
            if let Some(next) = self.queued_states.lock().pop_front() {
                *self.state.lock() = next;
            }
            Ok(*self.state.lock())
        })
    }

    fn swap_for_exact_tokens(
        &self,
        amount_out: U256,
        token_in: Address,
        token_out: Address,
        max_cost: U256,
    ) -> BoxFuture<'_, ChainResult<TxHandle>> {
        Box::pin(async move {
            if let Some(reason) = self.fail_submission.lock().clone() {
                return Err(ChainError::Submission(reason));
            }
            let mut submissions = self.submissions.lock();
            submissions.push(SwapCall {
                amount_out,
                token_in,
                token_out,
                max_cost,
            });
            let hash = TxHash::from(U256::from(submissions.len()).to_be_bytes::<32>());
            Ok(TxHandle::new(hash))
        })
    }

    fn wait_for_confirmation(&self, tx: TxHandle) -> BoxFuture<'_, ChainResult<Confirmation>> {
        Box::pin(async move {
            let behavior = *self.confirm.lock();
            match behavior {
                ConfirmBehavior::Confirm => Ok(Confirmation {
                    hash: tx.hash,
                    block_number: Some(*self.block.lock()),
                }),
                ConfirmBehavior::Revert => Err(ChainError::Reverted {
                    tx_hash: tx.hash.to_string(),
                }),
                ConfirmBehavior::Hang => std::future::pending().await,
            }
        })
    }
}
