//! On-chain side of the hedge engine.
//!
//! - [`ChainClient`]: read the monitored state, submit the swap, await receipts
//! - [`RouterClient`]: alloy-backed implementation against a router contract
//! - [`ChainWatcher`]: per-block polling that reports state changes
//! - [`MockChainClient`]: scripted client for tests

pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod router;
pub mod units;
pub mod watcher;

pub use alloy::primitives::{Address, TxHash, U256};
pub use client::{BoxFuture, ChainClient, Confirmation, DynChainClient, TxHandle};
pub use config::{ChainConfig, SwapRoute};
pub use error::{ChainError, ChainResult};
pub use mock::{ConfirmBehavior, MockChainClient, SwapCall};
pub use router::RouterClient;
pub use units::{from_base_units, to_base_units, Rounding};
pub use watcher::{ChainWatcher, StateChange};
