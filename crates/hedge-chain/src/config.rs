//! Chain configuration.

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ChainError, ChainResult};

/// RPC endpoint, contracts and polling cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Router contract exposing `getAmountOut` and `swapForExactTokens`.
    #[serde(default)]
    pub router_address: String,
    /// Token paid into the swap and used as the probe input.
    #[serde(default)]
    pub token_in: String,
    /// Token bought by the swap.
    #[serde(default)]
    pub token_out: String,
    #[serde(default = "default_token_in_decimals")]
    pub token_in_decimals: u8,
    #[serde(default = "default_token_out_decimals")]
    pub token_out_decimals: u8,
    /// Env var holding the signer private key.
    #[serde(default = "default_signer_key_env")]
    pub signer_key_env: String,
    /// Block polling interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Raw `amountIn` passed to the monitored `getAmountOut` read.
    #[serde(default = "default_probe_amount_in")]
    pub probe_amount_in: u64,
    /// Receipt polling interval in milliseconds.
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_token_in_decimals() -> u8 {
    18
}

fn default_token_out_decimals() -> u8 {
    6
}

fn default_signer_key_env() -> String {
    "HEDGE_CHAIN_KEY".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_probe_amount_in() -> u64 {
    100_000
}

fn default_receipt_poll_interval_ms() -> u64 {
    1000
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            router_address: String::new(),
            token_in: String::new(),
            token_out: String::new(),
            token_in_decimals: default_token_in_decimals(),
            token_out_decimals: default_token_out_decimals(),
            signer_key_env: default_signer_key_env(),
            poll_interval_ms: default_poll_interval_ms(),
            probe_amount_in: default_probe_amount_in(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
        }
    }
}

/// Token pair traded by the chain leg, with unit scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRoute {
    pub token_in: Address,
    pub token_out: Address,
    pub token_in_decimals: u8,
    pub token_out_decimals: u8,
}

fn parse_address(field: &'static str, value: &str) -> ChainResult<Address> {
    Address::from_str(value.trim()).map_err(|e| ChainError::InvalidAddress {
        field,
        reason: format!("{value:?}: {e}"),
    })
}

impl ChainConfig {
    pub fn rpc_url(&self) -> ChainResult<Url> {
        Url::parse(&self.rpc_url).map_err(|e| ChainError::InvalidUrl(format!("{}: {e}", self.rpc_url)))
    }

    pub fn router(&self) -> ChainResult<Address> {
        parse_address("router_address", &self.router_address)
    }

    pub fn route(&self) -> ChainResult<SwapRoute> {
        Ok(SwapRoute {
            token_in: parse_address("token_in", &self.token_in)?,
            token_out: parse_address("token_out", &self.token_out)?,
            token_in_decimals: self.token_in_decimals,
            token_out_decimals: self.token_out_decimals,
        })
    }

    pub fn probe_amount(&self) -> U256 {
        U256::from(self.probe_amount_in)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    /// Validate endpoint, addresses and intervals.
    pub fn validate(&self) -> ChainResult<()> {
        self.rpc_url()?;
        self.router()?;
        self.route()?;
        if self.poll_interval_ms == 0 {
            return Err(ChainError::Config("chain.poll_interval_ms must be > 0".to_string()));
        }
        if self.receipt_poll_interval_ms == 0 {
            return Err(ChainError::Config(
                "chain.receipt_poll_interval_ms must be > 0".to_string(),
            ));
        }
        // Decimal mantissas hold at most 28 digits.
        if self.token_in_decimals > 28 || self.token_out_decimals > 28 {
            return Err(ChainError::Config("token decimals must be <= 28".to_string()));
        }
        Ok(())
    }
}
