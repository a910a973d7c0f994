//! Router contract client over JSON-RPC.

use std::str::FromStr;
use std::time::Duration;

use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use tracing::{debug, info, warn};
use url::Url;

use crate::client::{BoxFuture, ChainClient, Confirmation, TxHandle};
use crate::config::ChainConfig;
use crate::error::{ChainError, ChainResult};

sol! {
    #[sol(rpc)]
    contract IHedgeRouter {
        function getAmountOut(uint256 amountIn, address tokenIn, address tokenOut) external view returns (uint256);
        function swapForExactTokens(uint256 amountOut, address tokenIn, address tokenOut, uint256 amountInMax) external returns (uint256);
    }
}

/// [`ChainClient`] backed by an alloy HTTP provider.
///
/// Reads work without a signer. Swaps need one; without it they fail with
/// `MissingSigner` before anything is broadcast.
pub struct RouterClient {
    provider: DynProvider,
    router: Address,
    sender: Option<Address>,
    receipt_poll_interval: Duration,
}

impl RouterClient {
    pub fn connect(
        rpc_url: Url,
        router: Address,
        signer: Option<PrivateKeySigner>,
        receipt_poll_interval: Duration,
    ) -> Self {
        let (provider, sender) = match signer {
            Some(signer) => {
                let sender = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(rpc_url)
                    .erased();
                (provider, Some(sender))
            }
            None => (ProviderBuilder::new().connect_http(rpc_url).erased(), None),
        };
        Self {
            provider,
            router,
            sender,
            receipt_poll_interval,
        }
    }

    /// Build from config, reading the signer key from `signer_key_env`.
    pub fn from_config(config: &ChainConfig) -> ChainResult<Self> {
        let rpc_url = config.rpc_url()?;
        let router = config.router()?;
        let signer = match std::env::var(&config.signer_key_env) {
            Ok(key) if !key.trim().is_empty() => Some(
                PrivateKeySigner::from_str(key.trim())
                    .map_err(|e| ChainError::InvalidKey(e.to_string()))?,
            ),
            _ => {
                warn!(
                    key_var = %config.signer_key_env,
                    "No chain signer key set, swaps will be rejected"
                );
                None
            }
        };

        let client = Self::connect(rpc_url, router, signer, config.receipt_poll_interval());
        info!(
            rpc_url = %config.rpc_url,
            %router,
            sender = ?client.sender,
            "Router client connected"
        );
        Ok(client)
    }

    #[must_use]
    pub fn sender(&self) -> Option<Address> {
        self.sender
    }
}

impl ChainClient for RouterClient {
    fn block_number(&self) -> BoxFuture<'_, ChainResult<u64>> {
        Box::pin(async move {
            self.provider
                .get_block_number()
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))
        })
    }

    fn get_amount_out(
        &self,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
    ) -> BoxFuture<'_, ChainResult<U256>> {
        Box::pin(async move {
            let router = IHedgeRouter::new(self.router, &self.provider);
            router
                .getAmountOut(amount_in, token_in, token_out)
                .call()
                .await
                .map_err(|e| ChainError::Contract(format!("getAmountOut: {e}")))
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
            let sender = self.sender.ok_or_else(|| {
                ChainError::MissingSigner("swapForExactTokens requires a signer".to_string())
            })?;

            let router = IHedgeRouter::new(self.router, &self.provider);
            let pending = router
                .swapForExactTokens(amount_out, token_in, token_out, max_cost)
                .from(sender)
                .send()
                .await
                .map_err(|e| ChainError::Submission(e.to_string()))?;

            let handle = TxHandle::new(*pending.tx_hash());
            info!(
                tx_hash = %handle.hash,
                %amount_out,
                %max_cost,
                "Swap submitted"
            );
            Ok(handle)
        })
    }

    fn wait_for_confirmation(&self, tx: TxHandle) -> BoxFuture<'_, ChainResult<Confirmation>> {
        Box::pin(async move {
            loop {
                match self.provider.get_transaction_receipt(tx.hash).await {
                    Ok(Some(receipt)) => {
                        if !receipt.status() {
                            return Err(ChainError::Reverted {
                                tx_hash: tx.hash.to_string(),
                            });
                        }
                        return Ok(Confirmation {
                            hash: tx.hash,
                            block_number: receipt.block_number,
                        });
                    }
                    Ok(None) => debug!(tx_hash = %tx.hash, "Receipt not available yet"),
                    // Transient RPC failures are retried until the caller's timeout.
                    Err(e) => warn!(tx_hash = %tx.hash, error = %e, "Receipt poll failed"),
                }
                tokio::time::sleep(self.receipt_poll_interval).await;
            }
        })
    }
}
