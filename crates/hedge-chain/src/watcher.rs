//! Block-driven watcher for the monitored state value.
//!
//! The watcher is the only writer of the last observed value. It starts
//! empty, so the first successful read after process start is reported as a
//! change.

use std::time::Duration;

use alloy::primitives::{Address, U256};
use tracing::{debug, info, warn};

use crate::client::DynChainClient;
use crate::config::{ChainConfig, SwapRoute};
use crate::error::ChainResult;

/// A change of the monitored value between two observed blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub block: u64,
    pub previous: Option<U256>,
    pub current: U256,
    /// Blocks passed over since the previous observation.
    pub skipped_blocks: u64,
}

pub struct ChainWatcher {
    client: DynChainClient,
    token_in: Address,
    token_out: Address,
    probe_amount_in: U256,
    poll_interval: Duration,
    last_block: Option<u64>,
    last_observed: Option<U256>,
}

impl ChainWatcher {
    pub fn new(
        client: DynChainClient,
        token_in: Address,
        token_out: Address,
        probe_amount_in: U256,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            token_in,
            token_out,
            probe_amount_in,
            poll_interval,
            last_block: None,
            last_observed: None,
        }
    }

    pub fn from_config(client: DynChainClient, config: &ChainConfig, route: &SwapRoute) -> Self {
        Self::new(
            client,
            route.token_in,
            route.token_out,
            config.probe_amount(),
            config.poll_interval(),
        )
    }

    #[must_use]
    pub fn last_observed(&self) -> Option<U256> {
        self.last_observed
    }

    #[must_use]
    pub fn last_block(&self) -> Option<u64> {
        self.last_block
    }

    /// Check once for a new block and read the state on it.
    ///
    /// Returns `Ok(None)` when there is no new block or the value is
    /// unchanged. On a read error the block is not marked as seen, so the
    /// next poll retries it.
    pub async fn poll(&mut self) -> ChainResult<Option<StateChange>> {
        let block = self.client.block_number().await?;
        if self.last_block.is_some_and(|last| block <= last) {
            return Ok(None);
        }

        let current = self
            .client
            .get_amount_out(self.probe_amount_in, self.token_in, self.token_out)
            .await?;

        let skipped_blocks = self
            .last_block
            .map_or(0, |last| block.saturating_sub(last).saturating_sub(1));
        self.last_block = Some(block);

        if self.last_observed == Some(current) {
            debug!(block, %current, "State unchanged");
            return Ok(None);
        }

        let previous = self.last_observed.replace(current);
        info!(
            block,
            previous = ?previous.map(|v| v.to_string()),
            %current,
            skipped_blocks,
            "State change observed"
        );
        Ok(Some(StateChange {
            block,
            previous,
            current,
            skipped_blocks,
        }))
    }

    /// Poll until the state changes. Errors are logged and retried.
    pub async fn next_change(&mut self) -> StateChange {
        loop {
            match self.poll().await {
                Ok(Some(change)) => return change,
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Chain poll failed"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChainClient;
    use std::sync::Arc;

    fn watcher(mock: &Arc<MockChainClient>) -> ChainWatcher {
        let client: DynChainClient = mock.clone();
        ChainWatcher::new(
            client,
            Address::ZERO,
            Address::ZERO,
            U256::from(100_000u64),
            Duration::from_millis(500),
        )
    }

    #[tokio::test]
    async fn test_first_observation_is_a_change() {
        let mock = Arc::new(MockChainClient::new().with_state(U256::from(42u64)));
        mock.set_block(10);
        let mut watcher = watcher(&mock);

        let change = watcher.poll().await.unwrap().unwrap();
        assert_eq!(change.previous, None);
        assert_eq!(change.current, U256::from(42u64));
        assert_eq!(change.block, 10);
        assert_eq!(watcher.last_observed(), Some(U256::from(42u64)));
    }

    #[tokio::test]
    async fn test_same_block_not_reread() {
        let mock = Arc::new(MockChainClient::new().with_state(U256::from(1u64)));
        mock.set_block(5);
        let mut watcher = watcher(&mock);
        watcher.poll().await.unwrap();
        mock.set_state(U256::from(2u64));

        assert_eq!(watcher.poll().await.unwrap(), None);
        assert_eq!(mock.read_count(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_value_is_not_a_change() {
        let mock = Arc::new(MockChainClient::new().with_state(U256::from(1u64)));
        mock.set_block(5);
        let mut watcher = watcher(&mock);
        watcher.poll().await.unwrap();

        mock.advance(1);
        assert_eq!(watcher.poll().await.unwrap(), None);
        assert_eq!(watcher.last_block(), Some(6));
    }

    #[tokio::test]
    async fn test_intermediate_changes_coalesce() {
        let mock = Arc::new(MockChainClient::new().with_state(U256::from(1u64)));
        mock.set_block(5);
        let mut watcher = watcher(&mock);
        watcher.poll().await.unwrap();

        // Several blocks pass (and the value moves twice) while nobody polls.
        mock.set_state(U256::from(2u64));
        mock.set_state(U256::from(3u64));
        mock.advance(4);

        let change = watcher.poll().await.unwrap().unwrap();
        assert_eq!(change.previous, Some(U256::from(1u64)));
        assert_eq!(change.current, U256::from(3u64));
        assert_eq!(change.skipped_blocks, 3);
    }

    #[tokio::test]
    async fn test_read_error_retries_block() {
        let mock = Arc::new(MockChainClient::new().with_state(U256::from(1u64)));
        mock.set_block(5);
        mock.set_fail_reads(Some("execution reverted"));
        let mut watcher = watcher(&mock);

        assert!(watcher.poll().await.is_err());
        assert_eq!(watcher.last_block(), None);

        mock.set_fail_reads(None);
        let change = watcher.poll().await.unwrap().unwrap();
        assert_eq!(change.block, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_change_waits_for_new_block() {
        let mock = Arc::new(MockChainClient::new().with_state(U256::from(1u64)));
        mock.set_block(1);
        let mut watcher = watcher(&mock);
        watcher.next_change().await;

        let background = mock.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1200)).await;
            background.set_state(U256::from(9u64));
            background.advance(1);
        });

        let start = tokio::time::Instant::now();
        let change = watcher.next_change().await;
        assert_eq!(change.current, U256::from(9u64));
        assert!(start.elapsed() >= Duration::from_millis(1200));
    }
}
