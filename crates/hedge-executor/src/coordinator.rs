//! Chain-then-venue execution of one decision.

use hedge_chain::{to_base_units, Confirmation, DynChainClient, Rounding, SwapRoute};
use hedge_core::{OrderAck, OrderRequest};
use hedge_pricing::HedgeDecision;
use hedge_telemetry::Metrics;
use hedge_venue::{DynVenueClient, VenueError};
use tracing::{error, info, warn};

use crate::config::ExecutionConfig;
use crate::error::{ExecutorError, ExecutorResult};
use crate::state::{ExecutionState, ExecutionTracker};

/// Outcome of one execution.
///
/// `chain_tx` is set whenever the swap confirmed, including when the hedge
/// leg failed afterwards.
#[derive(Debug)]
pub struct ExecutionReport {
    pub state: ExecutionState,
    pub history: Vec<ExecutionState>,
    pub chain_tx: Option<Confirmation>,
    pub order_ack: Option<OrderAck>,
    pub error: Option<ExecutorError>,
}

impl ExecutionReport {
    /// Swap confirmed but the hedge order did not go through.
    #[must_use]
    pub fn is_unhedged(&self) -> bool {
        self.state == ExecutionState::HedgeFailed && self.chain_tx.is_some()
    }
}

pub struct ExecutionCoordinator {
    chain: DynChainClient,
    route: SwapRoute,
    config: ExecutionConfig,
}

impl ExecutionCoordinator {
    pub fn new(chain: DynChainClient, route: SwapRoute, config: ExecutionConfig) -> Self {
        Self {
            chain,
            route,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Run both phases for `decision`.
    ///
    /// `venue` is the client for the decision's venue, if still connected.
    /// Nothing is retried or rolled back.
    pub async fn execute(
        &self,
        decision: &HedgeDecision,
        venue: Option<DynVenueClient>,
    ) -> ExecutionReport {
        let mut tracker = ExecutionTracker::new();
        let mut report_error = None;
        let mut chain_tx = None;
        let mut order_ack = None;

        match self.run(decision, venue, &mut tracker, &mut chain_tx, &mut order_ack).await {
            Ok(()) => {}
            Err(e) => {
                let failed = match tracker.state() {
                    ExecutionState::AwaitingChainConfirmation => Some(ExecutionState::ChainFailed),
                    ExecutionState::AwaitingHedgeAck => Some(ExecutionState::HedgeFailed),
                    _ => None,
                };
                if let Some(failed) = failed {
                    if let Err(transition) = tracker.transition(failed) {
                        error!(error = %transition, "Could not record failure state");
                    }
                }
                report_error = Some(e);
            }
        }

        ExecutionReport {
            state: tracker.state(),
            history: tracker.into_history(),
            chain_tx,
            order_ack,
            error: report_error,
        }
    }

    async fn run(
        &self,
        decision: &HedgeDecision,
        venue: Option<DynVenueClient>,
        tracker: &mut ExecutionTracker,
        chain_tx: &mut Option<Confirmation>,
        order_ack: &mut Option<OrderAck>,
    ) -> ExecutorResult<()> {
        tracker.transition(ExecutionState::AwaitingChainConfirmation)?;
        if !decision.is_feasible() {
            return Err(ExecutorError::InfeasibleDecision(decision.venue().clone()));
        }
        let confirmation = self.chain_leg(decision).await;
        Metrics::chain_tx(confirmation.is_ok());
        let confirmation = confirmation.map_err(ExecutorError::ChainTransaction)?;
        *chain_tx = Some(confirmation);
        tracker.transition(ExecutionState::ChainConfirmed)?;

        tracker.transition(ExecutionState::AwaitingHedgeAck)?;
        let ack = self.hedge_leg(decision, venue).await;
        if let Err(e) = &ack {
            warn!(
                venue = %decision.venue(),
                tx_hash = %confirmation.hash,
                error = %e,
                "Hedge leg failed after confirmed swap, position is unhedged"
            );
        }
        *order_ack = Some(ack?);
        tracker.transition(ExecutionState::HedgeComplete)?;
        Ok(())
    }

    /// Phase A: submit the swap and wait for its receipt.
    async fn chain_leg(&self, decision: &HedgeDecision) -> hedge_chain::ChainResult<Confirmation> {
        let amount_out = to_base_units(
            decision.amount().inner(),
            self.route.token_out_decimals,
            Rounding::Down,
        )?;
        let max_cost = to_base_units(
            decision.adjusted_cost(),
            self.route.token_in_decimals,
            Rounding::Up,
        )?;

        let tx = self
            .chain
            .swap_for_exact_tokens(amount_out, self.route.token_in, self.route.token_out, max_cost)
            .await?;
        info!(tx_hash = %tx.hash, %amount_out, %max_cost, "Awaiting swap confirmation");

        let confirmation = tokio::time::timeout(
            self.config.confirmation_timeout(),
            self.chain.wait_for_confirmation(tx),
        )
        .await
        .map_err(|_| hedge_chain::ChainError::ConfirmationTimeout {
            tx_hash: tx.hash.to_string(),
        })??;

        info!(
            tx_hash = %confirmation.hash,
            block = ?confirmation.block_number,
            "Swap confirmed"
        );
        Ok(confirmation)
    }

    /// Phase B: place the GTC limit order on the selected venue.
    async fn hedge_leg(
        &self,
        decision: &HedgeDecision,
        venue: Option<DynVenueClient>,
    ) -> ExecutorResult<OrderAck> {
        let venue_id = decision.venue().clone();
        let client = venue.ok_or_else(|| ExecutorError::UnknownVenue(venue_id.clone()))?;
        let price = decision
            .limit_price()
            .ok_or_else(|| ExecutorError::MissingLimitPrice(venue_id.clone()))?;

        let request = OrderRequest::limit_gtc(
            decision.symbol(),
            decision.order_side(),
            decision.amount(),
            price,
        )?;
        info!(
            venue = %venue_id,
            symbol = %request.symbol,
            side = %request.side,
            amount = %request.amount,
            price = %request.price,
            client_order_id = %request.client_order_id,
            "Placing hedge order"
        );

        let result = tokio::time::timeout(self.config.order_timeout(), client.create_order(request))
            .await
            .unwrap_or(Err(VenueError::Timeout));
        Metrics::hedge_order(venue_id.as_str(), result.is_ok());

        let ack = result.map_err(|source| ExecutorError::HedgeOrder {
            venue: venue_id.clone(),
            source,
        })?;
        info!(venue = %venue_id, order_id = %ack.order_id, status = %ack.status, "Hedge order accepted");
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hedge_chain::{Address, ConfirmBehavior, MockChainClient, U256};
    use hedge_core::{HedgeDirection, OrderSide, Price, Size, VenueId};
    use hedge_pricing::{CostedQuote, INFEASIBLE_COST};
    use hedge_venue::{perp_market, MockCall, MockVenueClient};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;

    fn route() -> SwapRoute {
        SwapRoute {
            token_in: Address::repeat_byte(0x11),
            token_out: Address::repeat_byte(0x22),
            token_in_decimals: 18,
            token_out_decimals: 6,
        }
    }

    fn decision(venue: &str, cost: Decimal, limit: Option<Decimal>) -> HedgeDecision {
        let quote = CostedQuote {
            venue: VenueId::new(venue),
            symbol: "ETHUSDT".to_string(),
            base_cost: cost,
            adjusted_cost: cost,
            limit_price: limit.map(Price::new),
            filled: Size::new(dec!(2)),
            feasible: cost != INFEASIBLE_COST,
            taker_fee: None,
            funding_rate: None,
            warnings: Vec::new(),
        };
        HedgeDecision::from_quote(&quote, Size::new(dec!(2)), HedgeDirection::Short, dec!(2))
    }

    fn venue() -> Arc<MockVenueClient> {
        Arc::new(
            MockVenueClient::new("binanceusdm")
                .with_market(perp_market("ETHUSDT", "ETH", "USDT", Some(dec!(0.0005)))),
        )
    }

    fn coordinator(chain: &Arc<MockChainClient>) -> ExecutionCoordinator {
        let chain: DynChainClient = chain.clone();
        ExecutionCoordinator::new(
            chain,
            route(),
            ExecutionConfig {
                confirmation_timeout_ms: 1000,
                order_timeout_ms: 500,
            },
        )
    }

    fn dyn_venue(venue: &Arc<MockVenueClient>) -> Option<DynVenueClient> {
        let client: DynVenueClient = venue.clone();
        Some(client)
    }

    #[tokio::test]
    async fn test_both_legs_complete() {
        let chain = Arc::new(MockChainClient::new());
        let venue = venue();
        let report = coordinator(&chain)
            .execute(&decision("binanceusdm", dec!(201.5), Some(dec!(101))), dyn_venue(&venue))
            .await;

        assert_eq!(report.state, ExecutionState::HedgeComplete);
        assert_eq!(
            report.history,
            vec![
                ExecutionState::Idle,
                ExecutionState::AwaitingChainConfirmation,
                ExecutionState::ChainConfirmed,
                ExecutionState::AwaitingHedgeAck,
                ExecutionState::HedgeComplete,
            ]
        );
        assert!(report.chain_tx.is_some());
        assert!(report.order_ack.is_some());
        assert!(report.error.is_none());

        let swap = chain.submissions()[0];
        assert_eq!(swap.amount_out, U256::from(2_000_000u64));
        assert_eq!(swap.max_cost, U256::from(201_500_000_000_000_000_000u128));
        assert_eq!(swap.token_in, route().token_in);

        let orders = venue.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, OrderSide::Sell);
        assert_eq!(orders[0].price, Price::new(dec!(101)));
        assert_eq!(orders[0].amount, Size::new(dec!(2)));
        assert_eq!(orders[0].time_in_force.to_string(), "GTC");
    }

    #[tokio::test]
    async fn test_chain_failure_never_calls_venue() {
        let chain = Arc::new(MockChainClient::new());
        chain.set_fail_submission(Some("insufficient funds"));
        let venue = venue();
        let report = coordinator(&chain)
            .execute(&decision("binanceusdm", dec!(200), Some(dec!(100))), dyn_venue(&venue))
            .await;

        assert_eq!(report.state, ExecutionState::ChainFailed);
        assert!(matches!(report.error, Some(ExecutorError::ChainTransaction(_))));
        assert!(report.chain_tx.is_none());
        assert!(venue.calls().is_empty());
    }

    #[tokio::test]
    async fn test_revert_is_chain_failed() {
        let chain = Arc::new(MockChainClient::new());
        chain.set_confirm_behavior(ConfirmBehavior::Revert);
        let venue = venue();
        let report = coordinator(&chain)
            .execute(&decision("binanceusdm", dec!(200), Some(dec!(100))), dyn_venue(&venue))
            .await;

        assert_eq!(report.state, ExecutionState::ChainFailed);
        assert!(matches!(
            report.error,
            Some(ExecutorError::ChainTransaction(hedge_chain::ChainError::Reverted { .. }))
        ));
        assert_eq!(venue.order_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_timeout_is_chain_failed() {
        let chain = Arc::new(MockChainClient::new());
        chain.set_confirm_behavior(ConfirmBehavior::Hang);
        let venue = venue();
        let report = coordinator(&chain)
            .execute(&decision("binanceusdm", dec!(200), Some(dec!(100))), dyn_venue(&venue))
            .await;

        assert_eq!(report.state, ExecutionState::ChainFailed);
        assert!(matches!(
            report.error,
            Some(ExecutorError::ChainTransaction(
                hedge_chain::ChainError::ConfirmationTimeout { .. }
            ))
        ));
        assert_eq!(chain.submission_count(), 1);
        assert_eq!(venue.order_count(), 0);
    }

    #[tokio::test]
    async fn test_infeasible_decision_fails_before_submission() {
        let chain = Arc::new(MockChainClient::new());
        let venue = venue();
        let report = coordinator(&chain)
            .execute(&decision("binanceusdm", INFEASIBLE_COST, None), dyn_venue(&venue))
            .await;

        assert_eq!(report.state, ExecutionState::ChainFailed);
        assert!(matches!(
            report.error,
            Some(ExecutorError::InfeasibleDecision(_))
        ));
        assert_eq!(chain.submission_count(), 0);
        assert!(venue.orders().is_empty());
    }

    #[tokio::test]
    async fn test_infeasible_decision_not_submitted_with_whole_unit_token() {
        let chain = Arc::new(MockChainClient::new());
        let dyn_chain: DynChainClient = chain.clone();
        let whole_units = SwapRoute {
            token_in_decimals: 0,
            ..route()
        };
        let coordinator = ExecutionCoordinator::new(
            dyn_chain,
            whole_units,
            ExecutionConfig {
                confirmation_timeout_ms: 1000,
                order_timeout_ms: 500,
            },
        );

        let report = coordinator
            .execute(&decision("binanceusdm", INFEASIBLE_COST, None), None)
            .await;

        assert_eq!(report.state, ExecutionState::ChainFailed);
        assert_eq!(chain.submission_count(), 0);
        assert!(report.chain_tx.is_none());
    }

    #[tokio::test]
    async fn test_rejected_order_keeps_chain_tx() {
        let chain = Arc::new(MockChainClient::new());
        let venue = venue();
        venue.set_reject_orders(Some("insufficient margin"));
        let report = coordinator(&chain)
            .execute(&decision("binanceusdm", dec!(200), Some(dec!(100))), dyn_venue(&venue))
            .await;

        assert_eq!(report.state, ExecutionState::HedgeFailed);
        assert!(report.is_unhedged());
        assert!(report.chain_tx.is_some());
        assert!(matches!(report.error, Some(ExecutorError::HedgeOrder { .. })));
        // One attempt, no retry; one swap, no reversal.
        let order_calls = venue
            .calls()
            .into_iter()
            .filter(|call| matches!(call, MockCall::CreateOrder(_)))
            .count();
        assert_eq!(order_calls, 1);
        assert_eq!(chain.submission_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_venue_is_hedge_failed() {
        let chain = Arc::new(MockChainClient::new());
        let report = coordinator(&chain)
            .execute(&decision("gone", dec!(200), Some(dec!(100))), None)
            .await;

        assert_eq!(report.state, ExecutionState::HedgeFailed);
        assert!(matches!(report.error, Some(ExecutorError::UnknownVenue(_))));
        assert!(report.chain_tx.is_some());
    }

    #[tokio::test]
    async fn test_non_positive_limit_price_is_hedge_failed() {
        let chain = Arc::new(MockChainClient::new());
        let venue = venue();
        let report = coordinator(&chain)
            .execute(&decision("binanceusdm", dec!(200), Some(dec!(0))), dyn_venue(&venue))
            .await;

        assert_eq!(report.state, ExecutionState::HedgeFailed);
        assert!(matches!(report.error, Some(ExecutorError::InvalidOrder(_))));
        assert!(report.is_unhedged());
        assert_eq!(venue.order_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_timeout_is_hedge_failed() {
        let chain = Arc::new(MockChainClient::new());
        let venue = venue();
        venue.set_latency(Duration::from_secs(5));
        let report = coordinator(&chain)
            .execute(&decision("binanceusdm", dec!(200), Some(dec!(100))), dyn_venue(&venue))
            .await;

        assert_eq!(report.state, ExecutionState::HedgeFailed);
        assert!(matches!(
            report.error,
            Some(ExecutorError::HedgeOrder {
                source: VenueError::Timeout,
                ..
            })
        ));
    }
}
