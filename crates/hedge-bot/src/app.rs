//! Application loop.

use std::sync::Arc;
use std::time::Instant;

use hedge_chain::{from_base_units, ChainWatcher, DynChainClient, RouterClient, StateChange};
use hedge_executor::ExecutionCoordinator;
use hedge_feed::MarketDataAggregator;
use hedge_pricing::{HedgePlanner, PricingError};
use hedge_telemetry::Metrics;
use hedge_venue::{build_venue, DynVenueClient};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::cycle::{CycleOutcome, CycleReport};
use crate::error::{AppError, AppResult};

/// Main application.
pub struct Application {
    config: AppConfig,
    aggregator: MarketDataAggregator,
    planner: HedgePlanner,
    watcher: Option<ChainWatcher>,
    executor: Option<ExecutionCoordinator>,
}

impl Application {
    /// Assemble from already-built collaborators.
    ///
    /// Without a chain client there is no watcher and no executor; only
    /// [`Application::run_cycle`] is usable then.
    pub fn new(
        config: AppConfig,
        venues: Vec<DynVenueClient>,
        chain: Option<DynChainClient>,
    ) -> AppResult<Self> {
        config.validate()?;

        let (watcher, executor) = match chain {
            Some(chain) => {
                let route = config.chain.route()?;
                let watcher = ChainWatcher::from_config(chain.clone(), &config.chain, &route);
                let executor = (!config.is_observation_mode()).then(|| {
                    ExecutionCoordinator::new(chain, route, config.execution.clone())
                });
                (Some(watcher), executor)
            }
            None if !config.is_observation_mode() => {
                return Err(AppError::Config(
                    "trading mode requires a chain client".to_string(),
                ));
            }
            None => (None, None),
        };

        let aggregator =
            MarketDataAggregator::new(venues, config.filter.clone(), config.feed.clone());
        let planner = HedgePlanner::new(config.pricing.clone());

        Ok(Self {
            config,
            aggregator,
            planner,
            watcher,
            executor,
        })
    }

    /// Build venues and, if `with_chain`, the router client from config.
    pub fn from_config(config: AppConfig, with_chain: bool) -> AppResult<Self> {
        let venues = config
            .venues
            .iter()
            .map(build_venue)
            .collect::<Result<Vec<_>, _>>()?;

        let chain = if with_chain {
            config.chain.validate()?;
            let client: DynChainClient = Arc::new(RouterClient::from_config(&config.chain)?);
            Some(client)
        } else {
            None
        };

        Self::new(config, venues, chain)
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Observe until ctrl-c, running one cycle per state change.
    ///
    /// The watcher is not polled while a cycle runs; changes in the meantime
    /// collapse into the next observation.
    pub async fn run(mut self) -> AppResult<()> {
        if self.watcher.is_none() {
            return Err(AppError::Config("no chain watcher configured".to_string()));
        }
        info!(
            mode = ?self.config.mode,
            venues = self.aggregator.venue_count(),
            "Starting application"
        );

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        let mut cycle_count: u64 = 0;

        loop {
            let change = {
                let Some(watcher) = self.watcher.as_mut() else {
                    break;
                };
                tokio::select! {
                    change = watcher.next_change() => change,
                    _ = &mut shutdown => {
                        info!("Shutdown signal received");
                        break;
                    }
                }
            };

            cycle_count += 1;
            let report = self.handle_change(change).await;
            info!(cycle = cycle_count, outcome = %report.outcome, "Cycle done");
        }

        match self.metrics_summary() {
            Ok(metrics) => info!(cycle_count, %metrics, "Shutting down"),
            Err(e) => warn!(cycle_count, error = %e, "Shutting down, metrics unavailable"),
        }
        Ok(())
    }

    /// Everything recorded so far, in the Prometheus text format.
    pub fn metrics_summary(&self) -> AppResult<String> {
        Ok(Metrics::render()?)
    }

    /// Poll the watcher once and run a cycle if the state changed.
    pub async fn step(&mut self) -> CycleReport {
        let Some(watcher) = self.watcher.as_mut() else {
            return CycleReport::no_trigger();
        };
        let polled = watcher.poll().await;
        match polled {
            Ok(Some(change)) => self.handle_change(change).await,
            Ok(None) => CycleReport::no_trigger(),
            Err(e) => {
                warn!(error = %e, "Chain poll failed");
                CycleReport::no_trigger()
            }
        }
    }

    async fn handle_change(&self, change: StateChange) -> CycleReport {
        Metrics::trigger();
        match from_base_units(change.current, self.config.chain.token_out_decimals) {
            Ok(value) => info!(block = change.block, %value, "Cycle triggered"),
            Err(e) => info!(
                block = change.block,
                current = %change.current,
                reason = %e,
                "Cycle triggered"
            ),
        }
        if change.skipped_blocks > 0 {
            info!(
                skipped_blocks = change.skipped_blocks,
                "Blocks passed since last observation were coalesced"
            );
            Metrics::triggers_coalesced(change.skipped_blocks);
        }
        self.run_cycle(Some(change)).await
    }

    /// One full cycle: aggregate, plan and (in trading mode) execute.
    ///
    /// Never fails; every outcome is reported.
    pub async fn run_cycle(&self, trigger: Option<StateChange>) -> CycleReport {
        let started = Instant::now();
        let target = self.planner.config().target();

        let aggregation = self.aggregator.aggregate(target).await;

        let mut report = CycleReport {
            outcome: CycleOutcome::NoViableVenue,
            trigger,
            decision: None,
            quotes: Vec::new(),
            warnings: aggregation.warnings,
            execution: None,
            duration: started.elapsed(),
        };

        let plan = match self.planner.plan(&aggregation.snapshots) {
            Ok(plan) => plan,
            Err(PricingError::NoViableVenue) => {
                warn!(
                    snapshots = aggregation.snapshots.len(),
                    "No viable venue, skipping cycle"
                );
                return self.finish(report, started);
            }
            Err(e) => {
                error!(error = %e, "Planning failed");
                return self.finish(report, started);
            }
        };
        Metrics::venue_selected(plan.decision.venue().as_str());
        report.quotes = plan.quotes;

        match &self.executor {
            None => {
                info!(
                    venue = %plan.decision.venue(),
                    symbol = %plan.decision.symbol(),
                    adjusted_cost = %plan.decision.adjusted_cost(),
                    "Observation mode, decision not executed"
                );
                report.outcome = CycleOutcome::Observed;
            }
            Some(executor) => {
                let venue = self.aggregator.venue(plan.decision.venue());
                let execution = executor.execute(&plan.decision, venue).await;
                report.outcome = CycleOutcome::from_execution(execution.state);
                if let Some(e) = &execution.error {
                    warn!(state = %execution.state, error = %e, "Execution did not complete");
                }
                report.execution = Some(execution);
            }
        }
        report.decision = Some(plan.decision);

        self.finish(report, started)
    }

    fn finish(&self, mut report: CycleReport, started: Instant) -> CycleReport {
        report.duration = started.elapsed();
        Metrics::cycle_finished(
            report.outcome.as_str(),
            report.duration.as_secs_f64() * 1000.0,
        );
        report
    }
}
