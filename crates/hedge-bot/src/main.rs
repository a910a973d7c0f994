//! Hedge bot entry point.
//!
//! Observation mode: decisions are computed and logged only.
//! Trading mode: decisions are executed (swap, then hedge order).

use anyhow::Result;
use clap::Parser;
use hedge_bot::{AppConfig, Application, OperatingMode};
use tracing::{info, warn};

/// Chain-triggered multi-venue hedge bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via HEDGE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Force observation mode regardless of the config file
    #[arg(long)]
    observe: bool,

    /// Run a single aggregation and decision, then exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Endpoints and keys may come from .env
    let dotenv = dotenvy::dotenv().ok();

    // Determine config path: CLI arg > HEDGE_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("HEDGE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let loaded = AppConfig::load(&config_path)?;
    let config_found = loaded.is_some();
    let mut config = loaded.unwrap_or_default();
    config.apply_env_overrides();
    if args.observe || args.once {
        config.mode = OperatingMode::Observation;
    }

    hedge_telemetry::init_logging(&config.telemetry.log_level)?;
    info!("Starting hedge-bot v{}", env!("CARGO_PKG_VERSION"));
    if !config_found {
        warn!(path = %config_path, "Config file not found, using defaults");
    }
    info!(
        config_path = %config_path,
        dotenv = ?dotenv,
        mode = ?config.mode,
        venues = config.venues.len(),
        "Configuration loaded"
    );

    if args.once {
        let app = Application::from_config(config, false)?;
        let report = app.run_cycle(None).await;
        match &report.decision {
            Some(decision) => info!(
                outcome = %report.outcome,
                venue = %decision.venue(),
                symbol = %decision.symbol(),
                adjusted_cost = %decision.adjusted_cost(),
                feasible = decision.is_feasible(),
                quotes = report.quotes.len(),
                warnings = report.warnings.len(),
                "One-shot decision"
            ),
            None => info!(outcome = %report.outcome, warnings = report.warnings.len(), "One-shot decision"),
        }
        return Ok(());
    }

    let app = Application::from_config(config, true)?;
    app.run().await?;

    Ok(())
}
