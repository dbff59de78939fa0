//! Leveraged futures order client - Entry Point
//!
//! Checks clock sync against the exchange, then sizes and submits one market
//! order per configured market.

use anyhow::{bail, Result};
use clap::Parser;
use lev_bot::{AppConfig, AppError, Application, ConfigSource};
use lev_core::Credentials;
use tracing::{info, warn};

const API_KEY_ENV: &str = "BINANCE_DEMO_API_KEY";
const API_SECRET_ENV: &str = "BINANCE_DEMO_SECRET";

/// Risk-sized leveraged futures order client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via LEV_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

fn credentials_from_env() -> Result<Credentials, AppError> {
    let read = |name: &str| {
        std::env::var(name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::Config(format!("{name} is not set")))
    };
    Ok(Credentials::new(read(API_KEY_ENV)?, read(API_SECRET_ENV)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging level comes from config, so load it first.
    let (config, source) = AppConfig::load(args.config.as_deref())?;
    lev_telemetry::init_logging(config.telemetry.log_level.as_deref())?;

    info!("Starting lev-bot v{}", env!("CARGO_PKG_VERSION"));
    match &source {
        ConfigSource::File(path) => info!(config_path = %path, "Loaded configuration file"),
        ConfigSource::Defaults { missing_path } => {
            warn!(path = %missing_path, "Config file not found, using defaults")
        }
    }
    info!(
        base_url = %config.base_url,
        markets = ?config.markets.iter().map(|m| &m.symbol).collect::<Vec<_>>(),
        leverage_failure = ?config.leverage_failure,
        "Configuration loaded"
    );

    let credentials = credentials_from_env()?;
    info!(?credentials, "Credentials loaded");

    let summary = Application::new(config, credentials)?.run().await?;

    if !summary.all_succeeded() {
        bail!(
            "{} of {} workflows failed",
            summary.failed(),
            summary.reports.len()
        );
    }
    Ok(())
}
