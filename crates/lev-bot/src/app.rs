//! Main application orchestration.
//!
//! Coordinates:
//! - Clock-sync probe (advisory, never blocks trading)
//! - Symbol rules registry seeded from configuration
//! - One order workflow per market, run concurrently on a shared gateway
//! - Ctrl-C cancellation between workflow steps

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use lev_core::{Credentials, Symbol};
use lev_executor::{
    ClockSync, ConnectivityProber, FuturesOrderExecutor, RunPlan, WorkflowReport,
};
use lev_gateway::{BinanceFuturesGateway, DynGateway};
use lev_registry::SymbolRulesRegistry;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Outcome of one application run.
#[derive(Debug)]
pub struct RunSummary {
    pub clock: ClockSync,
    /// One report per configured market, in configuration order.
    pub reports: Vec<WorkflowReport>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Log one line per market and a total.
    pub fn log(&self) {
        for report in &self.reports {
            match &report.outcome {
                Ok(ack) => info!(
                    symbol = %report.symbol(),
                    order_id = ack.order_id,
                    quantity = %report.sizing.map(|s| s.quantity.to_string()).unwrap_or_default(),
                    leverage_applied = report.leverage_applied,
                    "Market succeeded"
                ),
                Err(e) => error!(
                    symbol = %report.symbol(),
                    kind = ?e.kind(),
                    final_state = ?report.final_state(),
                    error = %e,
                    "Market failed"
                ),
            }
        }
        info!(
            clock_in_sync = self.clock.is_ok(),
            offset_ms = ?self.clock.offset_ms(),
            succeeded = self.succeeded(),
            failed = self.failed(),
            "Run complete"
        );
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    gateway: DynGateway,
    registry: Arc<SymbolRulesRegistry>,
    cancel: CancellationToken,
}

impl Application {
    /// Create an application talking to the configured Binance endpoint.
    pub fn new(config: AppConfig, credentials: Credentials) -> AppResult<Self> {
        let gateway = BinanceFuturesGateway::new(
            config.base_url.clone(),
            credentials,
            Some(config.call_timeout()),
        )?
        .with_recv_window(config.recv_window_ms);

        info!(base_url = %config.base_url, "Gateway created");
        Self::with_gateway(config, Arc::new(gateway))
    }

    /// Create an application on an existing gateway.
    pub fn with_gateway(config: AppConfig, gateway: DynGateway) -> AppResult<Self> {
        config.validate()?;

        let registry = Arc::new(SymbolRulesRegistry::default());
        for market in &config.markets {
            if let Some(rules) = market.rules()? {
                registry.insert_configured(Symbol::new(&market.symbol), rules)?;
            }
        }

        Ok(Self {
            config,
            gateway,
            registry,
            cancel: CancellationToken::new(),
        })
    }

    /// Token cancelling all pending workflows.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn registry(&self) -> &Arc<SymbolRulesRegistry> {
        &self.registry
    }

    /// Run the clock-sync probe.
    pub async fn probe(&self) -> ClockSync {
        ConnectivityProber::new(self.gateway.clone())
            .with_tolerance_ms(self.config.sync_tolerance_ms)
            .with_timeout(self.config.call_timeout())
            .check_sync()
            .await
    }

    /// Run one workflow per configured market concurrently.
    pub async fn run_workflows(&self) -> AppResult<Vec<WorkflowReport>> {
        let plans = self
            .config
            .markets
            .iter()
            .map(|m| m.run_plan())
            .collect::<AppResult<Vec<RunPlan>>>()?;

        let executor = Arc::new(FuturesOrderExecutor::new(
            self.gateway.clone(),
            self.registry.clone(),
            self.config.executor_config(),
        ));

        let mut tasks = JoinSet::new();
        for (idx, plan) in plans.into_iter().enumerate() {
            let executor = executor.clone();
            let cancel = self.cancel.clone();
            tasks.spawn(async move { (idx, executor.execute(plan, &cancel).await) });
        }

        let mut reports = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let (idx, report) = joined.map_err(|e| AppError::Task(e.to_string()))?;
            reports.push((idx, report));
        }
        reports.sort_by_key(|(idx, _)| *idx);

        Ok(reports.into_iter().map(|(_, r)| r).collect())
    }

    /// Probe, then trade every configured market.
    ///
    /// Ctrl-C cancels workflows before their next step. In-flight calls
    /// are allowed to finish.
    pub async fn run(self) -> AppResult<RunSummary> {
        info!(markets = self.config.markets.len(), "Starting application");

        let clock = self.probe().await;
        if !clock.is_ok() {
            warn!(?clock, "Clock sync check did not pass, continuing");
        }

        let done = CancellationToken::new();
        let _done_guard = done.clone().drop_guard();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => info!("Shutdown signal received, cancelling workflows"),
                        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
                    }
                    cancel.cancel();
                }
                _ = done.cancelled() => {}
            }
        });

        let reports = self.run_workflows().await?;
        let summary = RunSummary { clock, reports };
        summary.log();
        Ok(summary)
    }
}
