//! Futures order workflow.
//!
//! # State Machine (Strict)
//!
//! ```text
//! Init → LeverageSet → BalanceFetched → PriceFetched → Sized → Submitted → Succeeded
//!                                                                     ↘ Failed (from any step)
//! ```
//!
//! The workflow stops at the first fatal failure. Nothing is rolled back: no
//! position exists before `Submitted`, and a submitted order is not monitored.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use lev_core::{
    AccountBalance, OrderAck, OrderRequest, OrderSide, PriceQuote, Symbol, SymbolRules,
};
use lev_gateway::{DynGateway, GatewayError, GatewayResult};
use lev_registry::{RulesSource, SymbolRulesRegistry};
use lev_risk::{size, SizingRequest, SizingResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{ExecutorError, ExecutorResult, WorkflowError};

/// Default timeout for each remote call.
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Configuration
// ============================================================================

/// What to do when the exchange refuses the leverage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeverageFailurePolicy {
    /// Log the failure and keep going (leverage may already be set).
    #[default]
    Continue,
    /// Abort the run with `LeverageRejected`.
    FailFast,
}

/// Executor configuration shared by every run.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Timeout applied to each remote call.
    pub call_timeout: Duration,
    /// Leverage-set failure handling.
    pub leverage_failure: LeverageFailurePolicy,
    /// Asset whose balance funds the margin (e.g., "USDT").
    pub quote_asset: String,
    /// Fetch symbol rules from exchange metadata when not configured.
    pub fetch_symbol_rules: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            leverage_failure: LeverageFailurePolicy::default(),
            quote_asset: "USDT".to_string(),
            fetch_symbol_rules: false,
        }
    }
}

/// Per-run parameters, captured once and never changed mid-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPlan {
    pub symbol: Symbol,
    pub side: OrderSide,
    /// Fraction of the available balance used as margin, in (0, 1].
    pub allocation: Decimal,
    /// Leverage multiplier, at least 1.
    pub leverage: u32,
}

impl RunPlan {
    /// Create a validated plan.
    pub fn new(
        symbol: Symbol,
        side: OrderSide,
        allocation: Decimal,
        leverage: u32,
    ) -> ExecutorResult<Self> {
        if allocation <= Decimal::ZERO || allocation > Decimal::ONE {
            return Err(ExecutorError::InvalidPlan(format!(
                "{symbol}: allocation must be in (0, 1], got {allocation}"
            )));
        }
        if leverage == 0 {
            return Err(ExecutorError::InvalidPlan(format!(
                "{symbol}: leverage must be at least 1"
            )));
        }
        Ok(Self {
            symbol,
            side,
            allocation,
            leverage,
        })
    }
}

// ============================================================================
// Report
// ============================================================================

/// Workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowState {
    Init,
    LeverageSet,
    BalanceFetched,
    PriceFetched,
    Sized,
    Submitted,
    Succeeded,
    Failed,
}

/// Everything observed during one run.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub plan: RunPlan,
    /// States entered, in order. Always starts with `Init` and ends with
    /// `Succeeded` or `Failed`.
    pub states: Vec<WorkflowState>,
    /// Whether the exchange acknowledged the leverage change.
    pub leverage_applied: bool,
    pub balance: Option<AccountBalance>,
    pub quote: Option<PriceQuote>,
    pub rules: Option<(SymbolRules, RulesSource)>,
    pub sizing: Option<SizingResult>,
    pub outcome: Result<OrderAck, WorkflowError>,
}

impl WorkflowReport {
    fn new(plan: RunPlan) -> Self {
        Self {
            plan,
            states: vec![WorkflowState::Init],
            leverage_applied: false,
            balance: None,
            quote: None,
            rules: None,
            sizing: None,
            // Replaced before the report is returned.
            outcome: Err(WorkflowError::Cancelled {
                before: WorkflowState::LeverageSet,
            }),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.plan.symbol
    }

    /// Terminal state of the run.
    pub fn final_state(&self) -> WorkflowState {
        self.states
            .last()
            .copied()
            .unwrap_or(WorkflowState::Init)
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    fn enter(&mut self, state: WorkflowState) {
        self.states.push(state);
    }

    fn fail(mut self, err: WorkflowError) -> Self {
        error!(symbol = %self.plan.symbol, kind = ?err.kind(), error = %err, "Workflow failed");
        if self.leverage_applied && !matches!(self.states.last(), Some(WorkflowState::Submitted)) {
            warn!(
                symbol = %self.plan.symbol,
                leverage = self.plan.leverage,
                "Leverage was changed but no order was placed"
            );
        }
        self.states.push(WorkflowState::Failed);
        self.outcome = Err(err);
        self
    }

    fn succeed(mut self, ack: OrderAck) -> Self {
        self.states.push(WorkflowState::Succeeded);
        self.outcome = Ok(ack);
        self
    }
}

// ============================================================================
// FuturesOrderExecutor
// ============================================================================

/// Runs the sizing-and-submit workflow against a shared gateway.
pub struct FuturesOrderExecutor {
    gateway: DynGateway,
    registry: Arc<SymbolRulesRegistry>,
    config: ExecutorConfig,
}

impl FuturesOrderExecutor {
    pub fn new(
        gateway: DynGateway,
        registry: Arc<SymbolRulesRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            gateway,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute one pass for `plan`.
    ///
    /// `cancel` is checked before each step. A cancelled run ends in
    /// `Failed` with `WorkflowError::Cancelled`.
    pub async fn execute(&self, plan: RunPlan, cancel: &CancellationToken) -> WorkflowReport {
        let symbol = plan.symbol.clone();
        let leverage = plan.leverage;
        let mut report = WorkflowReport::new(plan);

        info!(
            %symbol,
            side = %report.plan.side,
            allocation = %report.plan.allocation,
            leverage,
            "Starting futures order workflow"
        );

        // 1. Leverage
        if cancel.is_cancelled() {
            return report.fail(WorkflowError::Cancelled {
                before: WorkflowState::LeverageSet,
            });
        }
        match self.call(self.gateway.set_leverage(&symbol, leverage)).await {
            Ok(applied) => {
                report.leverage_applied = true;
                info!(%symbol, leverage = applied, "Leverage set");
            }
            Err(e) => match self.config.leverage_failure {
                LeverageFailurePolicy::Continue => {
                    error!(%symbol, leverage, reason = %e.reason(), "Leverage change failed, continuing");
                }
                LeverageFailurePolicy::FailFast => {
                    return report.fail(WorkflowError::LeverageRejected(e.reason()));
                }
            },
        }
        report.enter(WorkflowState::LeverageSet);

        // 2. Balance
        if cancel.is_cancelled() {
            return report.fail(WorkflowError::Cancelled {
                before: WorkflowState::BalanceFetched,
            });
        }
        let balances = match self.call(self.gateway.account_balances()).await {
            Ok(b) => b,
            Err(e) => return report.fail(WorkflowError::NoBalanceData(e.reason())),
        };
        let balance = match AccountBalance::select(&balances, &self.config.quote_asset) {
            Some(b) => b.clone(),
            None => {
                return report.fail(WorkflowError::NoBalanceData(format!(
                    "no {} balance in account",
                    self.config.quote_asset
                )))
            }
        };
        info!(%symbol, asset = %balance.asset, available = %balance.available, "Balance fetched");
        report.balance = Some(balance.clone());
        report.enter(WorkflowState::BalanceFetched);

        // 3. Price
        if cancel.is_cancelled() {
            return report.fail(WorkflowError::Cancelled {
                before: WorkflowState::PriceFetched,
            });
        }
        let quote = match self.call(self.gateway.price(&symbol)).await {
            Ok(q) => q,
            Err(e) => return report.fail(WorkflowError::PriceUnavailable(e.reason())),
        };
        info!(%symbol, price = %quote.price, "Price fetched");
        report.quote = Some(quote.clone());
        report.enter(WorkflowState::PriceFetched);

        // 4. Size
        if cancel.is_cancelled() {
            return report.fail(WorkflowError::Cancelled {
                before: WorkflowState::Sized,
            });
        }
        let (rules, source) = self.resolve_rules(&symbol).await;
        report.rules = Some((rules, source));

        let request = SizingRequest {
            available: balance.available,
            allocation: report.plan.allocation,
            leverage,
            price: quote.price,
            rules,
        };
        let sizing = match size(&request) {
            Ok(s) => s,
            Err(e) => return report.fail(e.into()),
        };
        if sizing.clamped {
            warn!(
                %symbol,
                raw_quantity = %sizing.raw_quantity,
                min_qty = %rules.min_quantity,
                effective_leverage = ?sizing.effective_leverage(),
                "Quantity clamped up to symbol minimum, exposure exceeds allocation"
            );
        }
        info!(
            %symbol,
            available = %balance.available,
            margin = %sizing.margin,
            notional = %sizing.notional,
            quantity = %sizing.quantity,
            clamped = sizing.clamped,
            "Order sized"
        );
        report.sizing = Some(sizing);
        report.enter(WorkflowState::Sized);

        // 5. Submit
        if cancel.is_cancelled() {
            return report.fail(WorkflowError::Cancelled {
                before: WorkflowState::Submitted,
            });
        }
        let order = OrderRequest::market(symbol.clone(), report.plan.side, sizing.quantity);
        let client_order_id = order.client_order_id.clone();
        report.enter(WorkflowState::Submitted);
        match self.call(self.gateway.place_order(order)).await {
            Ok(ack) => {
                info!(
                    %symbol,
                    order_id = ack.order_id,
                    %client_order_id,
                    quantity = %sizing.quantity,
                    "Order executed"
                );
                report.succeed(ack)
            }
            Err(e) => report.fail(WorkflowError::OrderRejected(e.reason())),
        }
    }

    /// Await a gateway call under the configured timeout.
    async fn call<T>(&self, fut: impl Future<Output = GatewayResult<T>>) -> GatewayResult<T> {
        match tokio::time::timeout(self.config.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.config.call_timeout)),
        }
    }

    async fn resolve_rules(&self, symbol: &Symbol) -> (SymbolRules, RulesSource) {
        let lookup = self.registry.resolve_or_fetch(
            self.gateway.as_ref(),
            symbol,
            self.config.fetch_symbol_rules,
        );
        match tokio::time::timeout(self.config.call_timeout, lookup).await {
            Ok(found) => found,
            Err(_) => {
                warn!(%symbol, "Symbol rules lookup timed out");
                self.registry.resolve(symbol)
            }
        }
    }
}
