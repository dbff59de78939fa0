//! Exchange gateway trait.
//!
//! One long-lived gateway instance is shared (behind an `Arc`) by the
//! connectivity prober and every executor run.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lev_core::{AccountBalance, OrderAck, OrderRequest, PriceQuote, Symbol, SymbolRules};

use crate::error::GatewayResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Authenticated exchange operations consumed by the core.
///
/// Every call resolves to success or a [`crate::GatewayError`] carrying a
/// human-readable reason. Implementations must be safe for concurrent use.
pub trait ExchangeGateway: Send + Sync {
    /// Current exchange server time.
    fn server_time(&self) -> BoxFuture<'_, GatewayResult<DateTime<Utc>>>;

    /// Futures wallet balances, one entry per asset.
    fn account_balances(&self) -> BoxFuture<'_, GatewayResult<Vec<AccountBalance>>>;

    /// Latest price for `symbol`.
    fn price<'a>(&'a self, symbol: &'a Symbol) -> BoxFuture<'a, GatewayResult<PriceQuote>>;

    /// Set initial leverage for `symbol`. Returns the leverage the exchange applied.
    fn set_leverage<'a>(
        &'a self,
        symbol: &'a Symbol,
        leverage: u32,
    ) -> BoxFuture<'a, GatewayResult<u32>>;

    /// Submit an order.
    fn place_order(&self, order: OrderRequest) -> BoxFuture<'_, GatewayResult<OrderAck>>;

    /// Quantity rules for `symbol` from exchange metadata.
    fn symbol_rules<'a>(&'a self, symbol: &'a Symbol) -> BoxFuture<'a, GatewayResult<SymbolRules>>;
}

/// Arc wrapper for ExchangeGateway trait objects.
pub type DynGateway = Arc<dyn ExchangeGateway>;
