//! Scripted gateway for testing.
//!
//! Every call is recorded in order. Results default to a healthy account
//! (1000 USDT, BTC at 100,000) and can be overridden per operation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use lev_core::{AccountBalance, OrderAck, OrderRequest, Price, PriceQuote, Symbol, SymbolRules};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::error::GatewayResult;
use crate::gateway::{BoxFuture, ExchangeGateway};

/// A recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ServerTime,
    AccountBalances,
    Price(Symbol),
    SetLeverage(Symbol, u32),
    PlaceOrder(OrderRequest),
    SymbolRules(Symbol),
}

impl GatewayCall {
    /// Short operation name, independent of arguments.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ServerTime => "server_time",
            Self::AccountBalances => "account_balances",
            Self::Price(_) => "price",
            Self::SetLeverage(..) => "set_leverage",
            Self::PlaceOrder(_) => "place_order",
            Self::SymbolRules(_) => "symbol_rules",
        }
    }
}

#[derive(Debug)]
struct Script {
    server_time: Option<GatewayResult<DateTime<Utc>>>,
    balances: GatewayResult<Vec<AccountBalance>>,
    price: GatewayResult<Price>,
    leverage: Option<GatewayResult<u32>>,
    order: GatewayResult<OrderAck>,
    rules: GatewayResult<SymbolRules>,
    delay: Option<(&'static str, Duration)>,
}

/// Mock exchange gateway for testing.
#[derive(Debug)]
pub struct MockGateway {
    calls: Mutex<Vec<GatewayCall>>,
    script: Mutex<Script>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Create a mock with a 1000 USDT balance and a 100,000 price.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(Script {
                server_time: None,
                balances: Ok(vec![AccountBalance::new("USDT", Decimal::from(1000))]),
                price: Ok(Price::new(Decimal::from(100_000))),
                leverage: None,
                order: Ok(OrderAck {
                    order_id: 1,
                    client_order_id: None,
                    status: Some("NEW".to_string()),
                }),
                rules: Ok(SymbolRules::FALLBACK),
                delay: None,
            }),
        }
    }

    /// Fix the server time. Without this, `Utc::now()` is returned.
    pub fn set_server_time(&self, result: GatewayResult<DateTime<Utc>>) {
        self.script.lock().server_time = Some(result);
    }

    pub fn set_balances(&self, result: GatewayResult<Vec<AccountBalance>>) {
        self.script.lock().balances = result;
    }

    pub fn set_price(&self, result: GatewayResult<Price>) {
        self.script.lock().price = result;
    }

    /// Override the leverage result. Without this, the requested leverage is echoed.
    pub fn set_leverage_result(&self, result: GatewayResult<u32>) {
        self.script.lock().leverage = Some(result);
    }

    pub fn set_order_result(&self, result: GatewayResult<OrderAck>) {
        self.script.lock().order = result;
    }

    pub fn set_rules(&self, result: GatewayResult<SymbolRules>) {
        self.script.lock().rules = result;
    }

    /// Delay the operation named `op` (see [`GatewayCall::name`]) by `delay`.
    pub fn set_delay(&self, op: &'static str, delay: Duration) {
        self.script.lock().delay = Some((op, delay));
    }

    /// Get recorded calls.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    /// Recorded operation names, in call order.
    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls.lock().iter().map(GatewayCall::name).collect()
    }

    /// Orders submitted so far.
    pub fn submitted_orders(&self) -> Vec<OrderRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GatewayCall::PlaceOrder(o) => Some(o.clone()),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: GatewayCall) {
        let op = call.name();
        self.calls.lock().push(call);
        let delay = self
            .script
            .lock()
            .delay
            .filter(|(name, _)| *name == op)
            .map(|(_, d)| d);
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }
}

impl ExchangeGateway for MockGateway {
    fn server_time(&self) -> BoxFuture<'_, GatewayResult<DateTime<Utc>>> {
        Box::pin(async move {
            self.record(GatewayCall::ServerTime).await;
            self.script
                .lock()
                .server_time
                .clone()
                .unwrap_or_else(|| Ok(Utc::now()))
        })
    }

    fn account_balances(&self) -> BoxFuture<'_, GatewayResult<Vec<AccountBalance>>> {
        Box::pin(async move {
            self.record(GatewayCall::AccountBalances).await;
            self.script.lock().balances.clone()
        })
    }

    fn price<'a>(&'a self, symbol: &'a Symbol) -> BoxFuture<'a, GatewayResult<PriceQuote>> {
        Box::pin(async move {
            self.record(GatewayCall::Price(symbol.clone())).await;
            let price = self.script.lock().price.clone()?;
            Ok(PriceQuote {
                symbol: symbol.clone(),
                price,
                as_of: Utc::now(),
            })
        })
    }

    fn set_leverage<'a>(
        &'a self,
        symbol: &'a Symbol,
        leverage: u32,
    ) -> BoxFuture<'a, GatewayResult<u32>> {
        Box::pin(async move {
            self.record(GatewayCall::SetLeverage(symbol.clone(), leverage))
                .await;
            self.script.lock().leverage.clone().unwrap_or(Ok(leverage))
        })
    }

    fn place_order(&self, order: OrderRequest) -> BoxFuture<'_, GatewayResult<OrderAck>> {
        Box::pin(async move {
            let client_id = order.client_order_id.to_string();
            self.record(GatewayCall::PlaceOrder(order)).await;
            self.script.lock().order.clone().map(|mut ack| {
                ack.client_order_id.get_or_insert(client_id);
                ack
            })
        })
    }

    fn symbol_rules<'a>(&'a self, symbol: &'a Symbol) -> BoxFuture<'a, GatewayResult<SymbolRules>> {
        Box::pin(async move {
            self.record(GatewayCall::SymbolRules(symbol.clone())).await;
            self.script.lock().rules.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use lev_core::{OrderSide, Size};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_records_calls_in_order() {
        let gateway = MockGateway::new();
        let symbol = Symbol::new("BTCUSDT");

        gateway.set_leverage(&symbol, 10).await.unwrap();
        gateway.account_balances().await.unwrap();
        gateway.price(&symbol).await.unwrap();

        assert_eq!(
            gateway.call_names(),
            vec!["set_leverage", "account_balances", "price"]
        );
    }

    #[tokio::test]
    async fn test_mock_returns_configured_failure() {
        let gateway = MockGateway::new();
        gateway.set_price(Err(GatewayError::Unreachable("down".to_string())));

        let result = gateway.price(&Symbol::new("BTCUSDT")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_echoes_client_order_id() {
        let gateway = MockGateway::new();
        let order = OrderRequest::market(
            Symbol::new("BTCUSDT"),
            OrderSide::Buy,
            Size::new(dec!(0.01)),
        );
        let expected = order.client_order_id.to_string();

        let ack = gateway.place_order(order).await.unwrap();
        assert_eq!(ack.client_order_id, Some(expected));
        assert_eq!(gateway.submitted_orders().len(), 1);
    }
}
