//! End-to-end tests of the application against a scripted gateway.

use lev_bot::{AppConfig, Application, MarketConfig};
use lev_core::{AccountBalance, OrderSide, Price, Symbol};
use lev_executor::{LeverageFailurePolicy, WorkflowError, WorkflowState};
use lev_gateway::{GatewayCall, GatewayError, MockGateway};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn market(symbol: &str, side: OrderSide, allocation: rust_decimal::Decimal, leverage: u32) -> MarketConfig {
    MarketConfig {
        symbol: symbol.to_string(),
        side,
        allocation,
        leverage,
        min_qty: None,
        step_size: None,
    }
}

#[tokio::test]
async fn test_default_config_sizes_btc_order() {
    let gateway = Arc::new(MockGateway::new());
    let app = Application::with_gateway(AppConfig::default(), gateway.clone()).unwrap();

    let reports = app.run_workflows().await.unwrap();

    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_success());
    let orders = gateway.submitted_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].symbol, Symbol::new("BTCUSDT"));
    assert_eq!(orders[0].quantity.inner(), dec!(0.01));
}

#[tokio::test]
async fn test_run_probes_then_trades() {
    let gateway = Arc::new(MockGateway::new());
    let app = Application::with_gateway(AppConfig::default(), gateway.clone()).unwrap();

    let summary = app.run().await.unwrap();

    assert!(summary.all_succeeded());
    assert!(summary.clock.offset_ms().is_some());
    assert_eq!(
        gateway.call_names(),
        vec!["server_time", "set_leverage", "account_balances", "price", "place_order"]
    );
}

#[tokio::test]
async fn test_unreachable_probe_does_not_block_trading() {
    let gateway = Arc::new(MockGateway::new());
    gateway.set_server_time(Err(GatewayError::Unreachable("timeout".into())));
    let app = Application::with_gateway(AppConfig::default(), gateway.clone()).unwrap();

    let summary = app.run().await.unwrap();

    assert!(!summary.clock.is_ok());
    assert_eq!(summary.succeeded(), 1);
}

#[tokio::test]
async fn test_multiple_markets_share_gateway_and_keep_order() {
    let gateway = Arc::new(MockGateway::new());
    let config = AppConfig {
        markets: vec![
            market("BTCUSDT", OrderSide::Buy, dec!(0.10), 10),
            market("ETHUSDT", OrderSide::Sell, dec!(0.05), 3),
        ],
        ..Default::default()
    };
    let app = Application::with_gateway(config, gateway.clone()).unwrap();

    let reports = app.run_workflows().await.unwrap();

    assert_eq!(reports[0].symbol().as_str(), "BTCUSDT");
    assert_eq!(reports[1].symbol().as_str(), "ETHUSDT");
    assert!(reports.iter().all(|r| r.is_success()));

    let leverage_calls: Vec<_> = gateway
        .calls()
        .into_iter()
        .filter(|c| matches!(c, GatewayCall::SetLeverage(..)))
        .collect();
    assert_eq!(leverage_calls.len(), 2);
    assert!(leverage_calls.contains(&GatewayCall::SetLeverage(Symbol::new("ETHUSDT"), 3)));
}

#[tokio::test]
async fn test_configured_rules_applied_to_order() {
    let gateway = Arc::new(MockGateway::new());
    gateway.set_price(Ok(Price::new(dec!(3000))));
    let mut eth = market("ETHUSDT", OrderSide::Buy, dec!(0.10), 10);
    eth.min_qty = Some(dec!(0.01));
    eth.step_size = Some(dec!(0.01));
    let config = AppConfig {
        markets: vec![eth],
        fetch_symbol_rules: true,
        ..Default::default()
    };
    let app = Application::with_gateway(config, gateway.clone()).unwrap();

    let reports = app.run_workflows().await.unwrap();

    assert!(reports[0].is_success());
    assert_eq!(gateway.submitted_orders()[0].quantity.inner(), dec!(0.33));
    // Configured rules win, exchange metadata is never consulted.
    assert!(!gateway.call_names().contains(&"symbol_rules"));
}

#[tokio::test]
async fn test_fail_fast_leverage_stops_every_market() {
    let gateway = Arc::new(MockGateway::new());
    gateway.set_leverage_result(Err(GatewayError::Rejected {
        code: -4028,
        message: "Leverage 10 is not valid".into(),
    }));
    let config = AppConfig {
        leverage_failure: LeverageFailurePolicy::FailFast,
        ..Default::default()
    };
    let app = Application::with_gateway(config, gateway.clone()).unwrap();

    let reports = app.run_workflows().await.unwrap();

    assert!(matches!(reports[0].outcome, Err(WorkflowError::LeverageRejected(_))));
    assert!(gateway.submitted_orders().is_empty());
}

#[tokio::test]
async fn test_cancelled_app_places_no_orders() {
    let gateway = Arc::new(MockGateway::new());
    let app = Application::with_gateway(AppConfig::default(), gateway.clone()).unwrap();
    app.cancellation_token().cancel();

    let reports = app.run_workflows().await.unwrap();

    assert_eq!(reports[0].final_state(), WorkflowState::Failed);
    assert!(matches!(reports[0].outcome, Err(WorkflowError::Cancelled { .. })));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_empty_account_reports_failure_without_order() {
    let gateway = Arc::new(MockGateway::new());
    gateway.set_balances(Ok(vec![AccountBalance::new("USDT", dec!(0))]));
    let app = Application::with_gateway(AppConfig::default(), gateway.clone()).unwrap();

    let summary = app.run().await.unwrap();

    assert_eq!(summary.failed(), 1);
    assert!(gateway.submitted_orders().is_empty());
}

#[test]
fn test_shipped_config_parses() {
    let config =
        AppConfig::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml"))
            .unwrap();
    assert_eq!(config.markets[0].symbol, "BTCUSDT");
    assert_eq!(config.leverage_failure, LeverageFailurePolicy::Continue);
}
