//! REST adapter for Binance USD-M futures.
//!
//! Signed endpoints take their parameters in the query string, followed by
//! `timestamp`, `recvWindow` and an HMAC-SHA256 `signature` over everything
//! before it. The API key travels in the `X-MBX-APIKEY` header.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use lev_core::{
    AccountBalance, Credentials, OrderAck, OrderRequest, OrderType, Price, PriceQuote, Size,
    Symbol, SymbolRules,
};
use reqwest::{Client, Method, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{BoxFuture, ExchangeGateway};

/// Binance futures demo-trading REST endpoint.
pub const DEMO_BASE_URL: &str = "https://demo-fapi.binance.com";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default validity window for signed requests (ms).
const DEFAULT_RECV_WINDOW_MS: u64 = 5000;

const API_KEY_HEADER: &str = "X-MBX-APIKEY";

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
struct RawServerTime {
    #[serde(rename = "serverTime")]
    server_time: i64,
}

#[derive(Debug, Deserialize)]
struct RawBalance {
    asset: String,
    #[serde(rename = "availableBalance")]
    available_balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct RawTickerPrice {
    symbol: String,
    price: Decimal,
    /// Transaction time (ms). Absent on some environments.
    #[serde(default)]
    time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawLeverage {
    leverage: u32,
}

#[derive(Debug, Deserialize)]
struct RawOrderResponse {
    #[serde(rename = "orderId")]
    order_id: u64,
    #[serde(rename = "clientOrderId", default)]
    client_order_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawExchangeInfo {
    symbols: Vec<RawSymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct RawSymbolInfo {
    symbol: String,
    #[serde(default)]
    filters: Vec<RawFilter>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "filterType")]
enum RawFilter {
    #[serde(rename = "LOT_SIZE")]
    LotSize {
        #[serde(rename = "minQty")]
        min_qty: Decimal,
        #[serde(rename = "stepSize")]
        step_size: Decimal,
    },
    #[serde(other)]
    Other,
}

/// Signed REST client for Binance USD-M futures.
pub struct BinanceFuturesGateway {
    client: Client,
    base_url: String,
    credentials: Credentials,
    recv_window_ms: u64,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl BinanceFuturesGateway {
    /// Create a new gateway.
    ///
    /// # Arguments
    /// * `base_url` - REST root (e.g., [`DEMO_BASE_URL`])
    /// * `credentials` - API key pair used for signed endpoints
    /// * `timeout` - Per-request timeout; `None` uses 10s
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Option<Duration>,
    ) -> GatewayResult<Self> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
            timeout,
            clock: Arc::new(SystemClock),
        })
    }

    /// Override the signed-request validity window.
    #[must_use]
    pub fn with_recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    /// Override the clock used for request timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Append `timestamp`, `recvWindow` and `signature` to `params`.
    fn signed_query(&self, params: &[(&str, String)]) -> String {
        let mut query = encode_query(params);
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&format!(
            "recvWindow={}&timestamp={}",
            self.recv_window_ms,
            self.clock.now_ms()
        ));
        let signature = sign_query(self.credentials.api_secret(), &query);
        query.push_str("&signature=");
        query.push_str(&signature);
        query
    }

    async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> GatewayResult<T> {
        let mut url = format!("{}{}", self.base_url, path);
        let query = encode_query(params);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        decode_response(response).await
    }

    async fn signed_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> GatewayResult<T> {
        let url = format!("{}{}?{}", self.base_url, path, self.signed_query(params));
        debug!(%method, path, "signed request");

        let response = self
            .client
            .request(method, &url)
            .header(API_KEY_HEADER, self.credentials.api_key())
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        decode_response(response).await
    }

    fn map_transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else {
            GatewayError::Unreachable(e.to_string())
        }
    }
}

impl ExchangeGateway for BinanceFuturesGateway {
    fn server_time(&self) -> BoxFuture<'_, GatewayResult<DateTime<Utc>>> {
        Box::pin(async move {
            let raw: RawServerTime = self.public_get("/fapi/v1/time", &[]).await?;
            millis_to_utc(raw.server_time)
        })
    }

    fn account_balances(&self) -> BoxFuture<'_, GatewayResult<Vec<AccountBalance>>> {
        Box::pin(async move {
            let raw: Vec<RawBalance> = self
                .signed_request(Method::GET, "/fapi/v2/balance", &[])
                .await?;
            Ok(raw
                .into_iter()
                .map(|b| AccountBalance::new(b.asset, b.available_balance))
                .collect())
        })
    }

    fn price<'a>(&'a self, symbol: &'a Symbol) -> BoxFuture<'a, GatewayResult<PriceQuote>> {
        Box::pin(async move {
            let raw: RawTickerPrice = self
                .public_get(
                    "/fapi/v1/ticker/price",
                    &[("symbol", symbol.to_string())],
                )
                .await?;
            let as_of = match raw.time {
                Some(ms) => millis_to_utc(ms)?,
                None => Utc::now(),
            };
            Ok(PriceQuote {
                symbol: Symbol::new(raw.symbol),
                price: Price::new(raw.price),
                as_of,
            })
        })
    }

    fn set_leverage<'a>(
        &'a self,
        symbol: &'a Symbol,
        leverage: u32,
    ) -> BoxFuture<'a, GatewayResult<u32>> {
        Box::pin(async move {
            let raw: RawLeverage = self
                .signed_request(
                    Method::POST,
                    "/fapi/v1/leverage",
                    &[
                        ("symbol", symbol.to_string()),
                        ("leverage", leverage.to_string()),
                    ],
                )
                .await?;
            info!(%symbol, leverage = raw.leverage, "Leverage acknowledged by exchange");
            Ok(raw.leverage)
        })
    }

    fn place_order(&self, order: OrderRequest) -> BoxFuture<'_, GatewayResult<OrderAck>> {
        Box::pin(async move {
            let params = order_params(&order)?;
            let raw: RawOrderResponse = self
                .signed_request(Method::POST, "/fapi/v1/order", &params)
                .await?;
            Ok(OrderAck {
                order_id: raw.order_id,
                client_order_id: raw.client_order_id,
                status: raw.status,
            })
        })
    }

    fn symbol_rules<'a>(&'a self, symbol: &'a Symbol) -> BoxFuture<'a, GatewayResult<SymbolRules>> {
        Box::pin(async move {
            let raw: RawExchangeInfo = self.public_get("/fapi/v1/exchangeInfo", &[]).await?;
            rules_from_exchange_info(raw, symbol)
        })
    }
}

/// Hex-encoded HMAC-SHA256 of `query` keyed by `secret`.
fn sign_query(secret: &str, query: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Join parameters as `k=v&k=v`.
///
/// Values are symbols, integers, decimals and client ids, none of which
/// need percent-encoding.
fn encode_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn order_params(order: &OrderRequest) -> GatewayResult<Vec<(&'static str, String)>> {
    let mut params = vec![
        ("symbol", order.symbol.to_string()),
        ("side", order.side.as_wire().to_string()),
        ("type", order.order_type.as_wire().to_string()),
        ("quantity", order.quantity.inner().normalize().to_string()),
        ("newClientOrderId", order.client_order_id.to_string()),
    ];
    if order.order_type == OrderType::Limit {
        let price = order
            .price
            .ok_or_else(|| GatewayError::Decode("limit order without price".to_string()))?;
        params.push(("price", price.inner().normalize().to_string()));
        params.push(("timeInForce", "GTC".to_string()));
    }
    Ok(params)
}

fn rules_from_exchange_info(info: RawExchangeInfo, symbol: &Symbol) -> GatewayResult<SymbolRules> {
    let entry = info
        .symbols
        .into_iter()
        .find(|s| s.symbol == symbol.as_str())
        .ok_or_else(|| GatewayError::NotFound(format!("symbol {symbol} not in exchangeInfo")))?;

    entry
        .filters
        .into_iter()
        .find_map(|f| match f {
            RawFilter::LotSize { min_qty, step_size } => Some((min_qty, step_size)),
            RawFilter::Other => None,
        })
        .ok_or_else(|| GatewayError::NotFound(format!("LOT_SIZE filter missing for {symbol}")))
        .and_then(|(min_qty, step_size)| {
            SymbolRules::new(Size::new(min_qty), Size::new(step_size))
                .map_err(|e| GatewayError::Decode(e.to_string()))
        })
}

fn millis_to_utc(ms: i64) -> GatewayResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| GatewayError::Decode(format!("invalid timestamp {ms}")))
}

async fn decode_response<T: DeserializeOwned>(response: Response) -> GatewayResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| GatewayError::Unreachable(format!("Failed to read response body: {e}")))?;

    if !status.is_success() {
        return Err(error_from_body(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| GatewayError::Decode(format!("{e}: {body}")))
}

fn error_from_body(status: u16, body: &str) -> GatewayError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => GatewayError::Rejected {
            code: err.code,
            message: err.msg,
        },
        Err(_) => GatewayError::HttpClient(format!("HTTP {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lev_core::OrderSide;
    use rust_decimal_macros::dec;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn test_sign_query_reference_vector() {
        // Reference example from the exchange's API documentation.
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            sign_query(secret, query),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signed_query_layout() {
        let gateway = BinanceFuturesGateway::new(
            DEMO_BASE_URL,
            Credentials::new("key", "secret"),
            None,
        )
        .unwrap()
        .with_clock(Arc::new(FixedClock(1_700_000_000_000)));

        let query = gateway.signed_query(&[("symbol", "BTCUSDT".to_string())]);
        assert!(query.starts_with("symbol=BTCUSDT&recvWindow=5000&timestamp=1700000000000&signature="));

        let (unsigned, signature) = query.rsplit_once("&signature=").unwrap();
        assert_eq!(signature, sign_query("secret", unsigned));
    }

    #[test]
    fn test_market_order_params() {
        let order = OrderRequest::market(
            Symbol::new("BTCUSDT"),
            OrderSide::Buy,
            Size::new(dec!(0.010)),
        );
        let params = order_params(&order).unwrap();
        assert!(params.contains(&("side", "BUY".to_string())));
        assert!(params.contains(&("type", "MARKET".to_string())));
        assert!(params.contains(&("quantity", "0.01".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "price"));
    }

    #[test]
    fn test_limit_order_params_include_price_and_tif() {
        let order = OrderRequest::limit(
            Symbol::new("BTCUSDT"),
            OrderSide::Buy,
            Size::new(dec!(0.001)),
            Price::new(dec!(109580.00)),
        );
        let params = order_params(&order).unwrap();
        assert!(params.contains(&("price", "109580".to_string())));
        assert!(params.contains(&("timeInForce", "GTC".to_string())));
    }

    #[test]
    fn test_rules_from_exchange_info() {
        let body = r#"{
            "symbols": [
                {"symbol": "ETHUSDT", "filters": [
                    {"filterType": "LOT_SIZE", "minQty": "0.001", "stepSize": "0.001", "maxQty": "10000"}
                ]},
                {"symbol": "BTCUSDT", "filters": [
                    {"filterType": "PRICE_FILTER", "tickSize": "0.10"},
                    {"filterType": "LOT_SIZE", "minQty": "0.001", "stepSize": "0.001", "maxQty": "1000"},
                    {"filterType": "MARKET_LOT_SIZE", "minQty": "0.001", "stepSize": "0.001"}
                ]}
            ]
        }"#;
        let info: RawExchangeInfo = serde_json::from_str(body).unwrap();
        let rules = rules_from_exchange_info(info, &Symbol::new("BTCUSDT")).unwrap();
        assert_eq!(rules.min_quantity.inner(), dec!(0.001));
        assert_eq!(rules.step_size.inner(), dec!(0.001));
    }

    #[test]
    fn test_rules_missing_symbol() {
        let info: RawExchangeInfo = serde_json::from_str(r#"{"symbols": []}"#).unwrap();
        let err = rules_from_exchange_info(info, &Symbol::new("BTCUSDT")).unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[test]
    fn test_error_body_becomes_rejected() {
        let err = error_from_body(400, r#"{"code":-2019,"msg":"Margin is insufficient."}"#);
        assert_eq!(
            err,
            GatewayError::Rejected {
                code: -2019,
                message: "Margin is insufficient.".to_string()
            }
        );
    }

    #[test]
    fn test_non_json_error_body() {
        let err = error_from_body(502, "Bad Gateway");
        assert!(matches!(err, GatewayError::HttpClient(msg) if msg.contains("502")));
    }

    #[test]
    fn test_balance_parses_string_decimals() {
        let body = r#"[{"accountAlias":"x","asset":"USDT","balance":"1200.5","availableBalance":"1000.25"}]"#;
        let raw: Vec<RawBalance> = serde_json::from_str(body).unwrap();
        assert_eq!(raw[0].asset, "USDT");
        assert_eq!(raw[0].available_balance, dec!(1000.25));
    }
}
