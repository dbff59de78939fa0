//! Order-related types and identifiers.
//!
//! Provides order side, type, client order ID and the request/acknowledgement
//! pair exchanged with the gateway.

use crate::{Price, Size, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    #[default]
    Buy,
    Sell,
}

impl OrderSide {
    /// Exchange wire representation.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Limit order, requires a price.
    Limit,
    /// Market order.
    Market,
}

impl OrderType {
    /// Exchange wire representation.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Limit => "LIMIT",
            Self::Market => "MARKET",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "limit"),
            Self::Market => write!(f, "market"),
        }
    }
}

/// Client order ID sent with each submission.
///
/// Lets an operator match a log line to the exchange's order record even
/// when the response was lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    ///
    /// Format: `lev_{timestamp_ms}_{uuid_short}`
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().simple().to_string()[..8];
        Self(format!("lev_{ts}_{uuid_short}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order to be placed on the futures market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Size,
    /// Required for limit orders, ignored for market orders.
    pub price: Option<Price>,
    pub client_order_id: ClientOrderId,
}

impl OrderRequest {
    /// Build a market order for `quantity`.
    pub fn market(symbol: Symbol, side: OrderSide, quantity: Size) -> Self {
        Self {
            symbol,
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            client_order_id: ClientOrderId::new(),
        }
    }

    /// Build a limit order for `quantity` at `price`.
    pub fn limit(symbol: Symbol, side: OrderSide, quantity: Size, price: Price) -> Self {
        Self {
            symbol,
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
            client_order_id: ClientOrderId::new(),
        }
    }
}

/// Exchange acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: u64,
    pub client_order_id: Option<String>,
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_wire_names() {
        assert_eq!(OrderSide::Buy.as_wire(), "BUY");
        assert_eq!(OrderSide::Sell.as_wire(), "SELL");
        assert_eq!(OrderType::Market.as_wire(), "MARKET");
        assert_eq!(OrderType::Limit.as_wire(), "LIMIT");
    }

    #[test]
    fn test_client_order_id_unique() {
        let id1 = ClientOrderId::new();
        let id2 = ClientOrderId::new();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("lev_"));
    }

    #[test]
    fn test_market_order_has_no_price() {
        let order = OrderRequest::market(
            Symbol::new("BTCUSDT"),
            OrderSide::Buy,
            Size::new(dec!(0.010)),
        );
        assert_eq!(order.order_type, OrderType::Market);
        assert!(order.price.is_none());
    }

    #[test]
    fn test_limit_order_carries_price() {
        let order = OrderRequest::limit(
            Symbol::new("BTCUSDT"),
            OrderSide::Sell,
            Size::new(dec!(0.001)),
            Price::new(dec!(109580)),
        );
        assert_eq!(order.price, Some(Price::new(dec!(109580))));
    }
}
