//! Core domain types for the leveraged futures order client.
//!
//! This crate provides fundamental types used throughout the workspace:
//! - `Price`, `Size`: Precision-safe numeric types
//! - `AccountBalance`, `PriceQuote`: Snapshots returned by the exchange
//! - `SymbolRules`: Quantity step and minimum for a symbol
//! - `OrderSide`, `OrderType`, `OrderRequest`: Order submission types
//! - `Credentials`: API key pair passed explicitly into the gateway

pub mod account;
pub mod credentials;
pub mod decimal;
pub mod error;
pub mod order;
pub mod symbol;

pub use account::{AccountBalance, PriceQuote};
pub use credentials::Credentials;
pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use order::{ClientOrderId, OrderAck, OrderRequest, OrderSide, OrderType};
pub use symbol::{Symbol, SymbolRules};
