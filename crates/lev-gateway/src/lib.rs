//! Exchange gateway for the leveraged futures order client.
//!
//! The rest of the workspace only sees the [`ExchangeGateway`] contract:
//! typed requests, typed responses and a [`GatewayError`] carrying a
//! human-readable reason. Transport detail stays in this crate.
//!
//! # Key Components
//!
//! - [`ExchangeGateway`]: dyn-compatible async trait consumed by the executor
//! - [`BinanceFuturesGateway`]: signed REST adapter for Binance USD-M futures
//! - [`MockGateway`]: scripted gateway for tests
//! - [`Clock`]: local time source used for clock-offset checks

pub mod binance;
pub mod clock;
pub mod error;
pub mod gateway;
pub mod mock;

pub use binance::{BinanceFuturesGateway, DEMO_BASE_URL};
pub use clock::{Clock, SystemClock};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{BoxFuture, DynGateway, ExchangeGateway};
pub use mock::{GatewayCall, MockGateway};
