//! Risk-sized leveraged futures order client.
//!
//! Wires configuration, the Binance gateway and the order workflow:
//! - Clock-sync probe against the exchange (advisory)
//! - One sizing-and-submit workflow per configured market
//! - Ctrl-C cancels pending workflows between steps

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, RunSummary};
pub use config::{AppConfig, ConfigSource, MarketConfig};
pub use error::{AppError, AppResult};
