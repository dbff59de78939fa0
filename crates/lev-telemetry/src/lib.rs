//! Structured logging for the leveraged futures order client.
//!
//! - JSON output when `RUST_ENV=production`, pretty output otherwise
//! - `RUST_LOG` overrides the configured level

pub mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogFormat, DEFAULT_DIRECTIVES};
