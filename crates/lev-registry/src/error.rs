//! Registry error types.

use lev_gateway::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid rules for {symbol}: {reason}")]
    InvalidRules { symbol: String, reason: String },

    #[error("Rules fetch failed: {0}")]
    Fetch(#[from] GatewayError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
