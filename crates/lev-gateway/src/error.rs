//! Gateway error types.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Exchange unreachable: {0}")]
    Unreachable(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Exchange rejected request ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl GatewayError {
    /// Human-readable reason, with exchange messages passed through verbatim.
    pub fn reason(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
