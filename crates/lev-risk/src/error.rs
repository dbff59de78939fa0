//! Sizing error types.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizingError {
    #[error("Insufficient balance: {available}")]
    InsufficientBalance { available: Decimal },

    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),

    #[error("Allocation fraction must be in (0, 1], got {0}")]
    InvalidAllocation(Decimal),

    #[error("Leverage must be at least 1, got {0}")]
    InvalidLeverage(u32),

    #[error("Invalid symbol rules: {0}")]
    InvalidRules(String),

    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

pub type RiskResult<T> = Result<T, SizingError>;
