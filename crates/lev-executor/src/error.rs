//! Executor error types.

use lev_risk::SizingError;
use thiserror::Error;

use crate::workflow::WorkflowState;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Invalid run plan: {0}")]
    InvalidPlan(String),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Failure category of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Exchange unreachable during the clock probe. Advisory only.
    Connectivity,
    Leverage,
    Balance,
    Price,
    Sizing,
    Order,
    Cancelled,
}

/// Fatal failure of a workflow run.
///
/// Gateway reasons are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Leverage not set: {0}")]
    LeverageRejected(String),

    #[error("No balance data: {0}")]
    NoBalanceData(String),

    #[error("Price unavailable: {0}")]
    PriceUnavailable(String),

    #[error("Sizing failed: {0}")]
    Sizing(#[from] SizingError),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Cancelled before {before:?}")]
    Cancelled { before: WorkflowState },
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LeverageRejected(_) => ErrorKind::Leverage,
            Self::NoBalanceData(_) => ErrorKind::Balance,
            Self::PriceUnavailable(_) => ErrorKind::Price,
            Self::Sizing(_) => ErrorKind::Sizing,
            Self::OrderRejected(_) => ErrorKind::Order,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            WorkflowError::NoBalanceData("x".into()).kind(),
            ErrorKind::Balance
        );
        assert_eq!(
            WorkflowError::from(SizingError::InvalidPrice(dec!(0))).kind(),
            ErrorKind::Sizing
        );
        assert_eq!(
            WorkflowError::Cancelled {
                before: WorkflowState::Submitted
            }
            .kind(),
            ErrorKind::Cancelled
        );
    }

    #[test]
    fn test_order_rejection_message_verbatim() {
        let err = WorkflowError::OrderRejected("Margin is insufficient.".into());
        assert_eq!(err.to_string(), "Order rejected: Margin is insufficient.");
    }
}
