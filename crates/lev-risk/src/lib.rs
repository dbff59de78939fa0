//! Risk-allocation position sizing.
//!
//! Turns an available balance, an allocation fraction and a leverage
//! multiplier into an exchange-compliant order quantity:
//! - margin = available * allocation
//! - notional = margin * leverage
//! - quantity = floor(notional / price / step) * step, clamped up to the minimum
//!
//! Pure computation only. No I/O, no hidden state.

pub mod error;
pub mod sizer;

pub use error::{RiskResult, SizingError};
pub use sizer::{size, SizingRequest, SizingResult};
