//! Position sizer.
//!
//! # Algorithm
//!
//! 1. `available <= 0`          → `InsufficientBalance`
//! 2. `price <= 0`              → `InvalidPrice`
//! 3. fraction/leverage/rules   → `InvalidAllocation` / `InvalidLeverage` / `InvalidRules`
//! 4. `margin   = available * allocation`
//! 5. `notional = margin * leverage`
//! 6. `raw      = notional / price`
//! 7. `quantity = floor(raw / step) * step`
//! 8. `quantity < min_quantity` → `quantity = ceil(min_quantity / step) * step`,
//!    `clamped = true`
//!
//! Step 7 truncates so the order never exceeds the computed margin. Step 8 can
//! push exposure above the requested allocation, so the caller is told. The
//! submitted quantity is always a step multiple at or above the minimum.
//!
//! Every multiplication and division is checked; a result outside the
//! `Decimal` range is `Overflow`, never a panic.

use lev_core::{Price, Size, SymbolRules};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{RiskResult, SizingError};

/// Inputs to a sizing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingRequest {
    /// Available margin balance in the quote asset.
    pub available: Decimal,
    /// Fraction of `available` committed as margin, in (0, 1].
    pub allocation: Decimal,
    /// Leverage multiplier.
    pub leverage: u32,
    /// Current price of the symbol.
    pub price: Price,
    /// Quantity rules of the symbol.
    pub rules: SymbolRules,
}

/// Output of a sizing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingResult {
    /// Margin committed (quote asset).
    pub margin: Decimal,
    /// Requested notional exposure (quote asset).
    pub notional: Decimal,
    /// Quantity before step truncation.
    pub raw_quantity: Decimal,
    /// Quantity to submit.
    pub quantity: Size,
    /// Whether `quantity` was raised to the symbol minimum.
    pub clamped: bool,
    /// Exposure of `quantity` at the sizing price.
    pub effective_notional: Decimal,
}

impl SizingResult {
    /// Leverage actually carried by the submitted quantity against `margin`.
    ///
    /// Exceeds the requested leverage when `clamped` is set. `None` when the
    /// ratio is not representable.
    pub fn effective_leverage(&self) -> Option<Decimal> {
        self.effective_notional.checked_div(self.margin)
    }
}

/// Size an order from balance, allocation, leverage and price.
pub fn size(request: &SizingRequest) -> RiskResult<SizingResult> {
    if request.available <= Decimal::ZERO {
        return Err(SizingError::InsufficientBalance {
            available: request.available,
        });
    }
    if !request.price.is_positive() {
        return Err(SizingError::InvalidPrice(request.price.inner()));
    }
    if request.allocation <= Decimal::ZERO || request.allocation > Decimal::ONE {
        return Err(SizingError::InvalidAllocation(request.allocation));
    }
    if request.leverage == 0 {
        return Err(SizingError::InvalidLeverage(request.leverage));
    }
    request
        .rules
        .validate()
        .map_err(|e| SizingError::InvalidRules(e.to_string()))?;

    let step = request.rules.step_size;
    let margin = request
        .available
        .checked_mul(request.allocation)
        .ok_or(SizingError::Overflow("margin"))?;
    let notional = margin
        .checked_mul(Decimal::from(request.leverage))
        .ok_or(SizingError::Overflow("notional"))?;
    let raw_quantity = notional
        .checked_div(request.price.inner())
        .ok_or(SizingError::Overflow("raw quantity"))?;

    let mut quantity = Size::new(raw_quantity)
        .checked_round_down_to_step(step)
        .ok_or(SizingError::Overflow("step-aligned quantity"))?;
    let clamped = quantity < request.rules.min_quantity;
    if clamped {
        quantity = request
            .rules
            .min_quantity
            .checked_round_up_to_step(step)
            .ok_or(SizingError::Overflow("minimum quantity"))?;
    }

    let effective_notional = quantity
        .checked_notional(request.price)
        .ok_or(SizingError::Overflow("effective notional"))?;

    Ok(SizingResult {
        margin,
        notional,
        raw_quantity,
        quantity,
        clamped,
        effective_notional,
    })
}
