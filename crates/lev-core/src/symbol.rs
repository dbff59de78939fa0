//! Symbol identifiers and per-symbol quantity rules.

use crate::error::{CoreError, Result};
use crate::Size;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Futures symbol (e.g., "BTCUSDT").
///
/// Always stored upper-case, the form the exchange expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_ascii_uppercase())
    }

    /// Parse and reject empty or non-alphanumeric symbols.
    pub fn parse(s: &str) -> Result<Self> {
        let sym = Self::new(s);
        if sym.0.is_empty() || !sym.0.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidSymbol(s.to_string()));
        }
        Ok(sym)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Quantity constraints the exchange enforces for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRules {
    /// Minimum order quantity.
    pub min_quantity: Size,
    /// Quantity increment orders must align to.
    pub step_size: Size,
}

impl SymbolRules {
    /// Fallback rules (0.001 / 0.001), the BTCUSDT perpetual values.
    pub const FALLBACK: Self = Self {
        min_quantity: Size(Decimal::from_parts(1, 0, 0, false, 3)),
        step_size: Size(Decimal::from_parts(1, 0, 0, false, 3)),
    };

    /// Create validated rules. Both values must be positive.
    pub fn new(min_quantity: Size, step_size: Size) -> Result<Self> {
        let rules = Self {
            min_quantity,
            step_size,
        };
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.step_size.is_positive() {
            return Err(CoreError::InvalidRules(format!(
                "step size must be positive, got {}",
                self.step_size
            )));
        }
        if !self.min_quantity.is_positive() {
            return Err(CoreError::InvalidRules(format!(
                "minimum quantity must be positive, got {}",
                self.min_quantity
            )));
        }
        Ok(())
    }
}

impl Default for SymbolRules {
    fn default() -> Self {
        Self::FALLBACK
    }
}
