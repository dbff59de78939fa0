//! Account and market snapshots returned by the exchange.

use crate::{Price, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Available balance of a single asset in the futures wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Asset code (e.g., "USDT").
    pub asset: String,
    /// Balance available for new margin.
    pub available: Decimal,
}

impl AccountBalance {
    pub fn new(asset: impl Into<String>, available: Decimal) -> Self {
        Self {
            asset: asset.into(),
            available,
        }
    }

    /// Select the balance for `asset` from a gateway listing.
    pub fn select<'a>(balances: &'a [AccountBalance], asset: &str) -> Option<&'a AccountBalance> {
        balances
            .iter()
            .find(|b| b.asset.eq_ignore_ascii_case(asset))
    }
}

/// Last price for a symbol, as of query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: Symbol,
    pub price: Price,
    pub as_of: DateTime<Utc>,
}
