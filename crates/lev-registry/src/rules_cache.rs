//! Symbol rules cache.
//!
//! Caches quantity rules keyed by symbol. Configured entries always win over
//! fetched ones, and a fetched entry is never refreshed within a process.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lev_core::{Symbol, SymbolRules};
use lev_gateway::ExchangeGateway;
use tracing::{debug, info, warn};

use crate::error::{RegistryError, RegistryResult};

/// Where a cached entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesSource {
    /// Set from configuration.
    Configured,
    /// Fetched from exchange metadata.
    Exchange,
    /// Neither available; the registry fallback was used.
    Fallback,
}

/// Rules cache entry.
#[derive(Debug, Clone)]
struct RulesEntry {
    rules: SymbolRules,
    source: RulesSource,
    last_update: DateTime<Utc>,
}

/// Symbol rules registry.
pub struct SymbolRulesRegistry {
    /// Cached rules by symbol.
    entries: DashMap<Symbol, RulesEntry>,
    /// Rules for symbols with no entry.
    fallback: SymbolRules,
}

impl Default for SymbolRulesRegistry {
    fn default() -> Self {
        Self::new(SymbolRules::FALLBACK)
    }
}

impl SymbolRulesRegistry {
    pub fn new(fallback: SymbolRules) -> Self {
        Self {
            entries: DashMap::new(),
            fallback,
        }
    }

    /// Register configured rules for `symbol`.
    pub fn insert_configured(&self, symbol: Symbol, rules: SymbolRules) -> RegistryResult<()> {
        rules.validate().map_err(|e| RegistryError::InvalidRules {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;
        info!(%symbol, min_qty = %rules.min_quantity, step = %rules.step_size, "Configured symbol rules");
        self.entries.insert(
            symbol,
            RulesEntry {
                rules,
                source: RulesSource::Configured,
                last_update: Utc::now(),
            },
        );
        Ok(())
    }

    /// Get cached rules for `symbol`.
    pub fn get(&self, symbol: &Symbol) -> Option<(SymbolRules, RulesSource)> {
        self.entries
            .get(symbol)
            .map(|entry| (entry.rules, entry.source))
    }

    /// When the cached entry for `symbol` was stored.
    pub fn last_update(&self, symbol: &Symbol) -> Option<DateTime<Utc>> {
        self.entries.get(symbol).map(|entry| entry.last_update)
    }

    /// Cached rules, or the fallback.
    pub fn resolve(&self, symbol: &Symbol) -> (SymbolRules, RulesSource) {
        match self.get(symbol) {
            Some(found) => found,
            None => {
                warn!(%symbol, min_qty = %self.fallback.min_quantity, step = %self.fallback.step_size, "No rules for symbol, using fallback");
                (self.fallback, RulesSource::Fallback)
            }
        }
    }

    /// Fetch rules for `symbol` from the exchange unless already cached.
    pub async fn fetch(
        &self,
        gateway: &dyn ExchangeGateway,
        symbol: &Symbol,
    ) -> RegistryResult<(SymbolRules, RulesSource)> {
        if let Some(found) = self.get(symbol) {
            debug!(%symbol, source = ?found.1, "Symbol rules cache hit");
            return Ok(found);
        }

        let rules = gateway.symbol_rules(symbol).await?;
        info!(%symbol, min_qty = %rules.min_quantity, step = %rules.step_size, "Fetched symbol rules from exchange");

        // A configured entry inserted concurrently still wins.
        let entry = self
            .entries
            .entry(symbol.clone())
            .or_insert(RulesEntry {
                rules,
                source: RulesSource::Exchange,
                last_update: Utc::now(),
            });
        Ok((entry.rules, entry.source))
    }

    /// Cached rules, else fetched rules when `fetch_enabled`, else fallback.
    ///
    /// A failed fetch is logged and falls back; it never aborts the caller.
    pub async fn resolve_or_fetch(
        &self,
        gateway: &dyn ExchangeGateway,
        symbol: &Symbol,
        fetch_enabled: bool,
    ) -> (SymbolRules, RulesSource) {
        if !fetch_enabled {
            return self.resolve(symbol);
        }
        match self.fetch(gateway, symbol).await {
            Ok(found) => found,
            Err(e) => {
                warn!(%symbol, error = %e, "Symbol rules fetch failed");
                self.resolve(symbol)
            }
        }
    }

    /// Number of cached symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
