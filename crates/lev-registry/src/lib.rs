//! Symbol rules registry.
//!
//! Holds minimum order quantity and step size per symbol. Entries come from
//! configuration or from exchange metadata; symbols with neither resolve to
//! a fallback.

pub mod error;
pub mod rules_cache;

pub use error::{RegistryError, RegistryResult};
pub use rules_cache::{RulesSource, SymbolRulesRegistry};
