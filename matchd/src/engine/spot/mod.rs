//! Spot Market Module
//!
//! - `symbol_manager`: registry of per-instrument matchers

pub mod symbol_manager;

pub use symbol_manager::{MatcherHandle, SymbolManager};
