//! Symbol Management Module
//!
//! Registry of per-instrument matchers. A matcher is created the first time an
//! instrument is referenced and lives for the rest of the process.

use crate::engine::matchlogic::Matcher;
use crate::error::EngineError;
use crate::metrics;
use fxhash::FxHashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Shared handle to one instrument's matcher.
pub type MatcherHandle = Arc<Mutex<Matcher>>;

/// Maps instrument symbols to their matchers.
///
/// The map lock only covers lookup and creation. Callers lock the returned
/// handle after this lock has been released, so instruments match in
/// parallel and the two locks are never nested.
#[derive(Debug, Default)]
pub struct SymbolManager {
    matchers: RwLock<FxHashMap<String, MatcherHandle>>,
}

impl SymbolManager {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the matcher for `symbol`, creating it atomically if this is the
    /// first reference.
    ///
    /// # Arguments
    /// * `symbol` - Instrument the matcher trades
    ///
    /// # Returns
    /// * `Ok(handle)` - The instrument's matcher, shared with every other caller
    /// * `Err(EngineError::Internal)` - If the registry lock is poisoned
    pub fn get_or_create(&self, symbol: &str) -> Result<MatcherHandle, EngineError> {
        if let Some(matcher) = self.matchers.read()?.get(symbol) {
            return Ok(matcher.clone());
        }

        let mut matchers = self.matchers.write()?;
        let matcher = matchers.entry(symbol.to_string()).or_insert_with(|| {
            log::info!("creating order book for {}", symbol);
            metrics::ORDER_BOOK_COUNTER.inc();
            Arc::new(Mutex::new(Matcher::new(symbol.to_string())))
        });
        Ok(matcher.clone())
    }

    /// Looks up an existing matcher without creating one
    ///
    /// # Arguments
    /// * `symbol` - Instrument to look up
    ///
    /// # Returns
    /// * `Ok(Some(handle))` - If the instrument has been referenced before
    /// * `Ok(None)` - If it has not
    /// * `Err(EngineError::Internal)` - If the registry lock is poisoned
    pub fn get_matcher(&self, symbol: &str) -> Result<Option<MatcherHandle>, EngineError> {
        Ok(self.matchers.read()?.get(symbol).cloned())
    }

    /// Lists every instrument with a book
    ///
    /// # Returns
    /// Instrument symbols in ascending order
    pub fn list_symbols(&self) -> Result<Vec<String>, EngineError> {
        let mut symbols: Vec<String> = self.matchers.read()?.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn creates_on_first_reference_only() {
        let manager = SymbolManager::new();
        assert!(manager.get_matcher("BTC").unwrap().is_none());

        let first = manager.get_or_create("BTC").unwrap();
        let second = manager.get_or_create("BTC").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(manager.get_matcher("BTC").unwrap().is_some());
        assert_eq!(manager.list_symbols().unwrap(), vec!["BTC".to_string()]);
    }

    #[test]
    fn concurrent_first_references_share_one_matcher() {
        let manager = Arc::new(SymbolManager::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                thread::spawn(move || manager.get_or_create("ETH").unwrap())
            })
            .collect();
        let matchers: Vec<MatcherHandle> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(matchers.iter().all(|m| Arc::ptr_eq(m, &matchers[0])));
        assert_eq!(manager.list_symbols().unwrap().len(), 1);
    }
}
