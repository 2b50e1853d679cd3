//! Match Engine Module
//!
//! Entry point of the matching core. Routes orders to their instrument's
//! matcher, publishes the resulting trades and answers protocol commands.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::engine::data::BookSnapshot;
use crate::engine::entry::{Order, Trade};
use crate::engine::sink::{LogSink, TradeSink};
use crate::engine::spot::SymbolManager;
use crate::error::EngineError;
use crate::metrics;
use crate::protocol::{self, Command, Reply};

/// The matching engine. `Send + Sync`; share it behind an `Arc` between
/// connection handlers.
pub struct MatchEngine {
    symbol_manager: SymbolManager,
    sink: Arc<dyn TradeSink>,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(Arc::new(LogSink))
    }
}

impl MatchEngine {
    pub fn new(sink: Arc<dyn TradeSink>) -> MatchEngine {
        MatchEngine {
            symbol_manager: SymbolManager::new(),
            sink,
        }
    }

    /// Crosses an admitted order against its instrument's book.
    ///
    /// `Order` can only be built through its validating constructor, so the
    /// remaining check here is that the book can hold the order's remainder.
    /// Trades are published to the sink before the book is unlocked, so
    /// notifications for one instrument follow admission order.
    pub fn process_order(&self, order: Order) -> Result<Vec<Trade>, EngineError> {
        let handle = self.symbol_manager.get_or_create(order.instrument())?;
        let mut matcher = handle.lock()?;

        log::debug!(
            "admit {} {} {} {}@{}",
            order.id(),
            order.instrument(),
            order.side(),
            order.remaining_quantity(),
            order.price()
        );
        let trades = matcher.place_order(order)?;
        for trade in &trades {
            self.sink.publish(&trade.notification());
        }
        metrics::TRADE_COUNTER.inc_by(trades.len() as u64);
        Ok(trades)
    }

    /// Handles one request and returns its reply line. Only internal errors
    /// escape; everything else is answered in-band.
    pub fn process_command(&self, raw: &str) -> Result<String, EngineError> {
        metrics::record_metrics(protocol::method_label(raw), || -> Result<String, EngineError> {
            let reply = match protocol::parse_command(raw) {
                Ok(Command::Ping) => Reply::Pong,
                Ok(Command::NewOrder(order)) => match self.process_order(order) {
                    Ok(_) => Reply::OrderAccepted,
                    Err(err) => Reply::from_error(err)?,
                },
                Err(err) => {
                    log::debug!("rejected request {:?}: {}", raw, err);
                    Reply::from_error(err)?
                }
            };
            Ok(reply.to_string())
        })
    }

    pub fn best_bid(&self, instrument: &str) -> Result<Option<Decimal>, EngineError> {
        let Some(handle) = self.symbol_manager.get_matcher(instrument)? else {
            return Ok(None);
        };
        let price = handle.lock()?.best_bid();
        Ok(price)
    }

    pub fn best_ask(&self, instrument: &str) -> Result<Option<Decimal>, EngineError> {
        let Some(handle) = self.symbol_manager.get_matcher(instrument)? else {
            return Ok(None);
        };
        let price = handle.lock()?.best_ask();
        Ok(price)
    }

    /// Snapshot of an instrument's book, or `None` if the instrument has never
    /// been referenced.
    pub fn snapshot(&self, instrument: &str) -> Result<Option<BookSnapshot>, EngineError> {
        let Some(handle) = self.symbol_manager.get_matcher(instrument)? else {
            return Ok(None);
        };
        let snapshot = handle.lock()?.snapshot();
        Ok(Some(snapshot))
    }

    pub fn symbols(&self) -> Result<Vec<String>, EngineError> {
        self.symbol_manager.list_symbols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::data::LevelSnapshot;
    use crate::engine::entry::OrderSide;
    use crate::engine::sink::MemorySink;
    use crate::error::ValidationError;
    use rust_decimal_macros::dec;
    use std::thread;

    fn engine() -> (MatchEngine, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (MatchEngine::new(sink.clone()), sink)
    }

    #[test]
    fn ping_pong() {
        let (engine, _) = engine();
        assert_eq!(engine.process_command("PING").unwrap(), "PONG");
    }

    #[test]
    fn unknown_command_does_not_touch_state() {
        let (engine, _) = engine();
        assert_eq!(engine.process_command("HELLO").unwrap(), "UNKNOWN_COMMAND");
        assert_eq!(engine.process_command("").unwrap(), "UNKNOWN_COMMAND");
        assert!(engine.symbols().unwrap().is_empty());
    }

    #[test]
    fn accepted_orders_publish_trades() {
        let (engine, sink) = engine();
        assert_eq!(
            engine.process_command("NEW_ORDER B1 BTC BUY 100 10").unwrap(),
            "ORDER_ACCEPTED"
        );
        assert!(sink.notifications().is_empty());
        assert_eq!(engine.best_bid("BTC").unwrap(), Some(dec!(100)));

        assert_eq!(
            engine.process_command("NEW_ORDER S1 BTC SELL 99 10").unwrap(),
            "ORDER_ACCEPTED"
        );
        let notifications = sink.notifications();
        assert_eq!(notifications.len(), 1);
        let fields: Vec<&str> = notifications[0].split('|').collect();
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[0], "TRADE");
        assert_eq!(&fields[2..7], &["B1", "S1", "BTC", "100", "10"]);
        assert!(fields[7].parse::<u64>().is_ok());

        assert!(engine.snapshot("BTC").unwrap().unwrap().is_empty());
    }

    #[test]
    fn malformed_order_leaves_book_unchanged() {
        let (engine, sink) = engine();
        engine.process_command("NEW_ORDER S1 BTC SELL 50 5").unwrap();
        let before = engine.snapshot("BTC").unwrap();

        let reply = engine.process_command("NEW_ORDER B1 BTC BUY abc 5").unwrap();
        assert_eq!(reply, "ORDER_REJECTED invalid price abc");
        assert_eq!(engine.snapshot("BTC").unwrap(), before);
        assert!(sink.notifications().is_empty());

        let reply = engine.process_command("NEW_ORDER B2 ETH BUY 10 -1").unwrap();
        assert_eq!(reply, "ORDER_REJECTED quantity must be positive");
        assert_eq!(engine.snapshot("ETH").unwrap(), None);
    }

    #[test]
    fn instruments_are_independent() {
        let (engine, sink) = engine();
        engine.process_command("NEW_ORDER B1 BTC BUY 100 1").unwrap();
        engine.process_command("NEW_ORDER S1 ETH SELL 90 1").unwrap();
        assert!(sink.notifications().is_empty());
        assert_eq!(engine.best_bid("BTC").unwrap(), Some(dec!(100)));
        assert_eq!(engine.best_ask("ETH").unwrap(), Some(dec!(90)));
        assert_eq!(engine.best_ask("BTC").unwrap(), None);
        assert_eq!(engine.best_bid("DOGE").unwrap(), None);
        assert_eq!(
            engine.symbols().unwrap(),
            vec!["BTC".to_string(), "ETH".to_string()]
        );
    }

    #[test]
    fn concurrent_admission_conserves_quantity() {
        let (engine, sink) = engine();
        let engine = Arc::new(engine);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let engine = engine.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let side = if (t + i) % 2 == 0 { "BUY" } else { "SELL" };
                        let cmd = format!("NEW_ORDER O{}-{} BTC {} 100 1", t, i, side);
                        assert_eq!(engine.process_command(&cmd).unwrap(), "ORDER_ACCEPTED");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // 100 buys and 100 sells of one unit at one price cross completely.
        assert_eq!(sink.notifications().len(), 100);
        let snapshot = engine.snapshot("BTC").unwrap().unwrap();
        assert!(snapshot.is_empty(), "{:?}", snapshot);
    }

    #[test]
    fn snapshot_reports_levels() {
        let (engine, _) = engine();
        engine.process_command("NEW_ORDER|S1|BTC|SELL|50|5").unwrap();
        engine.process_command("NEW_ORDER|S2|BTC|SELL|51|5").unwrap();
        engine.process_command("NEW_ORDER|B1|BTC|BUY|51|8").unwrap();
        let snapshot = engine.snapshot("BTC").unwrap().unwrap();
        assert_eq!(
            snapshot.asks,
            vec![LevelSnapshot { price: dec!(51), quantity: dec!(2), orders: 1 }]
        );
    }

    #[test]
    fn oversized_values_are_rejected_and_the_book_stays_live() {
        let (engine, sink) = engine();
        let reply = engine
            .process_command("NEW_ORDER B1 BTC BUY 1 50000000000000000000000000000")
            .unwrap();
        assert_eq!(reply, "ORDER_REJECTED quantity exceeds 1000000000000000");
        assert_eq!(engine.snapshot("BTC").unwrap(), None);

        let max = "NEW_ORDER {} BTC BUY 1 1000000000000000";
        for id in ["B2", "B3"] {
            let reply = engine.process_command(&max.replace("{}", id)).unwrap();
            assert_eq!(reply, "ORDER_ACCEPTED");
        }
        let snapshot = engine.snapshot("BTC").unwrap().unwrap();
        assert_eq!(
            snapshot.bids,
            vec![LevelSnapshot { price: dec!(1), quantity: dec!(2000000000000000), orders: 2 }]
        );

        let reply = engine.process_command("NEW_ORDER S1 BTC SELL 1 5").unwrap();
        assert_eq!(reply, "ORDER_ACCEPTED");
        assert_eq!(sink.notifications().len(), 1);
    }

    #[test]
    fn admitted_orders_keep_their_validated_fields() {
        let (engine, _) = engine();
        assert_eq!(
            Order::try_new("B1", "BTC", OrderSide::Buy, dec!(-5), dec!(1)),
            Err(ValidationError::NonPositivePrice)
        );

        let order = Order::try_new("B1", "BTC", OrderSide::Buy, dec!(1), dec!(1))
            .unwrap()
            .with_client_order_id("client-1");
        assert_eq!(order.price(), dec!(1));
        assert!(engine.process_order(order).unwrap().is_empty());
        assert_eq!(engine.best_bid("BTC").unwrap(), Some(dec!(1)));
    }
}
