use crate::engine::data::{BookSnapshot, OrderBook};
use crate::engine::entry::{Order, OrderSide, Trade};
use crate::error::ValidationError;
use rust_decimal::Decimal;

/// Crossing logic over a single instrument's book.
///
/// Callers serialize access (the engine keeps each matcher behind its own
/// mutex), so every method here sees a consistent book.
#[derive(Debug, Clone)]
pub struct Matcher {
    orderbook: OrderBook,
}

impl Matcher {
    pub fn new(symbol: String) -> Self {
        Self {
            orderbook: OrderBook::new(symbol),
        }
    }

    /// Crosses `order` against the opposite ladder, best price first and FIFO
    /// within a level, then rests whatever is left at its own limit price.
    ///
    /// An order whose full quantity could not rest at its level is rejected
    /// before anything trades, so a rejection never leaves a partial fill.
    pub fn place_order(&mut self, mut order: Order) -> Result<Vec<Trade>, ValidationError> {
        if !self.orderbook.can_rest(&order) {
            return Err(ValidationError::LevelOverflow(order.price()));
        }
        let mut trades = Vec::new();
        let contra = order.side().opposite();

        while !order.is_filled() {
            let Some((level_price, level)) = self.orderbook.best_level_mut(contra) else {
                break;
            };
            if !order.crosses(level_price) {
                break;
            }

            while !order.is_filled() {
                let Some(fill) = level.fill_front(order.remaining_quantity()) else {
                    break;
                };
                order.fill(fill.quantity);
                let (buy_order_id, sell_order_id) = match order.side() {
                    OrderSide::Buy => (order.id().to_string(), fill.order_id),
                    OrderSide::Sell => (fill.order_id, order.id().to_string()),
                };
                trades.push(Trade::new(
                    buy_order_id,
                    sell_order_id,
                    order.instrument().to_string(),
                    fill.price,
                    fill.quantity,
                ));
            }

            self.orderbook.prune_level(contra, level_price);
        }

        self.orderbook.add_order(order)?;
        Ok(trades)
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.orderbook.get_best_bid()
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.orderbook.get_best_ask()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        self.orderbook.snapshot()
    }

    pub fn orderbook(&self) -> &OrderBook {
        &self.orderbook
    }
}
