//! FIFO queue of resting orders at a single price.

use rust_decimal::Decimal;
use std::collections::VecDeque;

use crate::engine::entry::Order;
use crate::error::ValidationError;

/// Result of filling against the front of a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    pub order_id: String,
    pub price: Decimal,
    pub quantity: Decimal,
}

/// Orders at one price in arrival order, with their aggregate remaining
/// quantity. Owns its orders; nothing outside the book holds a reference.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<Order>,
    total_quantity: Decimal,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `quantity` more can rest here without overflowing the
    /// aggregate.
    pub fn can_absorb(&self, quantity: Decimal) -> bool {
        self.total_quantity.checked_add(quantity).is_some()
    }

    /// Queues an order behind everything already at this level. The level is
    /// left untouched if the aggregate would overflow.
    pub fn push_back(&mut self, order: Order) -> Result<(), ValidationError> {
        self.total_quantity = self
            .total_quantity
            .checked_add(order.remaining_quantity())
            .ok_or(ValidationError::LevelOverflow(order.price()))?;
        self.orders.push_back(order);
        Ok(())
    }

    /// Fills up to `quantity` against the front order, popping it once it is
    /// exhausted. Returns `None` when the level is empty.
    pub fn fill_front(&mut self, quantity: Decimal) -> Option<Fill> {
        let front = self.orders.front_mut()?;
        let traded = front.fill(quantity);
        let fill = Fill {
            order_id: front.id().to_string(),
            price: front.price(),
            quantity: traded,
        };
        if front.is_filled() {
            self.orders.pop_front();
        }
        self.total_quantity -= traded;
        Some(fill)
    }

    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn total_quantity(&self) -> Decimal {
        self.total_quantity
    }
}
